//! Classification reporting.
//!
//! [`ClassificationReport`] consumes `(y_true, y_pred)` for one estimator
//! run and produces a [`RunReport`]: accuracy, macro/weighted F1, confusion
//! matrix and a per-class text table, each gated by a flag. The reporter is
//! stateless; aggregating across runs is a downstream concern.

use ndarray::ArrayView1;
use serde::Serialize;
use std::fmt::Write as _;

use crate::error::ExecutionError;

/// Confusion matrix over the sorted union of true and predicted labels.
/// `counts[i][j]` is the number of samples with true label `labels[i]`
/// predicted as `labels[j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<u32>,
    pub counts: Vec<Vec<usize>>,
}

/// Metrics for one fit/predict run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Fraction of exactly-correct predictions.
    pub accuracy: Option<f64>,
    /// Unweighted mean of per-class F1 scores.
    pub f1_macro: Option<f64>,
    /// Support-weighted mean of per-class F1 scores.
    pub f1_weighted: Option<f64>,
    pub confusion_matrix: Option<ConfusionMatrix>,
    /// Per-class precision/recall/F1/support table.
    pub classification_report: Option<String>,
}

/// Reporter configuration: which metrics to compute per run.
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    pub use_accuracy: bool,
    pub use_f1_score: bool,
    pub use_classification_report: bool,
    pub use_confusion_matrix: bool,
}

impl Default for ClassificationReport {
    fn default() -> Self {
        Self {
            use_accuracy: true,
            use_f1_score: true,
            use_classification_report: true,
            use_confusion_matrix: true,
        }
    }
}

struct ClassMetrics {
    label: u32,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}

impl ClassificationReport {
    /// Reporter with every metric enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one run's predictions against ground truth.
    ///
    /// # Errors
    /// - [`ExecutionError::LabelMismatch`] when lengths disagree.
    /// - [`ExecutionError::EmptyData`] on empty inputs.
    pub fn evaluate(
        &self,
        y_true: ArrayView1<'_, u32>,
        y_pred: ArrayView1<'_, u32>,
    ) -> Result<RunReport, ExecutionError> {
        if y_true.len() != y_pred.len() {
            return Err(ExecutionError::LabelMismatch {
                rows: y_true.len(),
                labels: y_pred.len(),
            });
        }
        if y_true.is_empty() {
            return Err(ExecutionError::EmptyData(
                "cannot evaluate an empty prediction set".to_string(),
            ));
        }

        let confusion = confusion_matrix(y_true, y_pred);
        let per_class = class_metrics(&confusion);
        let total = y_true.len();

        let accuracy = self.use_accuracy.then(|| {
            let correct = y_true
                .iter()
                .zip(y_pred.iter())
                .filter(|(t, p)| t == p)
                .count();
            correct as f64 / total as f64
        });

        let (f1_macro, f1_weighted) = if self.use_f1_score {
            let macro_avg =
                per_class.iter().map(|c| c.f1).sum::<f64>() / per_class.len() as f64;
            let weighted = per_class
                .iter()
                .map(|c| c.f1 * c.support as f64)
                .sum::<f64>()
                / total as f64;
            (Some(macro_avg), Some(weighted))
        } else {
            (None, None)
        };

        let classification_report = self
            .use_classification_report
            .then(|| render_report(&per_class, total));

        let confusion_matrix = self.use_confusion_matrix.then_some(confusion);

        Ok(RunReport {
            accuracy,
            f1_macro,
            f1_weighted,
            confusion_matrix,
            classification_report,
        })
    }
}

fn confusion_matrix(y_true: ArrayView1<'_, u32>, y_pred: ArrayView1<'_, u32>) -> ConfusionMatrix {
    let mut labels: Vec<u32> = y_true.iter().chain(y_pred.iter()).copied().collect();
    labels.sort_unstable();
    labels.dedup();

    let index = |label: u32| labels.binary_search(&label).unwrap_or(0);
    let mut counts = vec![vec![0usize; labels.len()]; labels.len()];
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        counts[index(t)][index(p)] += 1;
    }
    ConfusionMatrix { labels, counts }
}

fn class_metrics(confusion: &ConfusionMatrix) -> Vec<ClassMetrics> {
    let n = confusion.labels.len();
    (0..n)
        .map(|i| {
            let tp = confusion.counts[i][i];
            let support: usize = confusion.counts[i].iter().sum();
            let predicted: usize = (0..n).map(|r| confusion.counts[r][i]).sum();
            let precision = if predicted == 0 {
                0.0
            } else {
                tp as f64 / predicted as f64
            };
            let recall = if support == 0 {
                0.0
            } else {
                tp as f64 / support as f64
            };
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            ClassMetrics {
                label: confusion.labels[i],
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect()
}

fn render_report(per_class: &[ClassMetrics], total: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>10}  {:>9}  {:>9}  {:>9}  {:>9}", "class", "precision", "recall", "f1-score", "support");
    for c in per_class {
        let _ = writeln!(
            out,
            "{:>10}  {:>9.3}  {:>9.3}  {:>9.3}  {:>9}",
            c.label, c.precision, c.recall, c.f1, c.support
        );
    }
    let _ = writeln!(out, "{:>10}  {:>42}", "total", total);
    out
}
