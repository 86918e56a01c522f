//! Built-in estimators.
//!
//! - [`KnnEstimator`] — k-nearest-neighbors by euclidean distance with
//!   majority vote (ties broken toward the smallest class code).
//! - [`MajorityClassEstimator`] — predicts the most frequent training class;
//!   a floor baseline for classification reports.

use ndarray::{Array1, ArrayView1, ArrayView2};
use std::collections::BTreeMap;

use crate::components::registry::{kwarg_usize, Kwargs};
use crate::components::Estimator;
use crate::error::ExecutionError;

/// K-nearest-neighbors classifier. `fit` stores the training set; `predict`
/// votes over the `n_neighbors` closest training rows.
#[derive(Debug, Clone)]
pub struct KnnEstimator {
    n_neighbors: usize,
    train: Option<(ndarray::Array2<f64>, Array1<u32>)>,
}

impl KnnEstimator {
    /// Classifier with the given neighbor count.
    pub fn new(n_neighbors: usize) -> Result<Self, ExecutionError> {
        if n_neighbors == 0 {
            return Err(ExecutionError::InvalidKwargs {
                component: "knn".to_string(),
                message: "'n_neighbors' must be at least 1".to_string(),
            });
        }
        Ok(Self {
            n_neighbors,
            train: None,
        })
    }

    /// Construct from configuration kwargs (`n_neighbors`, default 5).
    pub fn from_kwargs(kwargs: &Kwargs) -> Result<Self, ExecutionError> {
        Self::new(kwarg_usize(kwargs, "knn", "n_neighbors", 5)?)
    }
}

impl Estimator for KnnEstimator {
    fn fit(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, u32>,
        _validation: Option<(ArrayView2<'_, f64>, ArrayView1<'_, u32>)>,
    ) -> Result<(), ExecutionError> {
        if x.nrows() == 0 {
            return Err(ExecutionError::EmptyData(
                "cannot fit knn on empty data".to_string(),
            ));
        }
        if x.nrows() != y.len() {
            return Err(ExecutionError::LabelMismatch {
                rows: x.nrows(),
                labels: y.len(),
            });
        }
        self.train = Some((x.to_owned(), y.to_owned()));
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<u32>, ExecutionError> {
        let (train_x, train_y) = self
            .train
            .as_ref()
            .ok_or_else(|| ExecutionError::NotFitted("KnnEstimator".to_string()))?;
        if x.ncols() != train_x.ncols() {
            return Err(ExecutionError::FeatureMismatch {
                expected: train_x.ncols(),
                got: x.ncols(),
            });
        }
        let k = self.n_neighbors.min(train_x.nrows());
        let mut predictions = Vec::with_capacity(x.nrows());
        for row in x.rows() {
            let mut distances: Vec<(f64, u32)> = train_x
                .rows()
                .into_iter()
                .zip(train_y.iter())
                .map(|(train_row, &label)| {
                    let d = row
                        .iter()
                        .zip(train_row.iter())
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum::<f64>();
                    (d, label)
                })
                .collect();
            distances.sort_by(|a, b| a.0.total_cmp(&b.0));
            predictions.push(majority(distances[..k].iter().map(|&(_, label)| label)));
        }
        Ok(Array1::from_vec(predictions))
    }
}

/// Predicts the most frequent class seen at fit time.
#[derive(Debug, Clone, Default)]
pub struct MajorityClassEstimator {
    class: Option<u32>,
}

impl MajorityClassEstimator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Estimator for MajorityClassEstimator {
    fn fit(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, u32>,
        _validation: Option<(ArrayView2<'_, f64>, ArrayView1<'_, u32>)>,
    ) -> Result<(), ExecutionError> {
        if y.is_empty() {
            return Err(ExecutionError::EmptyData(
                "cannot fit majority estimator on empty labels".to_string(),
            ));
        }
        if x.nrows() != y.len() {
            return Err(ExecutionError::LabelMismatch {
                rows: x.nrows(),
                labels: y.len(),
            });
        }
        self.class = Some(majority(y.iter().copied()));
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<u32>, ExecutionError> {
        let class = self
            .class
            .ok_or_else(|| ExecutionError::NotFitted("MajorityClassEstimator".to_string()))?;
        Ok(Array1::from_elem(x.nrows(), class))
    }
}

/// Most frequent label; ties break toward the smallest class code.
fn majority(labels: impl Iterator<Item = u32>) -> u32 {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut best = (0u32, 0usize);
    for (&label, &count) in &counts {
        if count > best.1 {
            best = (label, count);
        }
    }
    best.0
}
