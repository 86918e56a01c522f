//! Windowed dataset values and the role-keyed dataset registry.
//!
//! # Core Concepts
//!
//! - **WindowedDataset** — An immutable `(features, labels)` pair where
//!   `features` is a `(n_samples, n_features)` matrix assembled by
//!   concatenating fixed-width time windows (one per sensor axis channel,
//!   e.g. `accel-x`), and `labels` is a vector of integer class codes.
//! - **DatasetRegistry** — A mapping from *role* name (`train_dataset`,
//!   `test_dataset`, ...) to a [`WindowedDataset`]. Every stage consumes a
//!   registry and produces a new one; datasets are never mutated in place.

use ndarray::{concatenate, Array1, Array2, ArrayView1, ArrayView2, Axis};
use std::collections::BTreeMap;

use crate::error::ExecutionError;

pub mod loader;

/// Registry role holding the training split.
pub const TRAIN_DATASET: &str = "train_dataset";
/// Registry role holding the validation split (optional).
pub const VALIDATION_DATASET: &str = "validation_dataset";
/// Registry role holding the held-out test split.
pub const TEST_DATASET: &str = "test_dataset";
/// Registry role the reducer is fit on.
pub const REDUCER_DATASET: &str = "reducer_dataset";
/// Registry role passed to the reducer as a validation split (optional).
pub const REDUCER_VALIDATION_DATASET: &str = "reducer_validation_dataset";

/// An ordered, indexable collection of `(features, label)` pairs.
///
/// The feature vector of every sample is the concatenation of
/// `num_windows()` equal-width blocks, one per named window. Window names
/// drive the `sensor`/`axis` partitioning policies of the reduce stage and
/// the `in_use_features` selection of the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedDataset {
    features: Array2<f64>,
    labels: Array1<u32>,
    windows: Vec<String>,
}

impl WindowedDataset {
    /// Create a dataset from a feature matrix, label vector and window names.
    ///
    /// # Errors
    /// - [`ExecutionError::LabelMismatch`] if row and label counts disagree.
    /// - [`ExecutionError::BlockPartition`] if windows are declared and the
    ///   feature width is not a multiple of the window count.
    pub fn new(
        features: Array2<f64>,
        labels: Array1<u32>,
        windows: Vec<String>,
    ) -> Result<Self, ExecutionError> {
        if features.nrows() != labels.len() {
            return Err(ExecutionError::LabelMismatch {
                rows: features.nrows(),
                labels: labels.len(),
            });
        }
        if !windows.is_empty() && features.ncols() % windows.len() != 0 {
            return Err(ExecutionError::BlockPartition {
                width: features.ncols(),
                blocks: windows.len(),
            });
        }
        Ok(Self {
            features,
            labels,
            windows,
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// Whether the dataset has no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Feature-vector width.
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Number of distinct time windows concatenated per sample.
    pub fn num_windows(&self) -> usize {
        self.windows.len()
    }

    /// Names of the windows, in feature order.
    pub fn windows(&self) -> &[String] {
        &self.windows
    }

    /// Width of one window block. Zero when no windows are declared.
    pub fn window_width(&self) -> usize {
        if self.windows.is_empty() {
            0
        } else {
            self.n_features() / self.num_windows()
        }
    }

    /// View of the feature matrix, shape `(n_samples, n_features)`.
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    /// View of the label vector, shape `(n_samples,)`.
    pub fn labels(&self) -> ArrayView1<'_, u32> {
        self.labels.view()
    }

    /// The `(features, label)` pair at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<(ArrayView1<'_, f64>, u32)> {
        if index >= self.len() {
            return None;
        }
        Some((self.features.row(index), self.labels[index]))
    }

    /// Rebuild this dataset around a new feature matrix, carrying labels and
    /// window names over. Used by stages that replace feature content; the
    /// new width need not divide evenly by the window count (a reduced
    /// dataset keeps its provenance windows).
    pub fn with_features(&self, features: Array2<f64>) -> Result<Self, ExecutionError> {
        if features.nrows() != self.labels.len() {
            return Err(ExecutionError::LabelMismatch {
                rows: features.nrows(),
                labels: self.labels.len(),
            });
        }
        Ok(Self {
            features,
            labels: self.labels.clone(),
            windows: self.windows.clone(),
        })
    }

    /// Restrict to the named windows' column blocks, in this dataset's
    /// window order.
    ///
    /// # Errors
    /// [`ExecutionError::UnknownFeature`] when a name is not a window of
    /// this dataset.
    pub fn select_windows(&self, names: &[String]) -> Result<Self, ExecutionError> {
        for name in names {
            if !self.windows.iter().any(|w| w == name) {
                return Err(ExecutionError::UnknownFeature(name.clone()));
            }
        }
        let width = self.window_width();
        let mut kept_windows = Vec::new();
        let mut parts: Vec<ArrayView2<'_, f64>> = Vec::new();
        for (i, window) in self.windows.iter().enumerate() {
            if names.iter().any(|n| n == window) {
                kept_windows.push(window.clone());
                parts.push(self.features.slice(ndarray::s![.., i * width..(i + 1) * width]));
            }
        }
        if parts.is_empty() {
            return Err(ExecutionError::EmptyData(
                "window selection kept no features".to_string(),
            ));
        }
        let features = concatenate(Axis(1), &parts)?;
        Ok(Self {
            features,
            labels: self.labels.clone(),
            windows: kept_windows,
        })
    }

    /// Stack partitions row-wise into one dataset.
    ///
    /// All parts must agree on feature width and window names.
    pub fn concat(parts: Vec<WindowedDataset>) -> Result<Self, ExecutionError> {
        let first = parts
            .first()
            .ok_or_else(|| ExecutionError::EmptyData("no partitions to concatenate".to_string()))?;
        let windows = first.windows.clone();
        let width = first.n_features();
        for part in &parts {
            if part.n_features() != width {
                return Err(ExecutionError::FeatureMismatch {
                    expected: width,
                    got: part.n_features(),
                });
            }
            if part.windows != windows {
                return Err(ExecutionError::UnknownFeature(format!(
                    "window layout mismatch: [{}] vs [{}]",
                    windows.join(", "),
                    part.windows.join(", ")
                )));
            }
        }
        let feature_views: Vec<ArrayView2<'_, f64>> =
            parts.iter().map(|p| p.features.view()).collect();
        let label_views: Vec<ArrayView1<'_, u32>> =
            parts.iter().map(|p| p.labels.view()).collect();
        let features = concatenate(Axis(0), &feature_views)?;
        let labels = concatenate(Axis(0), &label_views)?;
        Ok(Self {
            features,
            labels,
            windows,
        })
    }
}

/// Mapping from role name to [`WindowedDataset`].
///
/// Iteration order is deterministic (sorted by role name); insertion order
/// is irrelevant.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    datasets: BTreeMap<String, WindowedDataset>,
}

impl DatasetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a dataset under a role name, replacing any previous entry.
    pub fn insert(&mut self, role: impl Into<String>, dataset: WindowedDataset) {
        self.datasets.insert(role.into(), dataset);
    }

    /// The dataset under `role`, if present.
    pub fn get(&self, role: &str) -> Option<&WindowedDataset> {
        self.datasets.get(role)
    }

    /// The dataset under `role`, or [`ExecutionError::MissingDataset`].
    pub fn require(&self, role: &str) -> Result<&WindowedDataset, ExecutionError> {
        self.datasets
            .get(role)
            .ok_or_else(|| ExecutionError::MissingDataset(role.to_string()))
    }

    /// Whether a role is present.
    pub fn contains(&self, role: &str) -> bool {
        self.datasets.contains_key(role)
    }

    /// Remove a role, returning its dataset if it was present.
    pub fn remove(&mut self, role: &str) -> Option<WindowedDataset> {
        self.datasets.remove(role)
    }

    /// Role names in sorted order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    /// `(role, dataset)` pairs in sorted role order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WindowedDataset)> {
        self.datasets.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of roles.
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// Whether the registry holds no roles.
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl FromIterator<(String, WindowedDataset)> for DatasetRegistry {
    fn from_iter<I: IntoIterator<Item = (String, WindowedDataset)>>(iter: I) -> Self {
        Self {
            datasets: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_dataset() -> WindowedDataset {
        // 3 samples, 2 windows of width 2
        let features = array![
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0]
        ];
        let labels = array![0u32, 1, 0];
        WindowedDataset::new(
            features,
            labels,
            vec!["accel-x".to_string(), "accel-y".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_dataset_shape_accessors() {
        let ds = small_dataset();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.n_features(), 4);
        assert_eq!(ds.num_windows(), 2);
        assert_eq!(ds.window_width(), 2);
    }

    #[test]
    fn test_dataset_get() {
        let ds = small_dataset();
        let (row, label) = ds.get(1).unwrap();
        assert_eq!(row.to_vec(), vec![5.0, 6.0, 7.0, 8.0]);
        assert_eq!(label, 1);
        assert!(ds.get(3).is_none());
    }

    #[test]
    fn test_dataset_label_mismatch() {
        let features = array![[1.0, 2.0], [3.0, 4.0]];
        let labels = array![0u32];
        let err = WindowedDataset::new(features, labels, vec![]).unwrap_err();
        assert!(matches!(err, ExecutionError::LabelMismatch { rows: 2, labels: 1 }));
    }

    #[test]
    fn test_dataset_window_width_must_divide() {
        let features = array![[1.0, 2.0, 3.0]];
        let labels = array![0u32];
        let err =
            WindowedDataset::new(features, labels, vec!["a".to_string(), "b".to_string()])
                .unwrap_err();
        assert!(matches!(err, ExecutionError::BlockPartition { width: 3, blocks: 2 }));
    }

    #[test]
    fn test_select_windows() {
        let ds = small_dataset();
        let selected = ds.select_windows(&["accel-y".to_string()]).unwrap();
        assert_eq!(selected.n_features(), 2);
        assert_eq!(selected.num_windows(), 1);
        assert_eq!(selected.features().row(0).to_vec(), vec![3.0, 4.0]);
        assert_eq!(selected.labels(), ds.labels());
    }

    #[test]
    fn test_select_windows_unknown_feature() {
        let ds = small_dataset();
        let err = ds.select_windows(&["gyro-z".to_string()]).unwrap_err();
        assert!(matches!(err, ExecutionError::UnknownFeature(_)));
    }

    #[test]
    fn test_concat_partitions() {
        let a = small_dataset();
        let b = small_dataset();
        let merged = WindowedDataset::concat(vec![a, b]).unwrap();
        assert_eq!(merged.len(), 6);
        assert_eq!(merged.n_features(), 4);
        assert_eq!(merged.num_windows(), 2);
    }

    #[test]
    fn test_concat_width_mismatch() {
        let a = small_dataset();
        let b = WindowedDataset::new(array![[1.0, 2.0]], array![0u32], vec![]).unwrap();
        let err = WindowedDataset::concat(vec![a, b]).unwrap_err();
        assert!(matches!(err, ExecutionError::FeatureMismatch { expected: 4, got: 2 }));
    }

    #[test]
    fn test_registry_require() {
        let mut registry = DatasetRegistry::new();
        registry.insert(TRAIN_DATASET, small_dataset());
        assert!(registry.require(TRAIN_DATASET).is_ok());
        let err = registry.require(TEST_DATASET).unwrap_err();
        assert!(matches!(err, ExecutionError::MissingDataset(_)));
    }

    #[test]
    fn test_registry_iteration_is_sorted() {
        let mut registry = DatasetRegistry::new();
        registry.insert("b_role", small_dataset());
        registry.insert("a_role", small_dataset());
        let roles: Vec<&str> = registry.roles().collect();
        assert_eq!(roles, vec!["a_role", "b_role"]);
    }
}
