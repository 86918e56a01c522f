//! Built-in dimensionality reducers.
//!
//! Real experiments plug in external reducers (UMAP-style embeddings,
//! contrastive encoders) through the registry; the built-in [`MeanReducer`]
//! gives the reduce stage a dependency-free reducer that collapses each
//! block to a single column.

use ndarray::{Array2, ArrayView2, Axis};

use crate::components::Transform;
use crate::error::ExecutionError;

/// Reduces a feature block to its per-row mean: `(n, w) -> (n, 1)`.
/// No fit state.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanReducer;

impl Transform for MeanReducer {
    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ExecutionError> {
        if x.ncols() == 0 {
            return Err(ExecutionError::EmptyData(
                "cannot reduce a zero-width block".to_string(),
            ));
        }
        let means = x
            .mean_axis(Axis(1))
            .ok_or_else(|| ExecutionError::EmptyData("no columns for row mean".to_string()))?;
        Ok(means.insert_axis(Axis(1)))
    }
}
