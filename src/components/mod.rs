//! Pluggable algorithm components and their capability traits.
//!
//! Transforms, reducers and scalers all share the [`Transform`] capability
//! (`fit` then `transform`); estimators expose [`Estimator`] (`fit` then
//! `predict`). Components are resolved by name from a
//! [`registry::ComponentRegistry`] before any data flows, so an unknown
//! algorithm key fails as a configuration error up front.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::ExecutionError;

pub mod estimators;
pub mod identity;
pub mod reducers;
pub mod registry;
pub mod scaling;

pub use registry::{
    estimator_defaults, reducer_defaults, scaler_defaults, transform_defaults, ComponentRegistry,
    ComponentSet, EstimatorRegistry, Kwargs, TransformRegistry,
};

/// Optional inputs to a transform's `fit`: labels and a held-out validation
/// split. All fields default to `None`; which of them a component uses is
/// component-dependent.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitData<'a> {
    /// Class codes aligned with the fit features.
    pub y: Option<ArrayView1<'a, u32>>,
    /// Held-out validation features.
    pub x_val: Option<ArrayView2<'a, f64>>,
    /// Class codes aligned with `x_val`.
    pub y_val: Option<ArrayView1<'a, u32>>,
}

impl<'a> FitData<'a> {
    /// Fit inputs carrying only labels.
    pub fn with_y(y: ArrayView1<'a, u32>) -> Self {
        Self {
            y: Some(y),
            ..Self::default()
        }
    }
}

/// Capability of transforms, reducers and scalers.
///
/// A component with no meaningful fit keeps the default no-op `fit`.
pub trait Transform {
    /// Learn parameters from `x` and the optional extras in `ctx`.
    fn fit(&mut self, x: ArrayView2<'_, f64>, ctx: FitData<'_>) -> Result<(), ExecutionError> {
        let _ = (x, ctx);
        Ok(())
    }

    /// Map a feature matrix to a new feature matrix. Must not change the
    /// row count.
    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ExecutionError>;
}

/// Capability of estimators.
pub trait Estimator {
    /// Fit on training features and labels, optionally with a validation
    /// split for estimators that support validation-aware fitting.
    fn fit(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, u32>,
        validation: Option<(ArrayView2<'_, f64>, ArrayView1<'_, u32>)>,
    ) -> Result<(), ExecutionError>;

    /// Predict one class code per row of `x`.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<u32>, ExecutionError>;
}
