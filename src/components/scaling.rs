//! Built-in feature scalers.
//!
//! - [`StandardScaler`] — z-score normalization: `z = (x - u) / s` with `u`
//!   and `s` learned per column at fit time (population std, ddof 0).
//! - [`MinMaxScaler`] — maps each column's observed `[min, max]` onto a
//!   target output range (default `[0, 1]`).
//!
//! Both hold their learned statistics internally: `fit` populates them,
//! `transform` before `fit` is [`ExecutionError::NotFitted`].

use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::components::registry::{kwarg_bool, kwarg_f64, Kwargs};
use crate::components::{FitData, Transform};
use crate::error::ExecutionError;

/// Z-score scaler. Zero-variance columns scale by 1 so constant features
/// survive unchanged after centering.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    with_mean: bool,
    with_std: bool,
    state: Option<StandardState>,
}

#[derive(Debug, Clone)]
struct StandardState {
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl StandardScaler {
    /// Scaler that both centers and scales to unit variance.
    pub fn new() -> Self {
        Self {
            with_mean: true,
            with_std: true,
            state: None,
        }
    }

    /// Set whether to center data by mean.
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.with_mean = with_mean;
        self
    }

    /// Set whether to scale data to unit variance.
    pub fn with_std(mut self, with_std: bool) -> Self {
        self.with_std = with_std;
        self
    }

    /// Construct from configuration kwargs `with_mean` / `with_std`.
    pub fn from_kwargs(kwargs: &Kwargs) -> Result<Self, ExecutionError> {
        Ok(Self::new()
            .with_mean(kwarg_bool(kwargs, "standard_scaler", "with_mean", true)?)
            .with_std(kwarg_bool(kwargs, "standard_scaler", "with_std", true)?))
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for StandardScaler {
    fn fit(&mut self, x: ArrayView2<'_, f64>, _ctx: FitData<'_>) -> Result<(), ExecutionError> {
        if x.nrows() == 0 {
            return Err(ExecutionError::EmptyData(
                "cannot fit StandardScaler on empty data".to_string(),
            ));
        }
        let cols = x.ncols();
        let mean = if self.with_mean {
            x.mean_axis(Axis(0))
                .ok_or_else(|| ExecutionError::EmptyData("no rows for column mean".to_string()))?
        } else {
            Array1::zeros(cols)
        };
        let std = if self.with_std {
            x.std_axis(Axis(0), 0.0)
                .mapv(|s| if s == 0.0 { 1.0 } else { s })
        } else {
            Array1::ones(cols)
        };
        self.state = Some(StandardState { mean, std });
        Ok(())
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ExecutionError> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| ExecutionError::NotFitted("StandardScaler".to_string()))?;
        if x.ncols() != state.mean.len() {
            return Err(ExecutionError::FeatureMismatch {
                expected: state.mean.len(),
                got: x.ncols(),
            });
        }
        Ok((&x - &state.mean) / &state.std)
    }
}

/// Min-max scaler mapping each column onto `[range_min, range_max]`.
/// Constant columns map to `range_min`.
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    range_min: f64,
    range_max: f64,
    state: Option<MinMaxState>,
}

#[derive(Debug, Clone)]
struct MinMaxState {
    data_min: Array1<f64>,
    scale: Array1<f64>,
}

impl MinMaxScaler {
    /// Scaler targeting the default `[0, 1]` output range.
    pub fn new() -> Self {
        Self {
            range_min: 0.0,
            range_max: 1.0,
            state: None,
        }
    }

    /// Set the target output range.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range_min = min;
        self.range_max = max;
        self
    }

    /// Construct from configuration kwargs `min` / `max`.
    pub fn from_kwargs(kwargs: &Kwargs) -> Result<Self, ExecutionError> {
        let min = kwarg_f64(kwargs, "min_max_scaler", "min", 0.0)?;
        let max = kwarg_f64(kwargs, "min_max_scaler", "max", 1.0)?;
        if min >= max {
            return Err(ExecutionError::InvalidKwargs {
                component: "min_max_scaler".to_string(),
                message: format!("empty output range [{}, {}]", min, max),
            });
        }
        Ok(Self::new().with_range(min, max))
    }
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for MinMaxScaler {
    fn fit(&mut self, x: ArrayView2<'_, f64>, _ctx: FitData<'_>) -> Result<(), ExecutionError> {
        if x.nrows() == 0 {
            return Err(ExecutionError::EmptyData(
                "cannot fit MinMaxScaler on empty data".to_string(),
            ));
        }
        let data_min = x.fold_axis(Axis(0), f64::INFINITY, |acc, &v| acc.min(v));
        let data_max = x.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &v| acc.max(v));
        let span = self.range_max - self.range_min;
        let scale = (&data_max - &data_min).mapv(|d| if d == 0.0 { 0.0 } else { span / d });
        self.state = Some(MinMaxState { data_min, scale });
        Ok(())
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ExecutionError> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| ExecutionError::NotFitted("MinMaxScaler".to_string()))?;
        if x.ncols() != state.data_min.len() {
            return Err(ExecutionError::FeatureMismatch {
                expected: state.data_min.len(),
                got: x.ncols(),
            });
        }
        Ok((&x - &state.data_min) * &state.scale + self.range_min)
    }
}
