//! Declarative experiment configuration.
//!
//! [`ExecutionConfig`] is the sole entry point for describing one experiment
//! run: which dataset partitions to load, the ordered transform chain, the
//! optional reducer and scaler, and the estimators to fit and evaluate. The
//! structs deserialize from YAML but are plain records, constructible
//! directly in code.
//!
//! ```yaml
//! version: "1.0"
//! train_dataset: [example.balanced[train]]
//! test_dataset: [example.balanced[test]]
//! reducer_dataset: [example.balanced[train]]
//! transforms:
//!   - name: identity
//!     transform: identity
//! reducer:
//!   name: reducer
//!   algorithm: mean
//! scaler:
//!   name: scaler
//!   algorithm: standard_scaler
//! estimators:
//!   - name: knn-5
//!     algorithm: knn
//!     kwargs: { n_neighbors: 5 }
//!     num_runs: 3
//! extra:
//!   in_use_features: []
//!   reduce_on: axis
//!   scale_on: train
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::components::registry::Kwargs;
use crate::error::ExecutionError;

/// Configuration schema version this crate understands.
pub const CONFIG_VERSION: &str = "1.0";

/// Fit/apply split for a windowed transform step.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowedConfig {
    /// Role the transform is fit on.
    pub fit_on: String,
    /// Role the fitted transform is applied to.
    pub transform_on: String,
}

/// How a transform step targets the registry: identically everywhere, or
/// fit on one role and applied to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformScope<'a> {
    /// Fresh instance fit and applied independently per role.
    Unwindowed,
    /// One instance fit on `fit_on`, applied only to `transform_on`.
    Windowed {
        fit_on: &'a str,
        transform_on: &'a str,
    },
}

/// One step of the transform chain.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    /// Human-readable step name (used for logging only).
    pub name: String,
    /// Algorithm key resolved against the transform registry.
    pub transform: String,
    /// Constructor kwargs for the transform.
    #[serde(default)]
    pub kwargs: Option<Kwargs>,
    /// Windowed fit/apply split; absent means unwindowed.
    #[serde(default)]
    pub windowed: Option<WindowedConfig>,
}

impl TransformConfig {
    /// The step's scope as an exhaustive-matchable variant.
    pub fn scope(&self) -> TransformScope<'_> {
        match &self.windowed {
            None => TransformScope::Unwindowed,
            Some(w) => TransformScope::Windowed {
                fit_on: &w.fit_on,
                transform_on: &w.transform_on,
            },
        }
    }
}

/// Dimensionality reducer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReducerConfig {
    pub name: String,
    /// Algorithm key resolved against the reducer registry.
    pub algorithm: String,
    #[serde(default)]
    pub kwargs: Option<Kwargs>,
    /// Pass the fit dataset's labels to the reducer's fit.
    #[serde(default)]
    pub use_y: bool,
    /// Restrict application to the named roles. `None` means every role;
    /// an empty list is rejected at execution time.
    #[serde(default)]
    pub apply_only_in: Option<Vec<String>>,
}

/// Feature scaler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerConfig {
    pub name: String,
    /// Algorithm key resolved against the scaler registry.
    pub algorithm: String,
    #[serde(default)]
    pub kwargs: Option<Kwargs>,
}

fn default_num_runs() -> usize {
    1
}

/// Estimator configuration. Each of `num_runs` runs constructs a fresh
/// instance; runs never share fitted state.
#[derive(Debug, Clone, Deserialize)]
pub struct EstimatorConfig {
    pub name: String,
    /// Algorithm key resolved against the estimator registry.
    pub algorithm: String,
    #[serde(default)]
    pub kwargs: Option<Kwargs>,
    /// Number of fit/predict runs. Must be at least 1.
    #[serde(default = "default_num_runs")]
    pub num_runs: usize,
}

/// Spatial partitioning policy of the reduce stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReduceOn {
    /// The whole feature vector is one block.
    All,
    /// One block per sensor (three consecutive axis windows).
    Sensor,
    /// One block per axis window.
    Axis,
}

impl FromStr for ReduceOn {
    type Err = ExecutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ReduceOn::All),
            "sensor" => Ok(ReduceOn::Sensor),
            "axis" => Ok(ReduceOn::Axis),
            other => Err(ExecutionError::InvalidPolicy {
                field: "reduce_on".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ReduceOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReduceOn::All => "all",
            ReduceOn::Sensor => "sensor",
            ReduceOn::Axis => "axis",
        };
        write!(f, "{}", s)
    }
}

/// Fit policy of the scale stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ScaleOn {
    /// Independent scaler per role; each role scaled against its own
    /// statistics, no cross-role leakage.
    #[serde(rename = "self")]
    SelfScale,
    /// One scaler fit on the training role, applied everywhere.
    #[serde(rename = "train")]
    Train,
}

impl FromStr for ScaleOn {
    type Err = ExecutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "self" => Ok(ScaleOn::SelfScale),
            "train" => Ok(ScaleOn::Train),
            other => Err(ExecutionError::InvalidPolicy {
                field: "scale_on".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Policy fields shared across stages.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtraConfig {
    /// Window names to keep at load time; empty means all.
    #[serde(default)]
    pub in_use_features: Vec<String>,
    pub reduce_on: ReduceOn,
    pub scale_on: ScaleOn,
}

/// Top-level declarative record for one experiment run. Immutable input;
/// execution never mutates it.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Configuration schema version.
    pub version: String,
    /// Partitions concatenated into the training role.
    pub train_dataset: Vec<String>,
    /// Partitions concatenated into the test role.
    pub test_dataset: Vec<String>,
    /// Partitions for the validation role (optional).
    #[serde(default)]
    pub validation_dataset: Option<Vec<String>>,
    /// Partitions the reducer is fit on (optional; required when `reducer`
    /// is set).
    #[serde(default)]
    pub reducer_dataset: Option<Vec<String>>,
    /// Partitions for the reducer's validation split (optional).
    #[serde(default)]
    pub reducer_validation_dataset: Option<Vec<String>>,
    /// Ordered transform chain; absent means no transforms.
    #[serde(default)]
    pub transforms: Option<Vec<TransformConfig>>,
    #[serde(default)]
    pub reducer: Option<ReducerConfig>,
    #[serde(default)]
    pub scaler: Option<ScalerConfig>,
    pub estimators: Vec<EstimatorConfig>,
    pub extra: ExtraConfig,
}

impl ExecutionConfig {
    /// Parse a configuration from a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ExecutionError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parse a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ExecutionError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
version: "1.0"
train_dataset: ["example.balanced[train]"]
test_dataset: ["example.balanced[test]"]
reducer_dataset: ["example.balanced[train]"]
transforms:
  - name: identity
    transform: identity
  - name: windowed
    transform: identity
    windowed:
      fit_on: train_dataset
      transform_on: test_dataset
reducer:
  name: reducer
  algorithm: mean
  use_y: true
scaler:
  name: scaler
  algorithm: standard_scaler
estimators:
  - name: knn-5
    algorithm: knn
    kwargs:
      n_neighbors: 5
    num_runs: 3
  - name: majority
    algorithm: majority
extra:
  in_use_features: [accel-x, accel-y]
  reduce_on: axis
  scale_on: train
"#;

    #[test]
    fn test_parse_full_config() {
        let config = ExecutionConfig::from_yaml_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.train_dataset, vec!["example.balanced[train]"]);
        assert!(config.validation_dataset.is_none());

        let transforms = config.transforms.as_ref().unwrap();
        assert_eq!(transforms.len(), 2);
        assert_eq!(transforms[0].scope(), TransformScope::Unwindowed);
        assert_eq!(
            transforms[1].scope(),
            TransformScope::Windowed {
                fit_on: "train_dataset",
                transform_on: "test_dataset",
            }
        );

        let reducer = config.reducer.as_ref().unwrap();
        assert!(reducer.use_y);
        assert!(reducer.apply_only_in.is_none());

        assert_eq!(config.estimators[0].num_runs, 3);
        // num_runs defaults to 1 when omitted
        assert_eq!(config.estimators[1].num_runs, 1);

        assert_eq!(config.extra.reduce_on, ReduceOn::Axis);
        assert_eq!(config.extra.scale_on, ScaleOn::Train);
    }

    #[test]
    fn test_estimator_kwargs_carried_through() {
        let config = ExecutionConfig::from_yaml_str(SAMPLE_CONFIG).unwrap();
        let kwargs = config.estimators[0].kwargs.as_ref().unwrap();
        assert_eq!(kwargs.get("n_neighbors").and_then(|v| v.as_u64()), Some(5));
    }

    #[test]
    fn test_reduce_on_from_str() {
        assert_eq!(ReduceOn::from_str("all").unwrap(), ReduceOn::All);
        assert_eq!(ReduceOn::from_str("sensor").unwrap(), ReduceOn::Sensor);
        assert_eq!(ReduceOn::from_str("axis").unwrap(), ReduceOn::Axis);
        let err = ReduceOn::from_str("invalid").unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::InvalidPolicy { ref field, .. } if field == "reduce_on"
        ));
    }

    #[test]
    fn test_scale_on_from_str() {
        assert_eq!(ScaleOn::from_str("self").unwrap(), ScaleOn::SelfScale);
        assert_eq!(ScaleOn::from_str("train").unwrap(), ScaleOn::Train);
        assert!(ScaleOn::from_str("global").is_err());
    }

    #[test]
    fn test_unknown_reduce_on_rejected_at_parse() {
        let yaml = SAMPLE_CONFIG.replace("reduce_on: axis", "reduce_on: diagonal");
        let err = ExecutionConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ExecutionError::Yaml(_)));
    }
}
