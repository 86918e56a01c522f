//! Error types for experiment execution.

use std::fmt;

/// Error type covering every failure an experiment stage can surface.
///
/// Lookup failures keep enough structure that an unknown dataset group,
/// variant and role are each detectable as distinct cases, and pluggable
/// component failures pass through as [`ExecutionError::Component`] without
/// being masked or retried.
#[derive(Debug)]
pub enum ExecutionError {
    /// Dataset group missing from the location catalog.
    UnknownGroup { group: String },
    /// Dataset variant missing under a known group.
    UnknownVariant { group: String, variant: String },
    /// Dataset role missing under a known group/variant pair.
    UnknownRole {
        group: String,
        variant: String,
        role: String,
    },
    /// Dataset identifier not of the form `group.variant[role]`.
    InvalidIdentifier(String),
    /// Role name referenced by a stage but absent from the registry.
    MissingDataset(String),
    /// Feature (window) name absent from a loaded dataset.
    UnknownFeature(String),
    /// Algorithm name absent from a component registry.
    UnknownComponent { kind: String, name: String },
    /// Unrecognized policy value (e.g. `reduce_on`, `scale_on`, `num_runs`).
    InvalidPolicy { field: String, value: String },
    /// `apply_only_in` given as an empty list; omit it to mean "all roles".
    EmptyApplyList,
    /// Component constructor rejected its kwargs.
    InvalidKwargs { component: String, message: String },
    /// Feature width cannot be split into the requested number of equal blocks.
    BlockPartition { width: usize, blocks: usize },
    /// Transform or estimator used before `fit`.
    NotFitted(String),
    /// Feature dimension mismatch between fit and apply.
    FeatureMismatch { expected: usize, got: usize },
    /// Row count and label count disagree.
    LabelMismatch { rows: usize, labels: usize },
    /// Empty data provided where non-empty was required.
    EmptyData(String),
    /// Expected column missing from backing storage.
    MissingColumn(String),
    /// Array shape error during concatenation or stacking.
    Shape(String),
    /// Failure raised by a pluggable component, propagated unchanged.
    Component(String),
    /// I/O error while reading backing storage.
    Io(String),
    /// CSV decoding error.
    Csv(String),
    /// YAML decoding error.
    Yaml(String),
    /// Value in backing storage failed to parse.
    Parse(String),
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::UnknownGroup { group } => {
                write!(f, "Unknown dataset group: '{}'", group)
            }
            ExecutionError::UnknownVariant { group, variant } => {
                write!(f, "Unknown variant '{}' in dataset group '{}'", variant, group)
            }
            ExecutionError::UnknownRole {
                group,
                variant,
                role,
            } => {
                write!(f, "Unknown role '{}' in dataset '{}.{}'", role, group, variant)
            }
            ExecutionError::InvalidIdentifier(ident) => {
                write!(
                    f,
                    "Invalid dataset identifier '{}': expected 'group.variant[role]'",
                    ident
                )
            }
            ExecutionError::MissingDataset(role) => {
                write!(f, "Dataset '{}' is not present in the registry", role)
            }
            ExecutionError::UnknownFeature(name) => {
                write!(f, "Feature '{}' is not present in the dataset", name)
            }
            ExecutionError::UnknownComponent { kind, name } => {
                write!(f, "Unknown {} algorithm: '{}'", kind, name)
            }
            ExecutionError::InvalidPolicy { field, value } => {
                write!(f, "Invalid value '{}' for '{}'", value, field)
            }
            ExecutionError::EmptyApplyList => {
                write!(f, "apply_only_in must not be empty; omit it to apply to all datasets")
            }
            ExecutionError::InvalidKwargs { component, message } => {
                write!(f, "Invalid kwargs for {}: {}", component, message)
            }
            ExecutionError::BlockPartition { width, blocks } => {
                write!(f, "Cannot split width {} into {} equal blocks", width, blocks)
            }
            ExecutionError::NotFitted(component) => {
                write!(f, "{} must be fit before transform/predict", component)
            }
            ExecutionError::FeatureMismatch { expected, got } => {
                write!(f, "Feature mismatch: expected {} features, got {}", expected, got)
            }
            ExecutionError::LabelMismatch { rows, labels } => {
                write!(f, "Label mismatch: {} rows but {} labels", rows, labels)
            }
            ExecutionError::EmptyData(msg) => write!(f, "Empty data: {}", msg),
            ExecutionError::MissingColumn(name) => {
                write!(f, "Missing column '{}' in backing storage", name)
            }
            ExecutionError::Shape(msg) => write!(f, "Shape error: {}", msg),
            ExecutionError::Component(msg) => write!(f, "Component error: {}", msg),
            ExecutionError::Io(msg) => write!(f, "I/O error: {}", msg),
            ExecutionError::Csv(msg) => write!(f, "CSV error: {}", msg),
            ExecutionError::Yaml(msg) => write!(f, "YAML error: {}", msg),
            ExecutionError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for ExecutionError {}

impl From<std::io::Error> for ExecutionError {
    fn from(err: std::io::Error) -> Self {
        ExecutionError::Io(err.to_string())
    }
}

impl From<csv::Error> for ExecutionError {
    fn from(err: csv::Error) -> Self {
        ExecutionError::Csv(err.to_string())
    }
}

impl From<serde_yaml::Error> for ExecutionError {
    fn from(err: serde_yaml::Error) -> Self {
        ExecutionError::Yaml(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ExecutionError {
    fn from(err: ndarray::ShapeError) -> Self {
        ExecutionError::Shape(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_errors_are_distinguishable() {
        let group = ExecutionError::UnknownGroup {
            group: "xxx".to_string(),
        };
        let variant = ExecutionError::UnknownVariant {
            group: "example".to_string(),
            variant: "ooo".to_string(),
        };
        let role = ExecutionError::UnknownRole {
            group: "example".to_string(),
            variant: "balanced".to_string(),
            role: "what?".to_string(),
        };
        assert!(matches!(group, ExecutionError::UnknownGroup { .. }));
        assert!(matches!(variant, ExecutionError::UnknownVariant { .. }));
        assert!(matches!(role, ExecutionError::UnknownRole { .. }));
    }

    #[test]
    fn test_error_display_block_partition() {
        let err = ExecutionError::BlockPartition {
            width: 30,
            blocks: 7,
        };
        assert!(err.to_string().contains("30"));
        assert!(err.to_string().contains("7"));
    }

    #[test]
    fn test_error_display_empty_apply_list() {
        let err = ExecutionError::EmptyApplyList;
        assert!(err.to_string().contains("apply_only_in"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: ExecutionError = io_err.into();
        assert!(matches!(err, ExecutionError::Io(_)));
    }

    #[test]
    fn test_error_is_std_error() {
        let err = ExecutionError::MissingDataset("train_dataset".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
