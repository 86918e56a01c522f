//! Classification stage: fit estimators and evaluate them on the test role.
//!
//! Each estimator run constructs a fresh instance from the registry, fits it
//! on the training role (with the validation role as a held-out split when
//! present), predicts on the test role and hands `(y_true, y_pred)` to the
//! reporter. Runs share no fitted state; non-deterministic estimators may
//! legitimately produce different reports across runs.

use crate::components::EstimatorRegistry;
use crate::config::EstimatorConfig;
use crate::dataset::{DatasetRegistry, TEST_DATASET, TRAIN_DATASET, VALIDATION_DATASET};
use crate::error::ExecutionError;
use crate::report::{ClassificationReport, RunReport};

/// Run one estimator configuration `num_runs` times against the registry.
///
/// Returns one [`RunReport`] per run, in run order.
///
/// # Errors
/// - [`ExecutionError::MissingDataset`] — no training or test role.
/// - [`ExecutionError::InvalidPolicy`] — `num_runs` of zero.
/// - [`ExecutionError::UnknownComponent`] — unregistered estimator
///   algorithm.
/// - Any estimator fit/predict or reporter failure, propagated unchanged.
pub fn do_classification(
    datasets: &DatasetRegistry,
    estimator_config: &EstimatorConfig,
    reporter: &ClassificationReport,
    registry: &EstimatorRegistry,
) -> Result<Vec<RunReport>, ExecutionError> {
    if estimator_config.num_runs == 0 {
        return Err(ExecutionError::InvalidPolicy {
            field: "num_runs".to_string(),
            value: "0".to_string(),
        });
    }
    let train = datasets.require(TRAIN_DATASET)?;
    let test = datasets.require(TEST_DATASET)?;
    let validation = datasets.get(VALIDATION_DATASET);

    let mut reports = Vec::with_capacity(estimator_config.num_runs);
    for run in 0..estimator_config.num_runs {
        tracing::debug!(
            estimator = %estimator_config.name,
            algorithm = %estimator_config.algorithm,
            run,
            "fitting estimator"
        );
        let mut estimator =
            registry.resolve(&estimator_config.algorithm, estimator_config.kwargs.as_ref())?;
        estimator.fit(
            train.features(),
            train.labels(),
            validation.map(|v| (v.features(), v.labels())),
        )?;
        let predictions = estimator.predict(test.features())?;
        reports.push(reporter.evaluate(test.labels(), predictions.view())?);
    }
    Ok(reports)
}
