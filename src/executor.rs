//! Experiment driver: configuration in, per-estimator reports out.
//!
//! [`run_experiment`] wires the loader and the four stages together for one
//! [`ExecutionConfig`]. It owns no policy of its own; everything it does is
//! dictated by the configuration, and every stage it calls is public API
//! usable on its own.

use std::time::Duration;

use crate::components::ComponentSet;
use crate::config::ExecutionConfig;
use crate::dataset::loader::{load_datasets, DatasetLocations};
use crate::dataset::{
    DatasetRegistry, REDUCER_DATASET, REDUCER_VALIDATION_DATASET, TEST_DATASET, TRAIN_DATASET,
    VALIDATION_DATASET,
};
use crate::error::ExecutionError;
use crate::report::{ClassificationReport, RunReport};
use crate::stages::{do_classification, do_reduce, do_scale, do_transform, ReduceOptions};
use crate::util::Stopwatch;

/// Outcome of one estimator configuration: its per-run reports and the
/// wall-clock time spent fitting and evaluating it.
#[derive(Debug, Clone)]
pub struct EstimatorResult {
    /// Configured estimator name.
    pub name: String,
    /// Algorithm key the estimator was resolved from.
    pub algorithm: String,
    /// One report per run, in run order.
    pub reports: Vec<RunReport>,
    pub elapsed: Duration,
}

/// Outcome of one experiment run.
#[derive(Debug, Clone)]
pub struct ExperimentResult {
    /// One entry per configured estimator, in configuration order.
    pub results: Vec<EstimatorResult>,
}

/// Execute one experiment end to end: load the configured dataset roles,
/// run the transform, reduce and scale stages, then fit and evaluate every
/// estimator.
///
/// The first stage failure aborts the run; nothing is retried.
pub fn run_experiment(
    config: &ExecutionConfig,
    locations: &DatasetLocations,
    components: &ComponentSet,
) -> Result<ExperimentResult, ExecutionError> {
    let total = Stopwatch::start();
    let mut datasets = load_roles(config, locations)?;

    if let Some(transforms) = &config.transforms {
        datasets = do_transform(&datasets, transforms, &components.transforms)?;
    }
    if let Some(reducer) = &config.reducer {
        let options = ReduceOptions {
            reduce_on: config.extra.reduce_on,
            use_y: reducer.use_y,
            apply_only_in: reducer.apply_only_in.clone(),
            ..ReduceOptions::default()
        };
        datasets = do_reduce(&datasets, reducer, &options, &components.reducers)?;
    }
    if let Some(scaler) = &config.scaler {
        datasets = do_scale(&datasets, scaler, config.extra.scale_on, &components.scalers)?;
    }

    let reporter = ClassificationReport::new();
    let mut results = Vec::with_capacity(config.estimators.len());
    for estimator in &config.estimators {
        let watch = Stopwatch::start();
        let reports = do_classification(&datasets, estimator, &reporter, &components.estimators)?;
        let elapsed = watch.elapsed();
        tracing::info!(
            estimator = %estimator.name,
            runs = reports.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "estimator evaluated"
        );
        results.push(EstimatorResult {
            name: estimator.name.clone(),
            algorithm: estimator.algorithm.clone(),
            reports,
            elapsed,
        });
    }
    tracing::info!(
        estimators = results.len(),
        elapsed_ms = total.elapsed().as_millis() as u64,
        "experiment finished"
    );
    Ok(ExperimentResult { results })
}

/// Load every dataset role the configuration names into a registry.
fn load_roles(
    config: &ExecutionConfig,
    locations: &DatasetLocations,
) -> Result<DatasetRegistry, ExecutionError> {
    let features = if config.extra.in_use_features.is_empty() {
        None
    } else {
        Some(config.extra.in_use_features.as_slice())
    };

    let mut datasets = DatasetRegistry::new();
    datasets.insert(
        TRAIN_DATASET,
        load_datasets(locations, &config.train_dataset, features)?,
    );
    datasets.insert(
        TEST_DATASET,
        load_datasets(locations, &config.test_dataset, features)?,
    );
    let optional_roles = [
        (VALIDATION_DATASET, &config.validation_dataset),
        (REDUCER_DATASET, &config.reducer_dataset),
        (REDUCER_VALIDATION_DATASET, &config.reducer_validation_dataset),
    ];
    for (role, idents) in optional_roles {
        if let Some(idents) = idents {
            datasets.insert(role, load_datasets(locations, idents, features)?);
        }
    }
    Ok(datasets)
}
