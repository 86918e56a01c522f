//! Scale stage: normalize feature scales across the registry.
//!
//! Two fit policies exist. `train` fits one scaler on the training role and
//! applies that single fitted instance to every role, so test data is scaled
//! by training statistics and never leaks its own. `self` fits a fresh
//! scaler per role on that role's own features, with no state shared
//! between roles.

use crate::components::{FitData, TransformRegistry};
use crate::config::{ScaleOn, ScalerConfig};
use crate::dataset::{DatasetRegistry, TRAIN_DATASET};
use crate::error::ExecutionError;

/// Scale every role of the registry per the `scale_on` policy, producing a
/// new registry.
///
/// # Errors
/// - [`ExecutionError::MissingDataset`] — `train` policy with no training
///   role in the registry.
/// - [`ExecutionError::UnknownComponent`] — unregistered scaler algorithm.
/// - Any scaler fit/transform failure, propagated unchanged.
pub fn do_scale(
    datasets: &DatasetRegistry,
    scaler_config: &ScalerConfig,
    scale_on: ScaleOn,
    registry: &TransformRegistry,
) -> Result<DatasetRegistry, ExecutionError> {
    tracing::debug!(
        scaler = %scaler_config.name,
        algorithm = %scaler_config.algorithm,
        policy = ?scale_on,
        "scaling datasets"
    );
    match scale_on {
        ScaleOn::Train => scale_on_train(datasets, scaler_config, registry),
        ScaleOn::SelfScale => scale_each_role(datasets, scaler_config, registry),
    }
}

fn scale_on_train(
    datasets: &DatasetRegistry,
    scaler_config: &ScalerConfig,
    registry: &TransformRegistry,
) -> Result<DatasetRegistry, ExecutionError> {
    let train = datasets.require(TRAIN_DATASET)?;
    let mut scaler = registry.resolve(&scaler_config.algorithm, scaler_config.kwargs.as_ref())?;
    scaler.fit(train.features(), FitData::default())?;

    let mut next = DatasetRegistry::new();
    for (role, dataset) in datasets.iter() {
        let features = scaler.transform(dataset.features())?;
        next.insert(role, dataset.with_features(features)?);
    }
    Ok(next)
}

fn scale_each_role(
    datasets: &DatasetRegistry,
    scaler_config: &ScalerConfig,
    registry: &TransformRegistry,
) -> Result<DatasetRegistry, ExecutionError> {
    let mut next = DatasetRegistry::new();
    for (role, dataset) in datasets.iter() {
        let mut scaler =
            registry.resolve(&scaler_config.algorithm, scaler_config.kwargs.as_ref())?;
        scaler.fit(dataset.features(), FitData::default())?;
        let features = scaler.transform(dataset.features())?;
        next.insert(role, dataset.with_features(features)?);
    }
    Ok(next)
}
