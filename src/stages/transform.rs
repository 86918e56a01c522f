//! Transform stage: apply an ordered chain of feature transforms.

use crate::components::{FitData, TransformRegistry};
use crate::config::{TransformConfig, TransformScope};
use crate::dataset::DatasetRegistry;
use crate::error::ExecutionError;

/// Apply each transform step to the registry in order; step `i`'s output
/// registry is step `i+1`'s input.
///
/// Unwindowed steps construct a fresh transform per role, fit it on that
/// role and replace the role's features (no fit state is shared across
/// roles). Windowed steps fit one instance on `fit_on` and apply it, with
/// no re-fit, only to `transform_on`; every other role passes through that
/// step unchanged.
///
/// Transform steps never change a dataset's row count or labels.
pub fn do_transform(
    datasets: &DatasetRegistry,
    transforms: &[TransformConfig],
    registry: &TransformRegistry,
) -> Result<DatasetRegistry, ExecutionError> {
    let mut current = datasets.clone();
    for step in transforms {
        tracing::debug!(step = %step.name, transform = %step.transform, "applying transform step");
        current = match step.scope() {
            TransformScope::Unwindowed => apply_unwindowed(&current, step, registry)?,
            TransformScope::Windowed {
                fit_on,
                transform_on,
            } => apply_windowed(&current, step, fit_on, transform_on, registry)?,
        };
    }
    Ok(current)
}

fn apply_unwindowed(
    datasets: &DatasetRegistry,
    step: &TransformConfig,
    registry: &TransformRegistry,
) -> Result<DatasetRegistry, ExecutionError> {
    let mut next = DatasetRegistry::new();
    for (role, dataset) in datasets.iter() {
        let mut transform = registry.resolve(&step.transform, step.kwargs.as_ref())?;
        transform.fit(dataset.features(), FitData::default())?;
        let features = transform.transform(dataset.features())?;
        next.insert(role, dataset.with_features(features)?);
    }
    Ok(next)
}

fn apply_windowed(
    datasets: &DatasetRegistry,
    step: &TransformConfig,
    fit_on: &str,
    transform_on: &str,
    registry: &TransformRegistry,
) -> Result<DatasetRegistry, ExecutionError> {
    let fit_dataset = datasets.require(fit_on)?;
    let target = datasets.require(transform_on)?;

    let mut transform = registry.resolve(&step.transform, step.kwargs.as_ref())?;
    transform.fit(fit_dataset.features(), FitData::default())?;
    let transformed = target.with_features(transform.transform(target.features())?)?;

    let mut next = datasets.clone();
    next.insert(transform_on, transformed);
    Ok(next)
}
