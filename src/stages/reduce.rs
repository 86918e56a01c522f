//! Reduce stage: fit one dimensionality reducer and apply it selectively.
//!
//! The feature vector is partitioned into contiguous equal-width blocks
//! according to the [`ReduceOn`] policy, a fresh reducer is fit per block on
//! the reducer-fit dataset, and each target role's blocks are transformed
//! and re-concatenated in ascending block order, so downstream feature
//! positions are stable across runs.

use ndarray::{concatenate, s, Array2, ArrayView2, Axis};
use std::collections::BTreeSet;

use crate::components::{FitData, Transform, TransformRegistry};
use crate::config::{ReduceOn, ReducerConfig};
use crate::dataset::{DatasetRegistry, WindowedDataset, REDUCER_DATASET, REDUCER_VALIDATION_DATASET};
use crate::error::ExecutionError;

/// Number of axis channels grouped into one sensor under
/// [`ReduceOn::Sensor`].
pub const AXES_PER_SENSOR: usize = 3;

/// Execution-time parameters of the reduce stage.
#[derive(Debug, Clone)]
pub struct ReduceOptions {
    /// Spatial partitioning policy.
    pub reduce_on: ReduceOn,
    /// Pass the fit dataset's labels to the reducer's fit.
    pub use_y: bool,
    /// Roles to apply the fitted reducer to. `None` means every role; an
    /// empty list is invalid. The two reducer-fit roles are always reduced
    /// regardless of this list — they must end up reduced to be usable
    /// downstream.
    pub apply_only_in: Option<Vec<String>>,
    /// Role the reducer is fit on.
    pub reducer_dataset_name: String,
    /// Role passed to fit as a held-out validation split, when present.
    pub reducer_validation_dataset_name: String,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        Self {
            reduce_on: ReduceOn::All,
            use_y: false,
            apply_only_in: None,
            reducer_dataset_name: REDUCER_DATASET.to_string(),
            reducer_validation_dataset_name: REDUCER_VALIDATION_DATASET.to_string(),
        }
    }
}

impl ReduceOptions {
    /// Options for a policy, defaults elsewhere.
    pub fn with_policy(reduce_on: ReduceOn) -> Self {
        Self {
            reduce_on,
            ..Self::default()
        }
    }
}

/// Fit a reducer on the reducer-fit dataset and apply it to the selected
/// roles, producing a new registry.
///
/// Roles outside the apply set are carried over unchanged (bit-identical
/// datasets). See [`ReduceOptions`] for the selection and force-include
/// rules.
///
/// # Errors
/// - [`ExecutionError::MissingDataset`] — reducer-fit role or an
///   `apply_only_in` entry absent from the registry.
/// - [`ExecutionError::EmptyApplyList`] — `apply_only_in` present but empty.
/// - [`ExecutionError::BlockPartition`] — window count or feature width not
///   divisible under the chosen policy.
/// - Any reducer fit/transform failure, propagated unchanged.
pub fn do_reduce(
    datasets: &DatasetRegistry,
    reducer_config: &ReducerConfig,
    options: &ReduceOptions,
    registry: &TransformRegistry,
) -> Result<DatasetRegistry, ExecutionError> {
    // Validate configuration before any data flows.
    if let Some(apply_only_in) = &options.apply_only_in {
        if apply_only_in.is_empty() {
            return Err(ExecutionError::EmptyApplyList);
        }
        for role in apply_only_in {
            datasets.require(role)?;
        }
    }
    let fit_dataset = datasets.require(&options.reducer_dataset_name)?;
    let validation_dataset = datasets.get(&options.reducer_validation_dataset_name);

    let width = fit_dataset.n_features();
    let blocks = block_count(options.reduce_on, fit_dataset)?;
    let block_width = width / blocks;

    tracing::debug!(
        reducer = %reducer_config.name,
        algorithm = %reducer_config.algorithm,
        policy = %options.reduce_on,
        blocks,
        block_width,
        "fitting reducer"
    );

    // One fresh reducer per block, fit on the reducer dataset's block slice.
    let mut fitted: Vec<Box<dyn Transform>> = Vec::with_capacity(blocks);
    for block in 0..blocks {
        let range = block * block_width..(block + 1) * block_width;
        let mut reducer = registry.resolve(&reducer_config.algorithm, reducer_config.kwargs.as_ref())?;
        let x = fit_dataset.features().slice_move(s![.., range.clone()]);
        let ctx = FitData {
            y: options.use_y.then(|| fit_dataset.labels()),
            x_val: validation_dataset.map(|v| v.features().slice_move(s![.., range.clone()])),
            y_val: validation_dataset
                .filter(|_| options.use_y)
                .map(|v| v.labels()),
        };
        reducer.fit(x, ctx)?;
        fitted.push(reducer);
    }

    let targets = apply_set(datasets, options);

    let mut next = DatasetRegistry::new();
    for (role, dataset) in datasets.iter() {
        if !targets.contains(role) {
            next.insert(role, dataset.clone());
            continue;
        }
        next.insert(role, reduce_dataset(dataset, &fitted, block_width)?);
    }
    Ok(next)
}

/// Resolve the block count for a policy against the fit dataset's layout.
fn block_count(
    reduce_on: ReduceOn,
    fit_dataset: &WindowedDataset,
) -> Result<usize, ExecutionError> {
    let width = fit_dataset.n_features();
    let num_windows = fit_dataset.num_windows();
    let blocks = match reduce_on {
        ReduceOn::All => 1,
        ReduceOn::Sensor => {
            if num_windows == 0 || num_windows % AXES_PER_SENSOR != 0 {
                return Err(ExecutionError::BlockPartition {
                    width: num_windows,
                    blocks: AXES_PER_SENSOR,
                });
            }
            num_windows / AXES_PER_SENSOR
        }
        ReduceOn::Axis => {
            if num_windows == 0 {
                return Err(ExecutionError::BlockPartition { width, blocks: 0 });
            }
            num_windows
        }
    };
    if width % blocks != 0 {
        return Err(ExecutionError::BlockPartition { width, blocks });
    }
    Ok(blocks)
}

/// Roles to reduce: all of them, or the `apply_only_in` set — with the two
/// reducer-fit roles force-included either way.
fn apply_set(datasets: &DatasetRegistry, options: &ReduceOptions) -> BTreeSet<String> {
    let mut targets: BTreeSet<String> = match &options.apply_only_in {
        None => datasets.roles().map(str::to_string).collect(),
        Some(apply_only_in) => apply_only_in.iter().cloned().collect(),
    };
    for role in [
        &options.reducer_dataset_name,
        &options.reducer_validation_dataset_name,
    ] {
        if datasets.contains(role) {
            targets.insert(role.clone());
        }
    }
    targets
}

/// Transform every block of one dataset and re-concatenate ascending.
fn reduce_dataset(
    dataset: &WindowedDataset,
    fitted: &[Box<dyn Transform>],
    block_width: usize,
) -> Result<WindowedDataset, ExecutionError> {
    let expected = fitted.len() * block_width;
    if dataset.n_features() != expected {
        return Err(ExecutionError::FeatureMismatch {
            expected,
            got: dataset.n_features(),
        });
    }
    let mut reduced_blocks: Vec<Array2<f64>> = Vec::with_capacity(fitted.len());
    for (block, reducer) in fitted.iter().enumerate() {
        let slice = dataset
            .features()
            .slice_move(s![.., block * block_width..(block + 1) * block_width]);
        reduced_blocks.push(reducer.transform(slice)?);
    }
    let views: Vec<ArrayView2<'_, f64>> = reduced_blocks.iter().map(Array2::view).collect();
    let features = concatenate(Axis(1), &views)?;
    dataset.with_features(features)
}
