//! # experiment-executor
//!
//! A declarative executor for multi-stage classification experiments over
//! windowed sensor datasets.
//!
//! ## Core Design Principles
//!
//! - **Declarative Runs**: One [`config::ExecutionConfig`] record fully
//!   describes an experiment; execution never mutates it, so a config can be
//!   re-run or shared between runs.
//! - **Pure Stages**: Every stage maps a [`dataset::DatasetRegistry`] to a
//!   new registry. Earlier registries stay intact and datasets are never
//!   mutated in place.
//! - **Pluggable Components**: Transforms, reducers, scalers and estimators
//!   are resolved by name from registries, so tests and embedders can
//!   inject their own algorithms without touching the pipeline.
//! - **Fail-Fast Configuration**: Unknown dataset identifiers, algorithm
//!   keys and policy values are rejected before any data flows.
//!
//! ## Pipeline
//!
//! ```text
//! load -> do_transform -> do_reduce -> do_scale -> do_classification
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use experiment_executor::components::ComponentSet;
//! use experiment_executor::config::ExecutionConfig;
//! use experiment_executor::dataset::loader::DatasetLocations;
//! use experiment_executor::executor::run_experiment;
//!
//! # fn main() -> Result<(), experiment_executor::error::ExecutionError> {
//! let config = ExecutionConfig::from_yaml_file("experiment.yaml")?;
//! let locations = DatasetLocations::from_yaml_file("datasets.yaml")?;
//! let outcome = run_experiment(&config, &locations, &ComponentSet::defaults())?;
//! for result in &outcome.results {
//!     println!("{}: {} runs", result.name, result.reports.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `config` — Declarative experiment configuration records
//! - `dataset` — Windowed datasets, the role registry and the CSV loader
//! - `components` — Capability traits, built-in algorithms and registries
//! - `stages` — The transform, reduce, scale and classification stages
//! - `report` — Per-run classification metrics
//! - `executor` — The end-to-end experiment driver

/// Pluggable algorithm components and their registries.
pub mod components;

/// Declarative experiment configuration.
pub mod config;

/// Windowed datasets, the role registry and the loader.
pub mod dataset;

/// The crate-wide error type.
pub mod error;

/// The end-to-end experiment driver.
pub mod executor;

/// Per-run classification metrics.
pub mod report;

/// The four pipeline stages.
pub mod stages;

/// Small shared helpers.
pub mod util;

pub use components::ComponentSet;
pub use config::ExecutionConfig;
pub use dataset::{DatasetRegistry, WindowedDataset};
pub use error::ExecutionError;
pub use executor::{run_experiment, EstimatorResult, ExperimentResult};
pub use report::{ClassificationReport, RunReport};
