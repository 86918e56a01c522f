//! The pipeline stages.
//!
//! Each stage is a pure function `(registry, stage config, component
//! registry) -> new registry` (or, for classification, `-> per-run
//! reports). Stages never mutate their input registry; callers keep every
//! earlier registry intact. Data flows strictly downstream:
//!
//! ```text
//! load -> do_transform -> do_reduce -> do_scale -> do_classification
//! ```

mod classify;
mod reduce;
mod scale;
mod transform;

pub use classify::do_classification;
pub use reduce::{do_reduce, ReduceOptions, AXES_PER_SENSOR};
pub use scale::do_scale;
pub use transform::do_transform;
