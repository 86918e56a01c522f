//! Identity transform: no fit, features pass through unchanged.

use ndarray::{Array2, ArrayView2};

use crate::components::Transform;
use crate::error::ExecutionError;

/// A transform with a no-op fit that returns its input unchanged.
///
/// Registered under the `identity` key in the transform, reducer and scaler
/// registries; useful for wiring a stage without altering data.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Transform for Identity {
    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ExecutionError> {
        Ok(x.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::FitData;
    use ndarray::array;

    #[test]
    fn test_identity_round_trip() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let mut identity = Identity;
        identity.fit(x.view(), FitData::default()).unwrap();
        assert_eq!(identity.transform(x.view()).unwrap(), x);
    }
}
