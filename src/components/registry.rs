//! Name-to-constructor registries for pluggable components.
//!
//! A registry maps an `algorithm` / `transform` key from configuration to a
//! constructor closure `Fn(&Kwargs) -> Box<dyn ...>`. Resolution happens
//! before any data flows; an unregistered key is
//! [`ExecutionError::UnknownComponent`].
//!
//! Tests and embedders can inject an already-constructed component through
//! [`ComponentRegistry::register`] (closures may capture anything) or the
//! prototype-cloning wrappers `register_instance`.

use std::collections::BTreeMap;

use crate::components::estimators::{KnnEstimator, MajorityClassEstimator};
use crate::components::identity::Identity;
use crate::components::reducers::MeanReducer;
use crate::components::scaling::{MinMaxScaler, StandardScaler};
use crate::components::{Estimator, Transform};
use crate::error::ExecutionError;

/// Free-form constructor kwargs, as parsed from configuration.
pub type Kwargs = serde_json::Map<String, serde_json::Value>;

type Constructor<T> = Box<dyn Fn(&Kwargs) -> Result<Box<T>, ExecutionError>>;

/// Mapping from algorithm name to component constructor.
pub struct ComponentRegistry<T: ?Sized> {
    kind: &'static str,
    constructors: BTreeMap<String, Constructor<T>>,
}

/// Registry of [`Transform`] constructors (transforms, reducers, scalers).
pub type TransformRegistry = ComponentRegistry<dyn Transform>;
/// Registry of [`Estimator`] constructors.
pub type EstimatorRegistry = ComponentRegistry<dyn Estimator>;

impl<T: ?Sized> ComponentRegistry<T> {
    /// Create an empty registry. `kind` labels lookup errors
    /// ("transform", "reducer", "scaler", "estimator").
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            constructors: BTreeMap::new(),
        }
    }

    /// Register a constructor under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&Kwargs) -> Result<Box<T>, ExecutionError> + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
    }

    /// Construct a fresh component for `name`.
    ///
    /// # Errors
    /// [`ExecutionError::UnknownComponent`] for an unregistered name; any
    /// error from the constructor itself (typically
    /// [`ExecutionError::InvalidKwargs`]) passes through.
    pub fn resolve(&self, name: &str, kwargs: Option<&Kwargs>) -> Result<Box<T>, ExecutionError> {
        let constructor =
            self.constructors
                .get(name)
                .ok_or_else(|| ExecutionError::UnknownComponent {
                    kind: self.kind.to_string(),
                    name: name.to_string(),
                })?;
        let empty = Kwargs::new();
        constructor(kwargs.unwrap_or(&empty))
    }

    /// Whether a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl ComponentRegistry<dyn Transform> {
    /// Register a prototype instance cloned on every resolution, ignoring
    /// kwargs. The wrapper path for injecting pre-built transforms.
    pub fn register_instance<C>(&mut self, name: impl Into<String>, prototype: C)
    where
        C: Transform + Clone + 'static,
    {
        self.register(name, move |_| Ok(Box::new(prototype.clone()) as Box<dyn Transform>));
    }
}

impl ComponentRegistry<dyn Estimator> {
    /// Register a prototype instance cloned on every resolution, ignoring
    /// kwargs. The wrapper path for injecting pre-built estimators.
    pub fn register_instance<C>(&mut self, name: impl Into<String>, prototype: C)
    where
        C: Estimator + Clone + 'static,
    {
        self.register(name, move |_| Ok(Box::new(prototype.clone()) as Box<dyn Estimator>));
    }
}

/// Transform registry preloaded with the built-in transforms.
pub fn transform_defaults() -> TransformRegistry {
    let mut registry = TransformRegistry::new("transform");
    registry.register("identity", |_| Ok(Box::new(Identity) as Box<dyn Transform>));
    registry
}

/// Reducer registry preloaded with the built-in reducers.
pub fn reducer_defaults() -> TransformRegistry {
    let mut registry = TransformRegistry::new("reducer");
    registry.register("identity", |_| Ok(Box::new(Identity) as Box<dyn Transform>));
    registry.register("mean", |_| Ok(Box::new(MeanReducer) as Box<dyn Transform>));
    registry
}

/// Scaler registry preloaded with the built-in scalers.
pub fn scaler_defaults() -> TransformRegistry {
    let mut registry = TransformRegistry::new("scaler");
    registry.register("identity", |_| Ok(Box::new(Identity) as Box<dyn Transform>));
    registry.register("standard_scaler", |kwargs| {
        Ok(Box::new(StandardScaler::from_kwargs(kwargs)?) as Box<dyn Transform>)
    });
    registry.register("min_max_scaler", |kwargs| {
        Ok(Box::new(MinMaxScaler::from_kwargs(kwargs)?) as Box<dyn Transform>)
    });
    registry
}

/// Estimator registry preloaded with the built-in estimators.
pub fn estimator_defaults() -> EstimatorRegistry {
    let mut registry = EstimatorRegistry::new("estimator");
    registry.register("knn", |kwargs| {
        Ok(Box::new(KnnEstimator::from_kwargs(kwargs)?) as Box<dyn Estimator>)
    });
    registry.register("majority", |_| {
        Ok(Box::new(MajorityClassEstimator::new()) as Box<dyn Estimator>)
    });
    registry
}

/// The four registries one experiment run resolves against.
pub struct ComponentSet {
    pub transforms: TransformRegistry,
    pub reducers: TransformRegistry,
    pub scalers: TransformRegistry,
    pub estimators: EstimatorRegistry,
}

impl ComponentSet {
    /// All four registries preloaded with the built-ins.
    pub fn defaults() -> Self {
        Self {
            transforms: transform_defaults(),
            reducers: reducer_defaults(),
            scalers: scaler_defaults(),
            estimators: estimator_defaults(),
        }
    }
}

impl Default for ComponentSet {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Read an optional boolean kwarg.
pub(crate) fn kwarg_bool(
    kwargs: &Kwargs,
    component: &str,
    key: &str,
    default: bool,
) -> Result<bool, ExecutionError> {
    match kwargs.get(key) {
        None => Ok(default),
        Some(value) => value.as_bool().ok_or_else(|| ExecutionError::InvalidKwargs {
            component: component.to_string(),
            message: format!("'{}' must be a boolean, got {}", key, value),
        }),
    }
}

/// Read an optional floating-point kwarg.
pub(crate) fn kwarg_f64(
    kwargs: &Kwargs,
    component: &str,
    key: &str,
    default: f64,
) -> Result<f64, ExecutionError> {
    match kwargs.get(key) {
        None => Ok(default),
        Some(value) => value.as_f64().ok_or_else(|| ExecutionError::InvalidKwargs {
            component: component.to_string(),
            message: format!("'{}' must be a number, got {}", key, value),
        }),
    }
}

/// Read an optional positive-integer kwarg.
pub(crate) fn kwarg_usize(
    kwargs: &Kwargs,
    component: &str,
    key: &str,
    default: usize,
) -> Result<usize, ExecutionError> {
    match kwargs.get(key) {
        None => Ok(default),
        Some(value) => value
            .as_u64()
            .map(|v| v as usize)
            .ok_or_else(|| ExecutionError::InvalidKwargs {
                component: component.to_string(),
                message: format!("'{}' must be a non-negative integer, got {}", key, value),
            }),
    }
}
