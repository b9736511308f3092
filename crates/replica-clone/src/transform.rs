//! Value transforms
//!
//! A [`ValueTransform`] is what a strategy, customizer or cloning method hands
//! back to the scheduler: the clone shell plus instructions for how to finish
//! it.

use std::fmt;

use replica_value::{PropertyKey, Value};
use smallvec::SmallVec;

use crate::path::Segment;

/// Receives the finished clone of an additional value
pub type Assigner = Box<dyn FnOnce(Value) + Send>;

/// A value the scheduler must clone on the transform's behalf
pub struct AdditionalValue {
    /// The original value
    pub value: Value,
    /// Called once with its clone
    pub assigner: Assigner,
    /// Await the value (a promise) and clone its fulfilment value instead
    pub is_async: bool,
    pub(crate) segment: Option<Segment>,
}

impl AdditionalValue {
    /// Clone `value` and pass the result to `assigner`
    pub fn new<F>(value: Value, assigner: F) -> Self
    where
        F: FnOnce(Value) + Send + 'static,
    {
        Self {
            value,
            assigner: Box::new(assigner),
            is_async: false,
            segment: None,
        }
    }

    /// Await `value`, clone what it fulfils with, and pass that to `assigner`
    ///
    /// A rejection is reported and `assigner` is never called.
    pub fn awaited<F>(value: Value, assigner: F) -> Self
    where
        F: FnOnce(Value) + Send + 'static,
    {
        Self {
            is_async: true,
            ..Self::new(value, assigner)
        }
    }

    pub(crate) fn at(mut self, segment: Segment) -> Self {
        self.segment = Some(segment);
        self
    }
}

impl fmt::Debug for AdditionalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdditionalValue")
            .field("value", &self.value)
            .field("is_async", &self.is_async)
            .finish_non_exhaustive()
    }
}

/// Clone shell plus finishing instructions
#[derive(Debug, Default)]
pub struct ValueTransform {
    /// The clone (or its shell, to be filled in)
    pub clone: Value,
    /// Values to clone and hand back through assigners
    pub additional_values: Vec<AdditionalValue>,
    /// Install nothing at the destination
    pub ignore: bool,
    /// Do not copy the original's own properties
    pub ignore_props: bool,
    /// Do not link the original's prototype
    pub ignore_proto: bool,
    /// Own properties to skip
    pub ignore_keys: SmallVec<[PropertyKey; 4]>,
    /// The clone is a promise that settles later
    pub is_async: bool,
}

impl ValueTransform {
    /// A transform producing `clone`
    pub fn new(clone: impl Into<Value>) -> Self {
        Self {
            clone: clone.into(),
            ..Self::default()
        }
    }

    /// A transform that drops the value
    pub fn ignored() -> Self {
        Self {
            ignore: true,
            ..Self::default()
        }
    }

    /// Add a value to be cloned separately
    pub fn with_additional(mut self, value: AdditionalValue) -> Self {
        self.additional_values.push(value);
        self
    }

    /// Skip own-property copying
    pub fn skip_props(mut self) -> Self {
        self.ignore_props = true;
        self
    }

    /// Skip prototype linking
    pub fn skip_proto(mut self) -> Self {
        self.ignore_proto = true;
        self
    }

    /// Skip one own property
    pub fn skip_key(mut self, key: impl Into<PropertyKey>) -> Self {
        self.ignore_keys.push(key.into());
        self
    }

    /// Mark the clone as a promise to wait for in async mode
    pub fn deferred(mut self) -> Self {
        self.is_async = true;
        self
    }
}
