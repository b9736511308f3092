//! Customizers
//!
//! A customizer sees every value before the built-in strategies and may claim
//! it by returning a transform. Returning `Ok(None)` passes the value on.

use std::fmt;
use std::sync::Arc;

use replica_value::Value;

use crate::error::BoxError;
use crate::transform::ValueTransform;

/// What a customizer returns
pub type CustomizerResult = Result<Option<ValueTransform>, BoxError>;

/// A user-supplied cloning hook
#[derive(Clone)]
pub struct Customizer(Arc<dyn Fn(&Value) -> CustomizerResult + Send + Sync>);

impl Customizer {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> CustomizerResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Consult the customizer
    pub fn call(&self, value: &Value) -> CustomizerResult {
        (self.0)(value)
    }
}

impl fmt::Debug for Customizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Customizer(..)")
    }
}

/// Compose customizers; the first to return a transform wins
///
/// An error from any member ends the consultation and is handled like an
/// error from a single customizer.
pub fn use_customizer(customizers: impl IntoIterator<Item = Customizer>) -> Customizer {
    let chain: Vec<Customizer> = customizers.into_iter().collect();
    Customizer::new(move |value| {
        for customizer in &chain {
            if let Some(transform) = customizer.call(value)? {
                return Ok(Some(transform));
            }
        }
        Ok(None)
    })
}
