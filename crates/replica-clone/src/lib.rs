//! # Replica
//!
//! Iterative deep copy for [`replica_value`] graphs.
//!
//! - **No recursion**: a work queue drives the traversal, so depth is unbounded
//! - **Identity preserving**: cycles and shared references come out the same shape
//! - **Descriptor faithful**: attributes, accessors, symbol keys and prototypes survive
//! - **Degrades, never aborts**: kinds that cannot be copied become `{}` and are reported
//! - **Async aware**: promise clones settle like their sources; async mode waits for all of them
//!
//! ```ignore
//! use replica_clone::{CloneOptions, clone_deep};
//! use replica_value::{JsObject, PropertyKey, Value};
//!
//! let obj = JsObject::ordinary(None);
//! obj.set(PropertyKey::string("self"), Value::object(obj.clone()));
//!
//! let copy = clone_deep(&Value::object(obj.clone()), CloneOptions::default())?;
//! let copy = copy.as_object().unwrap();
//! assert_eq!(copy.get(&PropertyKey::string("self")), Value::object(copy.clone()));
//! ```

#![warn(clippy::all)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod customizer;
pub mod error;
mod identity;
pub mod options;
pub mod path;
mod properties;
mod queue;
mod report;
mod scheduler;
mod settlement;
mod strategy;
pub mod tag;
pub mod transform;

pub use customizer::{Customizer, CustomizerResult, use_customizer};
pub use error::{BoxError, CloneError, CloneResult};
pub use options::{CloneOptions, FullCloneOptions, LogMode, LogSink};
pub use path::{ClonePath, Segment};
pub use tag::{ResolveMode, Tag, resolve};
pub use transform::{AdditionalValue, Assigner, ValueTransform};

use replica_value::{JsPromise, SettledFuture, Value};

use crate::scheduler::Engine;

/// Deep-copy `value`
///
/// With [`CloneOptions::async_mode`] the result is a promise object that
/// fulfils with the copy once every promise inside it has settled.
pub fn clone_deep(value: &Value, options: CloneOptions) -> CloneResult<Value> {
    Engine::run(value, options, None)
}

/// Deep-copy `value` in async mode and await the result
pub fn clone_deep_async(value: &Value, options: CloneOptions) -> CloneResult<SettledFuture> {
    let outer = clone_deep(value, options.async_mode(true))?;
    Ok(match outer.as_promise() {
        Some(promise) => promise.settled(),
        None => JsPromise::resolved(outer).settled(),
    })
}

/// Deep-copy `value` and its prototype chains
///
/// Walks each object's prototype chain, cloning prototypes until one that
/// carries methods (other than `constructor`); from there the clone links to
/// the original prototype. With `force` the whole chain is cloned, with
/// methods shared by reference.
pub fn clone_deep_fully(value: &Value, options: FullCloneOptions) -> CloneResult<Value> {
    let FullCloneOptions { options, force } = options;
    Engine::run(value, options, Some(force))
}
