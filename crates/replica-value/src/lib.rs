//! # Replica Value Model
//!
//! The object graph the replica deep-copy engine operates on.
//!
//! ## Design Principles
//!
//! - **Thread-safe**: Values are `Send + Sync`; promise sources may settle on any thread
//! - **Reference identity**: Objects are shared through [`ObjectRef`], compared by address
//! - **Explicit descriptors**: Every own property carries a [`PropertyDescriptor`]
//! - **Closed kinds**: Internal slots live in [`ObjectKind`], host kinds plug in via [`HostObject`]

#![warn(clippy::all)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod array_buffer;
pub mod data_view;
pub mod error;
pub mod function;
pub mod host;
pub mod map_data;
pub mod object;
pub mod promise;
pub mod regexp;
pub mod symbol;
pub mod typed_array;
pub mod value;

pub use array_buffer::JsArrayBuffer;
pub use data_view::JsDataView;
pub use error::{ErrorKind, ValueError, ValueResult};
pub use function::{JsFunction, NativeFn};
pub use host::{HostObject, HostTag};
pub use map_data::{MapData, MapKey, SetData};
pub use object::{
    JsObject, ObjectKind, ObjectRef, PropertyAttributes, PropertyDescriptor, PropertyKey,
};
pub use promise::{JsPromise, PromiseState, SettledFuture, Settlement};
pub use regexp::JsRegExp;
pub use symbol::Symbol;
pub use typed_array::{JsTypedArray, TypedArrayKind};
pub use value::Value;
