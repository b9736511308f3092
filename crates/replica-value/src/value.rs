//! Dynamic values
//!
//! Primitives are stored inline (strings and bigints behind an `Arc`, so
//! copying a value never copies their payload). Everything else is an
//! [`ObjectRef`] into the shared object graph.

use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;

use crate::object::{JsObject, ObjectKind, ObjectRef, PropertyKey};
use crate::promise::JsPromise;
use crate::symbol::Symbol;

/// A dynamically typed value
///
/// This type is `Send + Sync` because all heap-allocated data is behind `Arc`.
#[derive(Clone, Default)]
pub enum Value {
    /// `undefined`
    #[default]
    Undefined,
    /// `null`
    Null,
    /// Boolean primitive
    Boolean(bool),
    /// Number primitive (IEEE 754 double)
    Number(f64),
    /// String primitive (immutable, shared)
    String(Arc<str>),
    /// Arbitrary precision integer primitive
    BigInt(Arc<BigInt>),
    /// Symbol primitive (compared by identity)
    Symbol(Arc<Symbol>),
    /// Reference to a heap object
    Object(ObjectRef),
}

impl Value {
    /// Create undefined value
    #[inline]
    pub const fn undefined() -> Self {
        Self::Undefined
    }

    /// Create null value
    #[inline]
    pub const fn null() -> Self {
        Self::Null
    }

    /// Create boolean value
    #[inline]
    pub const fn boolean(b: bool) -> Self {
        Self::Boolean(b)
    }

    /// Create number value
    #[inline]
    pub const fn number(n: f64) -> Self {
        Self::Number(n)
    }

    /// Create 32-bit integer value (stored as a number)
    #[inline]
    pub fn int32(n: i32) -> Self {
        Self::Number(f64::from(n))
    }

    /// Create string value
    pub fn string(s: impl AsRef<str>) -> Self {
        Self::String(Arc::from(s.as_ref()))
    }

    /// Create bigint value
    pub fn bigint(n: impl Into<BigInt>) -> Self {
        Self::BigInt(Arc::new(n.into()))
    }

    /// Create symbol value
    pub fn symbol(sym: Arc<Symbol>) -> Self {
        Self::Symbol(sym)
    }

    /// Create object value
    pub fn object(obj: ObjectRef) -> Self {
        Self::Object(obj)
    }

    /// Check if undefined
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Check if null
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if null or undefined
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// Check if this is a primitive (anything but an object)
    #[inline]
    pub fn is_primitive(&self) -> bool {
        !self.is_object()
    }

    /// Check if this is an object reference
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Check if this is a callable object
    pub fn is_callable(&self) -> bool {
        self.as_object().is_some_and(|o| o.is_callable())
    }

    /// Get as boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as bigint
    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Self::BigInt(n) => Some(n),
            _ => None,
        }
    }

    /// Get as symbol
    pub fn as_symbol(&self) -> Option<&Arc<Symbol>> {
        match self {
            Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Get as object reference
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get the promise slot if this is a promise object
    pub fn as_promise(&self) -> Option<&Arc<JsPromise>> {
        match self.as_object()?.kind() {
            ObjectKind::Promise(p) => Some(p),
            _ => None,
        }
    }

    /// Read a property (prototype chain included); primitives read as undefined
    pub fn get(&self, key: impl Into<PropertyKey>) -> Value {
        match self {
            Self::Object(o) => o.get(&key.into()),
            _ => Value::Undefined,
        }
    }

    /// `typeof`-style type name
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "object",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::BigInt(_) => "bigint",
            Self::Symbol(_) => "symbol",
            Self::Object(o) if o.is_callable() => "function",
            Self::Object(_) => "object",
        }
    }

    /// SameValue comparison (`Object.is`)
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                (a.is_nan() && b.is_nan())
                    || (a == b && a.is_sign_negative() == b.is_sign_negative())
            }
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a.id() == b.id(),
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::BigInt(n) => write!(f, "{n}n"),
            Self::Symbol(s) => write!(f, "{s:?}"),
            Self::Object(o) => write!(f, "{:?}", &**o),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::int32(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Self::Object(o)
    }
}

impl From<JsObject> for Value {
    fn from(o: JsObject) -> Self {
        Self::Object(ObjectRef::new(o))
    }
}
