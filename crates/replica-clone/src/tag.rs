//! Type resolution
//!
//! Every value maps to exactly one [`Tag`], which selects its cloning
//! strategy. The primary source is the object's internal slot. In
//! [`ResolveMode::Fast`] an own `Symbol.toStringTag` data property naming a
//! known kind is taken at its word; the prototype chain is not consulted. The
//! strategy then checks the claim against the slot and reports a brand
//! mismatch instead of cloning garbage. A claim from the same family as the
//! slot (any error kind for an error, any element kind for a typed array) is
//! accepted and the slot decides.

use std::fmt;

use replica_value::{
    ErrorKind, HostTag, ObjectKind, ObjectRef, PropertyDescriptor, PropertyKey, Symbol,
    TypedArrayKind, Value,
};

/// Closed set of value kinds the engine distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// Boolean primitive
    Boolean,
    /// Number primitive
    Number,
    /// String primitive
    String,
    /// BigInt primitive
    BigInt,
    /// Symbol primitive
    Symbol,
    /// `new Boolean(..)`
    BooleanObject,
    /// `new Number(..)`
    NumberObject,
    /// `new String(..)`
    StringObject,
    /// `Object(1n)`
    BigIntObject,
    /// `Object(Symbol())`
    SymbolObject,
    /// Plain object
    Object,
    /// Array
    Array,
    /// Function
    Function,
    /// Map
    Map,
    /// Set
    Set,
    /// Date
    Date,
    /// RegExp
    RegExp,
    /// Error of the given kind
    Error(ErrorKind),
    /// ArrayBuffer
    ArrayBuffer,
    /// DataView
    DataView,
    /// Typed array of the given element kind
    TypedArray(TypedArrayKind),
    /// Promise
    Promise,
    /// WeakRef
    WeakRef,
    /// WeakMap
    WeakMap,
    /// WeakSet
    WeakSet,
    /// Recognized host kind
    Host(HostTag),
    /// Anything else
    Opaque,
}

impl Tag {
    /// Kind name, as `Object.prototype.toString` would show it
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Undefined => "Undefined",
            Tag::Null => "Null",
            Tag::Boolean | Tag::BooleanObject => "Boolean",
            Tag::Number | Tag::NumberObject => "Number",
            Tag::String | Tag::StringObject => "String",
            Tag::BigInt | Tag::BigIntObject => "BigInt",
            Tag::Symbol | Tag::SymbolObject => "Symbol",
            Tag::Object => "Object",
            Tag::Array => "Array",
            Tag::Function => "Function",
            Tag::Map => "Map",
            Tag::Set => "Set",
            Tag::Date => "Date",
            Tag::RegExp => "RegExp",
            Tag::Error(kind) => kind.name(),
            Tag::ArrayBuffer => "ArrayBuffer",
            Tag::DataView => "DataView",
            Tag::TypedArray(kind) => kind.name(),
            Tag::Promise => "Promise",
            Tag::WeakRef => "WeakRef",
            Tag::WeakMap => "WeakMap",
            Tag::WeakSet => "WeakSet",
            Tag::Host(host) => host.name(),
            Tag::Opaque => "Opaque",
        }
    }

    /// Check if this tags a primitive
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Tag::Undefined
                | Tag::Null
                | Tag::Boolean
                | Tag::Number
                | Tag::String
                | Tag::BigInt
                | Tag::Symbol
        )
    }

    /// Object tag for a self-reported kind name
    ///
    /// Wrapper names map to the wrapper tags since only objects carry claims.
    pub fn from_claim(name: &str) -> Option<Tag> {
        let tag = match name {
            "Object" => Tag::Object,
            "Array" => Tag::Array,
            "Function" => Tag::Function,
            "Boolean" => Tag::BooleanObject,
            "Number" => Tag::NumberObject,
            "String" => Tag::StringObject,
            "BigInt" => Tag::BigIntObject,
            "Symbol" => Tag::SymbolObject,
            "Map" => Tag::Map,
            "Set" => Tag::Set,
            "Date" => Tag::Date,
            "RegExp" => Tag::RegExp,
            "ArrayBuffer" => Tag::ArrayBuffer,
            "DataView" => Tag::DataView,
            "Promise" => Tag::Promise,
            "WeakRef" => Tag::WeakRef,
            "WeakMap" => Tag::WeakMap,
            "WeakSet" => Tag::WeakSet,
            other => {
                if let Some(kind) = ErrorKind::from_name(other) {
                    Tag::Error(kind)
                } else if let Some(kind) = TypedArrayKind::from_name(other) {
                    Tag::TypedArray(kind)
                } else {
                    Tag::Host(HostTag::from_name(other)?)
                }
            }
        };
        Some(tag)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How much an object's self-description is trusted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolveMode {
    /// Brand checks only; `Symbol.toStringTag` is ignored
    #[default]
    Robust,
    /// An own `Symbol.toStringTag` claim naming a known kind wins
    Fast,
}

/// Resolve a value's tag
pub fn resolve(value: &Value, mode: ResolveMode) -> Tag {
    match value {
        Value::Undefined => Tag::Undefined,
        Value::Null => Tag::Null,
        Value::Boolean(_) => Tag::Boolean,
        Value::Number(_) => Tag::Number,
        Value::String(_) => Tag::String,
        Value::BigInt(_) => Tag::BigInt,
        Value::Symbol(_) => Tag::Symbol,
        Value::Object(obj) => match mode {
            ResolveMode::Fast => claimed(obj).unwrap_or_else(|| brand(obj)),
            ResolveMode::Robust => brand(obj),
        },
    }
}

/// Tag from the internal slot
pub fn brand(obj: &ObjectRef) -> Tag {
    match obj.kind() {
        ObjectKind::Ordinary => Tag::Object,
        ObjectKind::Array(_) => Tag::Array,
        ObjectKind::Function(_) => Tag::Function,
        ObjectKind::BooleanObject(_) => Tag::BooleanObject,
        ObjectKind::NumberObject(_) => Tag::NumberObject,
        ObjectKind::StringObject(_) => Tag::StringObject,
        ObjectKind::BigIntObject(_) => Tag::BigIntObject,
        ObjectKind::SymbolObject(_) => Tag::SymbolObject,
        ObjectKind::Date(_) => Tag::Date,
        ObjectKind::RegExp(_) => Tag::RegExp,
        ObjectKind::Error(kind) => Tag::Error(*kind),
        ObjectKind::Map(_) => Tag::Map,
        ObjectKind::Set(_) => Tag::Set,
        ObjectKind::ArrayBuffer(_) => Tag::ArrayBuffer,
        ObjectKind::DataView(_) => Tag::DataView,
        ObjectKind::TypedArray(ta) => Tag::TypedArray(ta.kind()),
        ObjectKind::Promise(_) => Tag::Promise,
        ObjectKind::WeakRef(_) => Tag::WeakRef,
        ObjectKind::WeakMap => Tag::WeakMap,
        ObjectKind::WeakSet => Tag::WeakSet,
        ObjectKind::Host(host) => match host.host_tag() {
            HostTag::Other(_) => Tag::Opaque,
            known => Tag::Host(known),
        },
    }
}

/// An own `Symbol.toStringTag` data property naming a known kind
fn claimed(obj: &ObjectRef) -> Option<Tag> {
    let key = PropertyKey::symbol(Symbol::to_string_tag());
    match obj.get_own_property(&key)? {
        PropertyDescriptor::Data {
            value: Value::String(name),
            ..
        } => Tag::from_claim(&name),
        _ => None,
    }
}

/// Check whether the internal slot backs up a tag
///
/// Error and typed array claims only need to agree on the family.
pub(crate) fn slot_matches(tag: Tag, obj: &ObjectRef) -> bool {
    match (tag, brand(obj)) {
        (Tag::Error(_), Tag::Error(_)) => true,
        (Tag::TypedArray(_), Tag::TypedArray(_)) => true,
        (claim, actual) => claim == actual,
    }
}
