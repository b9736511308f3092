//! Objects, property keys and property descriptors
//!
//! An object is an ordered own-property table, a prototype link, an
//! extensibility flag and an internal slot ([`ObjectKind`]) recording what the
//! object natively is. Objects are shared through [`ObjectRef`], whose equality
//! is reference identity.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use num_bigint::BigInt;
use parking_lot::{Mutex, RwLock};

use crate::array_buffer::JsArrayBuffer;
use crate::data_view::JsDataView;
use crate::error::{ErrorKind, ValueError, ValueResult};
use crate::function::{JsFunction, NativeFn};
use crate::host::HostObject;
use crate::map_data::{MapData, SetData};
use crate::promise::JsPromise;
use crate::regexp::JsRegExp;
use crate::symbol::Symbol;
use crate::typed_array::{JsTypedArray, TypedArrayKind};
use crate::value::Value;

/// Property key (string, symbol or array index)
#[derive(Clone)]
pub enum PropertyKey {
    /// String property key
    String(Arc<str>),
    /// Symbol property key
    Symbol(Arc<Symbol>),
    /// Integer index (canonical numeric string)
    Index(u32),
}

impl PropertyKey {
    /// Create a string property key; canonical array indices become [`PropertyKey::Index`]
    pub fn string(s: &str) -> Self {
        match s.parse::<u32>() {
            Ok(i) if i != u32::MAX && i.to_string() == s => Self::Index(i),
            _ => Self::String(Arc::from(s)),
        }
    }

    /// Create a symbol property key
    pub fn symbol(sym: Arc<Symbol>) -> Self {
        Self::Symbol(sym)
    }

    /// Create an index property key
    pub fn index(i: u32) -> Self {
        Self::Index(i)
    }

    /// Check if this is a symbol key
    pub fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }

    /// Convert a value to a key (strings, integral numbers, symbols)
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::string(s)),
            Value::Symbol(sym) => Some(Self::Symbol(sym.clone())),
            Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n < f64::from(u32::MAX) => {
                Some(Self::Index(*n as u32))
            }
            _ => None,
        }
    }

    /// The key as a value (indices become strings)
    pub fn to_value(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Symbol(sym) => Value::Symbol(sym.clone()),
            Self::Index(i) => Value::string(i.to_string()),
        }
    }
}

impl PartialEq for PropertyKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a.id() == b.id(),
            (Self::Index(a), Self::Index(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PropertyKey {}

impl Hash for PropertyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::String(s) => s.hash(state),
            Self::Symbol(sym) => sym.id().hash(state),
            Self::Index(i) => i.hash(state),
        }
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Symbol(sym) => write!(f, "[{sym:?}]"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        Self::Index(i)
    }
}

impl From<Arc<Symbol>> for PropertyKey {
    fn from(sym: Arc<Symbol>) -> Self {
        Self::Symbol(sym)
    }
}

impl From<&PropertyKey> for PropertyKey {
    fn from(key: &PropertyKey) -> Self {
        key.clone()
    }
}

/// Property attributes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropertyAttributes {
    /// Property is writable (ignored for accessors)
    pub writable: bool,
    /// Property is enumerable
    pub enumerable: bool,
    /// Property is configurable
    pub configurable: bool,
}

impl PropertyAttributes {
    /// Default data property attributes
    pub const fn data() -> Self {
        Self {
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Writable and configurable but not enumerable (built-in slots like `message`)
    pub const fn hidden() -> Self {
        Self {
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    /// Non-writable, non-enumerable, non-configurable
    pub const fn frozen() -> Self {
        Self {
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }
}

/// Property descriptor
#[derive(Clone, Debug)]
pub enum PropertyDescriptor {
    /// Data property
    Data {
        /// The value
        value: Value,
        /// Attributes
        attributes: PropertyAttributes,
    },
    /// Accessor property
    Accessor {
        /// Getter function
        get: Option<Value>,
        /// Setter function
        set: Option<Value>,
        /// Attributes (`writable` is unused)
        attributes: PropertyAttributes,
    },
}

impl PropertyDescriptor {
    /// Create a data property
    pub fn data(value: Value) -> Self {
        Self::Data {
            value,
            attributes: PropertyAttributes::data(),
        }
    }

    /// Create a data property with specific attributes
    pub fn data_with_attrs(value: Value, attributes: PropertyAttributes) -> Self {
        Self::Data { value, attributes }
    }

    /// Create an accessor property
    pub fn accessor(
        get: Option<Value>,
        set: Option<Value>,
        attributes: PropertyAttributes,
    ) -> Self {
        Self::Accessor {
            get,
            set,
            attributes,
        }
    }

    /// Get the value (for data properties)
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Data { value, .. } => Some(value),
            Self::Accessor { .. } => None,
        }
    }

    /// Attributes of either variant
    pub fn attributes(&self) -> PropertyAttributes {
        match self {
            Self::Data { attributes, .. } | Self::Accessor { attributes, .. } => *attributes,
        }
    }

    /// Check if this is an accessor property
    pub fn is_accessor(&self) -> bool {
        matches!(self, Self::Accessor { .. })
    }

    /// Check if writable
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Data { attributes, .. } => attributes.writable,
            Self::Accessor { .. } => false,
        }
    }

    /// Check if enumerable
    pub fn is_enumerable(&self) -> bool {
        self.attributes().enumerable
    }

    /// Check if configurable
    pub fn is_configurable(&self) -> bool {
        self.attributes().configurable
    }
}

/// Internal slot: what an object natively is
pub enum ObjectKind {
    /// Plain object (any prototype)
    Ordinary,
    /// Array with its `length`
    Array(AtomicU32),
    /// Callable
    Function(JsFunction),
    /// `Boolean` wrapper
    BooleanObject(bool),
    /// `Number` wrapper
    NumberObject(f64),
    /// `String` wrapper
    StringObject(Arc<str>),
    /// `BigInt` wrapper
    BigIntObject(Arc<BigInt>),
    /// `Symbol` wrapper
    SymbolObject(Arc<Symbol>),
    /// `Date` with its time value in milliseconds since the epoch
    Date(Mutex<f64>),
    /// `RegExp`
    RegExp(JsRegExp),
    /// `Error` and its subtypes
    Error(ErrorKind),
    /// `Map`
    Map(MapData),
    /// `Set`
    Set(SetData),
    /// `ArrayBuffer`
    ArrayBuffer(JsArrayBuffer),
    /// `DataView`
    DataView(JsDataView),
    /// Typed array (`Uint8Array`, `Float64Array`, ...)
    TypedArray(JsTypedArray),
    /// `Promise`
    Promise(Arc<JsPromise>),
    /// `WeakRef`
    WeakRef(Weak<JsObject>),
    /// `WeakMap` (entries are not observable)
    WeakMap,
    /// `WeakSet` (entries are not observable)
    WeakSet,
    /// Externally supplied host kind
    Host(Arc<dyn HostObject>),
}

impl ObjectKind {
    /// Brand name of the slot
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Ordinary => "Object",
            ObjectKind::Array(_) => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::BooleanObject(_) => "Boolean",
            ObjectKind::NumberObject(_) => "Number",
            ObjectKind::StringObject(_) => "String",
            ObjectKind::BigIntObject(_) => "BigInt",
            ObjectKind::SymbolObject(_) => "Symbol",
            ObjectKind::Date(_) => "Date",
            ObjectKind::RegExp(_) => "RegExp",
            ObjectKind::Error(kind) => kind.name(),
            ObjectKind::Map(_) => "Map",
            ObjectKind::Set(_) => "Set",
            ObjectKind::ArrayBuffer(_) => "ArrayBuffer",
            ObjectKind::DataView(_) => "DataView",
            ObjectKind::TypedArray(ta) => ta.kind().name(),
            ObjectKind::Promise(_) => "Promise",
            ObjectKind::WeakRef(_) => "WeakRef",
            ObjectKind::WeakMap => "WeakMap",
            ObjectKind::WeakSet => "WeakSet",
            ObjectKind::Host(host) => host.host_tag().name(),
        }
    }
}

impl fmt::Debug for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A heap object
///
/// Thread-safe with interior mutability.
pub struct JsObject {
    /// Own properties in insertion order
    properties: RwLock<IndexMap<PropertyKey, PropertyDescriptor>>,
    /// Prototype (None for a null prototype)
    prototype: RwLock<Option<ObjectRef>>,
    /// Is extensible
    extensible: AtomicBool,
    /// Internal slot
    kind: ObjectKind,
}

impl JsObject {
    /// Create an object with the given internal slot
    pub fn new(kind: ObjectKind, prototype: Option<ObjectRef>) -> Self {
        Self {
            properties: RwLock::new(IndexMap::new()),
            prototype: RwLock::new(prototype),
            extensible: AtomicBool::new(true),
            kind,
        }
    }

    /// Create a shared object with the given internal slot
    pub fn with_kind(kind: ObjectKind, prototype: Option<ObjectRef>) -> ObjectRef {
        ObjectRef::new(Self::new(kind, prototype))
    }

    /// Create a plain object
    pub fn ordinary(prototype: Option<ObjectRef>) -> ObjectRef {
        Self::with_kind(ObjectKind::Ordinary, prototype)
    }

    /// Create an array of `length` holes
    pub fn array(length: u32) -> ObjectRef {
        Self::with_kind(ObjectKind::Array(AtomicU32::new(length)), None)
    }

    /// Create a dense array from values
    pub fn array_from(values: impl IntoIterator<Item = Value>) -> ObjectRef {
        let arr = Self::array(0);
        for (i, value) in values.into_iter().enumerate() {
            arr.define_property(PropertyKey::Index(i as u32), PropertyDescriptor::data(value));
        }
        arr
    }

    /// Create a function object
    pub fn function(name: &str, body: Option<NativeFn>) -> ObjectRef {
        Self::with_kind(ObjectKind::Function(JsFunction::new(name, body)), None)
    }

    /// Create a function object from a closure
    pub fn native_function<F>(name: &str, f: F) -> ObjectRef
    where
        F: Fn(&Value, &[Value]) -> Result<Value, Value> + Send + Sync + 'static,
    {
        Self::function(name, Some(Arc::new(f)))
    }

    /// Create an empty `Map`
    pub fn map() -> ObjectRef {
        Self::with_kind(ObjectKind::Map(MapData::new()), None)
    }

    /// Create an empty `Set`
    pub fn set() -> ObjectRef {
        Self::with_kind(ObjectKind::Set(SetData::new()), None)
    }

    /// Create a `Date` from milliseconds since the epoch
    pub fn date(time: f64) -> ObjectRef {
        Self::with_kind(ObjectKind::Date(Mutex::new(time)), None)
    }

    /// Create a `RegExp`
    pub fn regexp(source: &str, flags: &str) -> ValueResult<ObjectRef> {
        Ok(Self::with_kind(
            ObjectKind::RegExp(JsRegExp::new(source, flags)?),
            None,
        ))
    }

    /// Create an error object with own `message` and `stack`
    pub fn error(kind: ErrorKind, message: &str) -> ObjectRef {
        let err = Self::with_kind(ObjectKind::Error(kind), None);
        err.define_property(
            PropertyKey::string("message"),
            PropertyDescriptor::data_with_attrs(
                Value::string(message),
                PropertyAttributes::hidden(),
            ),
        );
        err.define_property(
            PropertyKey::string("stack"),
            PropertyDescriptor::data_with_attrs(
                Value::string(format!("{}: {message}\n    at <anonymous>", kind.name())),
                PropertyAttributes::hidden(),
            ),
        );
        err
    }

    /// Create an `ArrayBuffer` owning `bytes`
    pub fn array_buffer(bytes: Vec<u8>) -> ObjectRef {
        Self::with_kind(ObjectKind::ArrayBuffer(JsArrayBuffer::from_bytes(bytes)), None)
    }

    /// Create a typed array view over an `ArrayBuffer` object
    pub fn typed_array(
        kind: TypedArrayKind,
        buffer: ObjectRef,
        byte_offset: usize,
        length: usize,
    ) -> ValueResult<ObjectRef> {
        let view = JsTypedArray::new(buffer, kind, byte_offset, length)?;
        Ok(Self::with_kind(ObjectKind::TypedArray(view), None))
    }

    /// Create a `DataView` over an `ArrayBuffer` object
    pub fn data_view(
        buffer: ObjectRef,
        byte_offset: usize,
        byte_length: Option<usize>,
    ) -> ValueResult<ObjectRef> {
        let view = JsDataView::new(buffer, byte_offset, byte_length)?;
        Ok(Self::with_kind(ObjectKind::DataView(view), None))
    }

    /// Wrap a promise slot in an object
    pub fn promise(promise: Arc<JsPromise>) -> ObjectRef {
        Self::with_kind(ObjectKind::Promise(promise), None)
    }

    /// Create a primitive wrapper object (`new Number(1)` etc.); `None` for non-wrappable values
    pub fn wrapper(primitive: &Value) -> Option<ObjectRef> {
        let kind = match primitive {
            Value::Boolean(b) => ObjectKind::BooleanObject(*b),
            Value::Number(n) => ObjectKind::NumberObject(*n),
            Value::String(s) => ObjectKind::StringObject(s.clone()),
            Value::BigInt(n) => ObjectKind::BigIntObject(n.clone()),
            Value::Symbol(sym) => ObjectKind::SymbolObject(sym.clone()),
            _ => return None,
        };
        Some(Self::with_kind(kind, None))
    }

    /// Create a `WeakRef` to `target`
    pub fn weak_ref(target: &ObjectRef) -> ObjectRef {
        Self::with_kind(ObjectKind::WeakRef(Arc::downgrade(&target.0)), None)
    }

    /// Create a host object
    pub fn host(host: Arc<dyn HostObject>) -> ObjectRef {
        Self::with_kind(ObjectKind::Host(host), None)
    }

    /// Internal slot
    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// Check if callable
    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    /// Check if this is an array
    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array(_))
    }

    /// Function slot
    pub fn as_function(&self) -> Option<&JsFunction> {
        match &self.kind {
            ObjectKind::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Map slot
    pub fn as_map(&self) -> Option<&MapData> {
        match &self.kind {
            ObjectKind::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Set slot
    pub fn as_set(&self) -> Option<&SetData> {
        match &self.kind {
            ObjectKind::Set(s) => Some(s),
            _ => None,
        }
    }

    /// ArrayBuffer slot
    pub fn as_array_buffer(&self) -> Option<&JsArrayBuffer> {
        match &self.kind {
            ObjectKind::ArrayBuffer(b) => Some(b),
            _ => None,
        }
    }

    /// Typed array slot
    pub fn as_typed_array(&self) -> Option<&JsTypedArray> {
        match &self.kind {
            ObjectKind::TypedArray(ta) => Some(ta),
            _ => None,
        }
    }

    /// DataView slot
    pub fn as_data_view(&self) -> Option<&JsDataView> {
        match &self.kind {
            ObjectKind::DataView(dv) => Some(dv),
            _ => None,
        }
    }

    /// RegExp slot
    pub fn as_regexp(&self) -> Option<&JsRegExp> {
        match &self.kind {
            ObjectKind::RegExp(r) => Some(r),
            _ => None,
        }
    }

    /// Promise slot
    pub fn as_promise(&self) -> Option<&Arc<JsPromise>> {
        match &self.kind {
            ObjectKind::Promise(p) => Some(p),
            _ => None,
        }
    }

    /// Host slot
    pub fn as_host(&self) -> Option<&Arc<dyn HostObject>> {
        match &self.kind {
            ObjectKind::Host(h) => Some(h),
            _ => None,
        }
    }

    /// Error kind, for error objects
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.kind {
            ObjectKind::Error(kind) => Some(kind),
            _ => None,
        }
    }

    /// Date time value
    pub fn date_value(&self) -> Option<f64> {
        match &self.kind {
            ObjectKind::Date(t) => Some(*t.lock()),
            _ => None,
        }
    }

    /// Update a date's time value; false for non-dates
    pub fn set_date_value(&self, time: f64) -> bool {
        match &self.kind {
            ObjectKind::Date(t) => {
                *t.lock() = time;
                true
            }
            _ => false,
        }
    }

    /// ISO-8601 rendering of a date (None for non-dates and invalid times)
    pub fn date_iso_string(&self) -> Option<String> {
        let time = self.date_value()?;
        if !time.is_finite() {
            return None;
        }
        chrono::DateTime::from_timestamp_millis(time as i64)
            .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
    }

    /// Wrapped primitive of a wrapper object
    pub fn primitive_value(&self) -> Option<Value> {
        Some(match &self.kind {
            ObjectKind::BooleanObject(b) => Value::Boolean(*b),
            ObjectKind::NumberObject(n) => Value::Number(*n),
            ObjectKind::StringObject(s) => Value::String(s.clone()),
            ObjectKind::BigIntObject(n) => Value::BigInt(n.clone()),
            ObjectKind::SymbolObject(sym) => Value::Symbol(sym.clone()),
            _ => return None,
        })
    }

    /// Target of a `WeakRef`, if still alive
    pub fn weak_ref_target(&self) -> Option<ObjectRef> {
        match &self.kind {
            ObjectKind::WeakRef(w) => w.upgrade().map(ObjectRef),
            _ => None,
        }
    }

    /// Array length (0 for non-arrays)
    pub fn array_length(&self) -> u32 {
        match &self.kind {
            ObjectKind::Array(len) => len.load(Ordering::Acquire),
            _ => 0,
        }
    }

    fn grow_array(&self, key: &PropertyKey) {
        if let (ObjectKind::Array(len), PropertyKey::Index(i)) = (&self.kind, key) {
            len.fetch_max(i + 1, Ordering::AcqRel);
        }
    }

    /// Own property descriptor
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        self.properties.read().get(key).cloned()
    }

    /// Check if object has own property
    pub fn has_own(&self, key: &PropertyKey) -> bool {
        self.properties.read().contains_key(key)
    }

    /// Define a property with a full descriptor
    ///
    /// Fails on a non-extensible object for new keys, and on an existing
    /// non-configurable property unless only a writable value changes.
    pub fn define_property(&self, key: PropertyKey, desc: PropertyDescriptor) -> bool {
        let mut props = self.properties.write();
        match props.get_mut(&key) {
            Some(existing) if !existing.is_configurable() => {
                let PropertyDescriptor::Data {
                    value: slot,
                    attributes,
                } = existing
                else {
                    return false;
                };
                match desc {
                    PropertyDescriptor::Data {
                        value,
                        attributes: incoming,
                    } if attributes.writable
                        && incoming.enumerable == attributes.enumerable
                        && !incoming.configurable =>
                    {
                        *slot = value;
                        attributes.writable = incoming.writable;
                        true
                    }
                    _ => false,
                }
            }
            Some(existing) => {
                *existing = desc;
                true
            }
            None => {
                if !self.is_extensible() {
                    return false;
                }
                self.grow_array(&key);
                props.insert(key, desc);
                true
            }
        }
    }

    /// Delete an own property; false if it is non-configurable
    pub fn delete(&self, key: &PropertyKey) -> bool {
        let mut props = self.properties.write();
        match props.get(key) {
            Some(desc) if !desc.is_configurable() => false,
            Some(_) => {
                props.shift_remove(key);
                true
            }
            None => true,
        }
    }

    /// Own property keys: indices ascending, then strings, then symbols (insertion order)
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        let props = self.properties.read();
        let mut indices: Vec<u32> = props
            .keys()
            .filter_map(|k| match k {
                PropertyKey::Index(i) => Some(*i),
                _ => None,
            })
            .collect();
        indices.sort_unstable();

        let mut keys: Vec<PropertyKey> = Vec::with_capacity(props.len());
        keys.extend(indices.into_iter().map(PropertyKey::Index));
        keys.extend(
            props
                .keys()
                .filter(|k| matches!(k, PropertyKey::String(_)))
                .cloned(),
        );
        keys.extend(props.keys().filter(|k| k.is_symbol()).cloned());
        keys
    }

    /// Number of own properties
    pub fn property_count(&self) -> usize {
        self.properties.read().len()
    }

    /// Get prototype
    pub fn prototype(&self) -> Option<ObjectRef> {
        self.prototype.read().clone()
    }

    /// Replace the prototype
    pub fn set_prototype(&self, prototype: Option<ObjectRef>) {
        *self.prototype.write() = prototype;
    }

    /// Is extensible
    pub fn is_extensible(&self) -> bool {
        self.extensible.load(Ordering::Acquire)
    }

    /// `Object.preventExtensions`
    pub fn prevent_extensions(&self) {
        self.extensible.store(false, Ordering::Release);
    }

    /// `Object.freeze`
    pub fn freeze(&self) {
        for desc in self.properties.write().values_mut() {
            match desc {
                PropertyDescriptor::Data { attributes, .. } => {
                    attributes.writable = false;
                    attributes.configurable = false;
                }
                PropertyDescriptor::Accessor { attributes, .. } => {
                    attributes.configurable = false;
                }
            }
        }
        self.prevent_extensions();
    }

    /// `Object.isFrozen`
    pub fn is_frozen(&self) -> bool {
        !self.is_extensible()
            && self
                .properties
                .read()
                .values()
                .all(|d| !d.is_configurable() && !d.is_writable())
    }
}

impl Drop for JsObject {
    // Long reference chains would otherwise drop recursively, one stack frame
    // set per link. Children whose last reference we hold are unlinked here and
    // torn down from a work list instead.
    fn drop(&mut self) {
        let mut values = Vec::new();
        let mut objects = Vec::new();
        self.take_children(&mut values, &mut objects);
        loop {
            for value in values.drain(..) {
                if let Value::Object(obj) = value {
                    objects.push(obj);
                }
            }
            let Some(obj) = objects.pop() else { break };
            if let Some(mut last) = Arc::into_inner(obj.0) {
                last.take_children(&mut values, &mut objects);
            }
        }
    }
}

impl JsObject {
    fn take_children(&mut self, values: &mut Vec<Value>, objects: &mut Vec<ObjectRef>) {
        for (_, desc) in self.properties.get_mut().drain(..) {
            match desc {
                PropertyDescriptor::Data { value, .. } => values.push(value),
                PropertyDescriptor::Accessor { get, set, .. } => {
                    values.extend(get);
                    values.extend(set);
                }
            }
        }
        if let Some(proto) = self.prototype.get_mut().take() {
            objects.push(proto);
        }
        match &mut self.kind {
            ObjectKind::Map(map) => map.take_values(values),
            ObjectKind::Set(set) => set.take_values(values),
            _ => {}
        }
    }
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.kind.name());
        if let Some(iso) = self.date_iso_string() {
            s.field("time", &iso);
        }
        if self.is_array() {
            s.field("length", &self.array_length());
        }
        s.field("properties", &self.property_count()).finish()
    }
}

/// Shared reference to an object; equality and hashing are by identity
#[derive(Clone)]
pub struct ObjectRef(Arc<JsObject>);

impl ObjectRef {
    /// Share a new object
    pub fn new(obj: JsObject) -> Self {
        Self(Arc::new(obj))
    }

    /// Address used as the identity key
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Identity comparison
    pub fn ptr_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Read a property through the prototype chain; getter failures read as undefined
    pub fn get(&self, key: &PropertyKey) -> Value {
        self.try_get(key).unwrap_or_default()
    }

    /// Read a property through the prototype chain, surfacing a getter's thrown value
    pub fn try_get(&self, key: &PropertyKey) -> Result<Value, Value> {
        match self.lookup(key) {
            Some(PropertyDescriptor::Data { value, .. }) => Ok(value),
            Some(PropertyDescriptor::Accessor { get: Some(getter), .. }) => {
                call(&getter, &Value::Object(self.clone()), &[])
            }
            _ => Ok(Value::Undefined),
        }
    }

    /// Find a descriptor on this object or its prototype chain
    pub fn lookup(&self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        let mut holder = self.clone();
        loop {
            if let Some(desc) = holder.get_own_property(key) {
                return Some(desc);
            }
            holder = holder.prototype()?;
        }
    }

    /// Assign a property (`obj[key] = value`)
    ///
    /// Updates a writable own data property in place, runs an inherited or own
    /// setter, and otherwise creates an enumerable data property.
    pub fn set(&self, key: PropertyKey, value: Value) -> bool {
        match self.lookup(&key) {
            Some(PropertyDescriptor::Accessor { set: Some(setter), .. }) => {
                call(&setter, &Value::Object(self.clone()), &[value]).is_ok()
            }
            Some(PropertyDescriptor::Accessor { set: None, .. }) => false,
            Some(PropertyDescriptor::Data { attributes, .. }) if !attributes.writable => false,
            _ => match self.get_own_property(&key) {
                Some(PropertyDescriptor::Data { attributes, .. }) => self.define_property(
                    key,
                    PropertyDescriptor::data_with_attrs(value, attributes),
                ),
                _ => self.define_property(key, PropertyDescriptor::data(value)),
            },
        }
    }

    /// Weak handle
    pub fn downgrade(&self) -> Weak<JsObject> {
        Arc::downgrade(&self.0)
    }
}

fn call(function: &Value, this: &Value, args: &[Value]) -> Result<Value, Value> {
    match function.as_object().and_then(|f| f.as_function()) {
        Some(f) => f.call(this, args),
        None => Err(Value::Object(JsObject::error(
            ErrorKind::TypeError,
            "accessor is not a function",
        ))),
    }
}

impl Deref for ObjectRef {
    type Target = JsObject;

    fn deref(&self) -> &JsObject {
        &self.0
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl From<ValueError> for Value {
    fn from(err: ValueError) -> Self {
        let kind = match err {
            ValueError::Range(_) => ErrorKind::RangeError,
            ValueError::InvalidFlags(_) => ErrorKind::SyntaxError,
            ValueError::NotABuffer(_) | ValueError::Detached => ErrorKind::TypeError,
        };
        Value::Object(JsObject::error(kind, &err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_get_set() {
        let obj = JsObject::ordinary(None);

        obj.set(PropertyKey::string("foo"), Value::int32(42));
        assert_eq!(obj.get(&PropertyKey::string("foo")), Value::int32(42));
    }

    #[test]
    fn test_numeric_strings_are_indices() {
        assert_eq!(PropertyKey::string("7"), PropertyKey::Index(7));
        assert!(matches!(PropertyKey::string("07"), PropertyKey::String(_)));
        assert!(matches!(PropertyKey::string("-1"), PropertyKey::String(_)));
    }

    #[test]
    fn test_own_keys_order() {
        let sym = Symbol::new(Some("s"));
        let obj = JsObject::ordinary(None);
        obj.set(PropertyKey::string("b"), Value::Null);
        obj.set(PropertyKey::symbol(sym.clone()), Value::Null);
        obj.set(PropertyKey::string("2"), Value::Null);
        obj.set(PropertyKey::string("a"), Value::Null);
        obj.set(PropertyKey::string("0"), Value::Null);

        let keys = obj.own_keys();
        assert_eq!(
            keys,
            vec![
                PropertyKey::Index(0),
                PropertyKey::Index(2),
                PropertyKey::string("b"),
                PropertyKey::string("a"),
                PropertyKey::symbol(sym),
            ]
        );
    }

    #[test]
    fn test_prototype_lookup() {
        let proto = JsObject::ordinary(None);
        proto.set(PropertyKey::string("inherited"), Value::boolean(true));
        let obj = JsObject::ordinary(Some(proto));

        assert_eq!(obj.get(&PropertyKey::string("inherited")), Value::boolean(true));
        assert!(!obj.has_own(&PropertyKey::string("inherited")));
    }

    #[test]
    fn test_non_writable_rejects_set() {
        let obj = JsObject::ordinary(None);
        obj.define_property(
            PropertyKey::string("x"),
            PropertyDescriptor::data_with_attrs(Value::int32(1), PropertyAttributes::frozen()),
        );
        assert!(!obj.set(PropertyKey::string("x"), Value::int32(2)));
        assert_eq!(obj.get(&PropertyKey::string("x")), Value::int32(1));
    }

    #[test]
    fn test_getter_sees_receiver() {
        let getter = JsObject::native_function("get", |this, _| {
            Ok(this.get("base"))
        });
        let obj = JsObject::ordinary(None);
        obj.set(PropertyKey::string("base"), Value::int32(5));
        obj.define_property(
            PropertyKey::string("derived"),
            PropertyDescriptor::accessor(
                Some(Value::object(getter)),
                None,
                PropertyAttributes::data(),
            ),
        );
        assert_eq!(obj.get(&PropertyKey::string("derived")), Value::int32(5));
    }

    #[test]
    fn test_array_grows_with_indices() {
        let arr = JsObject::array(1);
        assert_eq!(arr.array_length(), 1);
        arr.set(PropertyKey::Index(4), Value::Null);
        assert_eq!(arr.array_length(), 5);
        assert!(!arr.has_own(&PropertyKey::Index(1)));
    }

    #[test]
    fn test_freeze() {
        let obj = JsObject::ordinary(None);
        obj.set(PropertyKey::string("a"), Value::int32(1));
        obj.freeze();
        assert!(obj.is_frozen());
        assert!(!obj.set(PropertyKey::string("b"), Value::int32(2)));
        assert!(!obj.delete(&PropertyKey::string("a")));
    }

    #[test]
    fn test_date_iso() {
        let d = JsObject::date(0.0);
        assert_eq!(d.date_iso_string().as_deref(), Some("1970-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_long_chain_drops_without_recursion() {
        let key = PropertyKey::string("next");
        let mut head = JsObject::ordinary(None);
        for _ in 0..200_000 {
            let node = JsObject::ordinary(None);
            node.set(key.clone(), Value::object(head));
            head = node;
        }
        drop(head);
    }

    #[test]
    fn test_object_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<JsObject>();
        assert_send_sync::<ObjectRef>();
    }
}
