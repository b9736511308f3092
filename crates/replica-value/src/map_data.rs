//! Backing data structures for Map and Set.
//!
//! Uses SameValueZero semantics via `MapKey`, insertion-ordered storage
//! with tombstone-based deletion so that entry order survives deletes.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use num_bigint::BigInt;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::object::ObjectRef;
use crate::value::Value;

// ============================================================================
// MapKey
// ============================================================================

/// A value normalized for SameValueZero hashing
///
/// `NaN` equals `NaN`, `+0` equals `-0`, strings and bigints compare by
/// content, symbols and objects by identity.
#[derive(Clone, Debug)]
pub enum MapKey {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// Boolean
    Boolean(bool),
    /// Number bits after NaN / zero normalization
    Number(u64),
    /// String content
    String(Arc<str>),
    /// BigInt value
    BigInt(Arc<BigInt>),
    /// Symbol id
    Symbol(u64),
    /// Object identity
    Object(ObjectRef),
}

impl MapKey {
    /// Normalize a value
    pub fn new(value: &Value) -> Self {
        match value {
            Value::Undefined => MapKey::Undefined,
            Value::Null => MapKey::Null,
            Value::Boolean(b) => MapKey::Boolean(*b),
            Value::Number(n) => {
                let n = if n.is_nan() {
                    f64::NAN
                } else if *n == 0.0 {
                    0.0
                } else {
                    *n
                };
                MapKey::Number(n.to_bits())
            }
            Value::String(s) => MapKey::String(s.clone()),
            Value::BigInt(n) => MapKey::BigInt(n.clone()),
            Value::Symbol(sym) => MapKey::Symbol(sym.id()),
            Value::Object(o) => MapKey::Object(o.clone()),
        }
    }
}

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MapKey::Undefined, MapKey::Undefined) | (MapKey::Null, MapKey::Null) => true,
            (MapKey::Boolean(a), MapKey::Boolean(b)) => a == b,
            (MapKey::Number(a), MapKey::Number(b)) => a == b,
            (MapKey::String(a), MapKey::String(b)) => a == b,
            (MapKey::BigInt(a), MapKey::BigInt(b)) => a == b,
            (MapKey::Symbol(a), MapKey::Symbol(b)) => a == b,
            (MapKey::Object(a), MapKey::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for MapKey {}

impl Hash for MapKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            MapKey::Undefined | MapKey::Null => {}
            MapKey::Boolean(b) => b.hash(state),
            MapKey::Number(bits) => bits.hash(state),
            MapKey::String(s) => s.hash(state),
            MapKey::BigInt(n) => n.hash(state),
            MapKey::Symbol(id) => id.hash(state),
            MapKey::Object(o) => o.hash(state),
        }
    }
}

// ============================================================================
// MapData
// ============================================================================

/// `Map` internal slot
///
/// Entries live in insertion order; a delete leaves a tombstone so later
/// entries keep their position. The index maps normalized keys to slots.
pub struct MapData {
    inner: RwLock<MapDataInner>,
}

struct MapDataInner {
    /// `None` marks a deleted entry
    entries: Vec<Option<(Value, Value)>>,
    /// Normalized key to slot in `entries`
    index: FxHashMap<MapKey, usize>,
    /// Live entries
    size: usize,
}

impl Default for MapData {
    fn default() -> Self {
        Self::new()
    }
}

impl MapData {
    /// Empty map
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MapDataInner {
                entries: Vec::new(),
                index: FxHashMap::default(),
                size: 0,
            }),
        }
    }

    /// Live entry count
    pub fn size(&self) -> usize {
        self.inner.read().size
    }

    /// Value stored under `key`
    pub fn get(&self, key: &Value) -> Option<Value> {
        let inner = self.inner.read();
        let idx = *inner.index.get(&MapKey::new(key))?;
        inner.entries.get(idx)?.as_ref().map(|(_, v)| v.clone())
    }

    /// `key` is present
    pub fn has(&self, key: &Value) -> bool {
        self.inner.read().index.contains_key(&MapKey::new(key))
    }

    /// Insert or overwrite; true when `key` was already present
    pub fn set(&self, key: Value, value: Value) -> bool {
        let mut inner = self.inner.write();
        let map_key = MapKey::new(&key);
        if let Some(&idx) = inner.index.get(&map_key) {
            // Overwrites keep the original position
            if let Some((_, slot)) = inner.entries[idx].as_mut() {
                *slot = value;
            }
            true
        } else {
            let idx = inner.entries.len();
            inner.index.insert(map_key, idx);
            inner.entries.push(Some((key, value)));
            inner.size += 1;
            false
        }
    }

    /// Remove `key`; true when it was present
    pub fn delete(&self, key: &Value) -> bool {
        let mut inner = self.inner.write();
        if let Some(idx) = inner.index.remove(&MapKey::new(key)) {
            inner.entries[idx] = None;
            inner.size -= 1;
            true
        } else {
            false
        }
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.index.clear();
        inner.size = 0;
    }

    /// Snapshot of live entries in insertion order.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.inner.read().entries.iter().flatten().cloned().collect()
    }

    /// Move every key and value out, leaving the map empty.
    pub(crate) fn take_values(&mut self, out: &mut Vec<Value>) {
        let inner = self.inner.get_mut();
        inner.index.clear();
        inner.size = 0;
        for (key, value) in inner.entries.drain(..).flatten() {
            out.push(key);
            out.push(value);
        }
    }
}

// ============================================================================
// SetData
// ============================================================================

/// Internal storage for a `Set`, same layout as [`MapData`] without values.
pub struct SetData {
    inner: RwLock<SetDataInner>,
}

struct SetDataInner {
    entries: Vec<Option<Value>>,
    index: FxHashMap<MapKey, usize>,
    size: usize,
}

impl Default for SetData {
    fn default() -> Self {
        Self::new()
    }
}

impl SetData {
    /// Empty set
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SetDataInner {
                entries: Vec::new(),
                index: FxHashMap::default(),
                size: 0,
            }),
        }
    }

    /// Live entry count
    pub fn size(&self) -> usize {
        self.inner.read().size
    }

    /// Returns `true` if `value` is a member.
    pub fn has(&self, value: &Value) -> bool {
        self.inner.read().index.contains_key(&MapKey::new(value))
    }

    /// Add `value`. Returns `true` if it was already present.
    pub fn add(&self, value: Value) -> bool {
        let mut inner = self.inner.write();
        let key = MapKey::new(&value);
        if inner.index.contains_key(&key) {
            return true;
        }
        let idx = inner.entries.len();
        inner.index.insert(key, idx);
        inner.entries.push(Some(value));
        inner.size += 1;
        false
    }

    /// Delete `value`. Returns `true` if it existed.
    pub fn delete(&self, value: &Value) -> bool {
        let mut inner = self.inner.write();
        if let Some(idx) = inner.index.remove(&MapKey::new(value)) {
            inner.entries[idx] = None;
            inner.size -= 1;
            true
        } else {
            false
        }
    }

    /// Snapshot of live members in insertion order.
    pub fn values(&self) -> Vec<Value> {
        self.inner.read().entries.iter().flatten().cloned().collect()
    }

    /// Move every member out, leaving the set empty.
    pub(crate) fn take_values(&mut self, out: &mut Vec<Value>) {
        let inner = self.inner.get_mut();
        inner.index.clear();
        inner.size = 0;
        out.extend(inner.entries.drain(..).flatten());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::JsObject;

    #[test]
    fn test_same_value_zero() {
        let map = MapData::new();
        map.set(Value::number(f64::NAN), Value::int32(1));
        map.set(Value::number(-0.0), Value::int32(2));
        assert_eq!(map.get(&Value::number(f64::NAN)), Some(Value::int32(1)));
        assert_eq!(map.get(&Value::number(0.0)), Some(Value::int32(2)));
        assert_eq!(map.size(), 2);
    }

    #[test]
    fn test_object_keys_by_identity() {
        let map = MapData::new();
        let a = JsObject::ordinary(None);
        let b = JsObject::ordinary(None);
        map.set(Value::object(a.clone()), Value::int32(1));
        assert!(map.has(&Value::object(a)));
        assert!(!map.has(&Value::object(b)));
    }

    #[test]
    fn test_delete_keeps_order() {
        let map = MapData::new();
        map.set(Value::from("a"), Value::int32(1));
        map.set(Value::from("b"), Value::int32(2));
        map.set(Value::from("c"), Value::int32(3));
        assert!(map.delete(&Value::from("b")));
        map.set(Value::from("a"), Value::int32(10));

        let keys: Vec<_> = map.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![Value::from("a"), Value::from("c")]);
        assert_eq!(map.get(&Value::from("a")), Some(Value::int32(10)));
    }

    #[test]
    fn test_set_membership() {
        let set = SetData::new();
        assert!(!set.add(Value::from("x")));
        assert!(set.add(Value::from("x")));
        assert_eq!(set.size(), 1);
        assert!(set.delete(&Value::from("x")));
        assert!(set.values().is_empty());
    }
}
