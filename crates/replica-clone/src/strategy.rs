//! Built-in cloning strategies
//!
//! Each strategy builds a clone shell with no prototype and returns the
//! transform that finishes it. The scheduler links the prototype and copies
//! own properties afterwards.
//!
//! ## Kinds
//!
//! | kind | clone |
//! |------|-------|
//! | plain object, array | empty shell (array keeps its length) |
//! | primitive wrapper, Date | same primitive / time value |
//! | RegExp | source and flags, `lastIndex` reset |
//! | Error | same kind; own properties copied like any object |
//! | Map, Set | empty container, entries cloned as additional values |
//! | ArrayBuffer | byte copy |
//! | typed array, DataView | same framing over the cloned buffer |
//! | Promise | pending placeholder settled by a watcher |
//! | host kinds | [`HostObject::duplicate`](replica_value::HostObject::duplicate) |
//! | Function, weak containers, opaque | degraded to `{}` and reported |

use std::sync::Arc;

use parking_lot::Mutex;
use replica_value::{
    ErrorKind, JsDataView, JsObject, JsPromise, JsTypedArray, MapData, ObjectKind, ObjectRef,
    PropertyDescriptor, PropertyKey, SetData, Symbol, Value,
};

use crate::error::{CloneError, describe};
use crate::path::{ClonePath, Segment, extend};
use crate::scheduler::Traversal;
use crate::settlement::SettlementTarget;
use crate::tag::{Tag, slot_matches};
use crate::transform::{AdditionalValue, ValueTransform};

/// Half-finished map entry; inserted once both halves are cloned
#[derive(Default)]
struct PendingEntry {
    key: Option<Value>,
    value: Option<Value>,
}

fn fill_entry(
    pending: &Mutex<PendingEntry>,
    map: &ObjectRef,
    fill: impl FnOnce(&mut PendingEntry),
) {
    let mut entry = pending.lock();
    fill(&mut entry);
    if let (Some(key), Some(value)) = (&entry.key, &entry.value)
        && let Some(data) = map.as_map()
    {
        data.set(key.clone(), value.clone());
    }
}

impl Traversal<'_> {
    pub(crate) fn strategy(
        &mut self,
        tag: Tag,
        obj: &ObjectRef,
        path: &Option<ClonePath>,
    ) -> ValueTransform {
        if !slot_matches(tag, obj) {
            return self.degrade(CloneError::BrandMismatch {
                claimed: tag.name(),
                actual: obj.kind().name(),
                path: path.clone(),
            });
        }

        match obj.kind() {
            ObjectKind::Ordinary => ValueTransform::new(JsObject::ordinary(None)),
            ObjectKind::Array(_) => ValueTransform::new(JsObject::array(obj.array_length())),
            ObjectKind::BooleanObject(_)
            | ObjectKind::NumberObject(_)
            | ObjectKind::StringObject(_)
            | ObjectKind::BigIntObject(_)
            | ObjectKind::SymbolObject(_) => {
                match obj.primitive_value().and_then(|p| JsObject::wrapper(&p)) {
                    Some(wrapper) => ValueTransform::new(wrapper),
                    None => self.unclonable(obj.kind().name(), path),
                }
            }
            ObjectKind::Date(_) => {
                ValueTransform::new(JsObject::date(obj.date_value().unwrap_or(f64::NAN)))
            }
            ObjectKind::RegExp(re) => match JsObject::regexp(re.source(), re.flags()) {
                Ok(clone) => ValueTransform::new(clone),
                Err(_) => self.unclonable("RegExp", path),
            },
            ObjectKind::Error(kind) => clone_error(*kind),
            ObjectKind::Map(data) => clone_map(data),
            ObjectKind::Set(data) => clone_set(data),
            ObjectKind::ArrayBuffer(store) => match store.to_vec() {
                Some(bytes) => ValueTransform::new(JsObject::array_buffer(bytes)),
                None => self.detached("ArrayBuffer", path),
            },
            ObjectKind::TypedArray(view) => self.clone_typed_array(view, path),
            ObjectKind::DataView(view) => self.clone_data_view(view, path),
            ObjectKind::Promise(source) => self.clone_promise(source, path),
            ObjectKind::Host(host) if tag != Tag::Opaque => match host.duplicate() {
                Some(copy) => ValueTransform::new(JsObject::host(copy)),
                None => self.unclonable(host.host_tag().name(), path),
            },
            kind @ (ObjectKind::Host(_)
            | ObjectKind::Function(_)
            | ObjectKind::WeakRef(_)
            | ObjectKind::WeakMap
            | ObjectKind::WeakSet) => self.unclonable(kind.name(), path),
        }
    }

    /// Run a `Symbol.cloningMethod` found on `obj` or its prototype chain
    ///
    /// `None` means there is no usable method (failures are reported) and the
    /// built-in strategy applies.
    pub(crate) fn cloning_method(
        &mut self,
        obj: &ObjectRef,
        path: &Option<ClonePath>,
    ) -> Option<ValueTransform> {
        let key = PropertyKey::symbol(Symbol::cloning_method());
        let Some(PropertyDescriptor::Data { value: method, .. }) = obj.lookup(&key) else {
            return None;
        };
        let function = method.as_object()?.as_function()?;
        let outcome = function
            .call(&Value::Object(obj.clone()), &[])
            .map_err(|thrown| describe(&thrown))
            .and_then(|result| method_transform(&result));
        match outcome {
            Ok(transform) => Some(transform),
            Err(reason) => {
                self.engine.reporter.report(CloneError::CloningMethod {
                    path: path.clone(),
                    reason,
                });
                None
            }
        }
    }

    fn clone_typed_array(
        &mut self,
        view: &JsTypedArray,
        path: &Option<ClonePath>,
    ) -> ValueTransform {
        let name = view.kind().name();
        if view.is_detached() {
            return self.detached(name, path);
        }
        let Some(buffer) = self.clone_backing_buffer(view.buffer(), path) else {
            return self.detached(name, path);
        };
        match JsObject::typed_array(view.kind(), buffer, view.byte_offset(), view.length()) {
            Ok(clone) => ValueTransform::new(clone),
            Err(_) => self.unclonable(name, path),
        }
    }

    fn clone_data_view(&mut self, view: &JsDataView, path: &Option<ClonePath>) -> ValueTransform {
        if view.is_detached() {
            return self.detached("DataView", path);
        }
        let Some(buffer) = self.clone_backing_buffer(view.buffer(), path) else {
            return self.detached("DataView", path);
        };
        match JsObject::data_view(buffer, view.byte_offset(), Some(view.byte_length())) {
            Ok(clone) => ValueTransform::new(clone),
            Err(_) => self.unclonable("DataView", path),
        }
    }

    /// Clone of a view's buffer, shared with every other view of it
    fn clone_backing_buffer(
        &mut self,
        buffer: &ObjectRef,
        path: &Option<ClonePath>,
    ) -> Option<ObjectRef> {
        if let Some(existing) = self.session.identity.get(buffer) {
            return existing.as_object().cloned();
        }
        let bytes = buffer.as_array_buffer()?.to_vec()?;
        let shell = JsObject::array_buffer(bytes);
        self.session.identity.insert(buffer, Value::object(shell.clone()));
        self.adopt(buffer, &shell, &extend(path, Segment::Key(PropertyKey::string("buffer"))));
        Some(shell)
    }

    fn clone_promise(
        &mut self,
        source: &Arc<JsPromise>,
        path: &Option<ClonePath>,
    ) -> ValueTransform {
        let placeholder = JsPromise::new();
        self.engine.watch(
            source,
            SettlementTarget::Placeholder(placeholder.clone()),
            path.clone(),
        );
        ValueTransform::new(JsObject::promise(placeholder)).deferred()
    }

    fn unclonable(&self, kind: &'static str, path: &Option<ClonePath>) -> ValueTransform {
        self.degrade(CloneError::Unclonable {
            kind,
            path: path.clone(),
        })
    }

    fn detached(&self, kind: &'static str, path: &Option<ClonePath>) -> ValueTransform {
        self.degrade(CloneError::DetachedBuffer {
            kind,
            path: path.clone(),
        })
    }

    /// Report and substitute an empty object
    fn degrade(&self, err: CloneError) -> ValueTransform {
        self.engine.reporter.report(err);
        ValueTransform::new(JsObject::ordinary(None))
            .skip_props()
            .skip_proto()
    }
}

/// Only the slot is set here; `message`, `stack` and the rest are own
/// properties the descriptor copier installs in their original order.
fn clone_error(kind: ErrorKind) -> ValueTransform {
    ValueTransform::new(JsObject::with_kind(ObjectKind::Error(kind), None))
}

fn clone_map(data: &MapData) -> ValueTransform {
    let shell = JsObject::map();
    let mut transform = ValueTransform::new(shell.clone());
    for (index, (key, value)) in data.entries().into_iter().enumerate() {
        let pending = Arc::new(Mutex::new(PendingEntry::default()));

        let (key_pending, key_map) = (pending.clone(), shell.clone());
        transform.additional_values.push(
            AdditionalValue::new(key, move |clone| {
                fill_entry(&key_pending, &key_map, |entry| entry.key = Some(clone));
            })
            .at(Segment::MapKey(index)),
        );

        let value_map = shell.clone();
        transform.additional_values.push(
            AdditionalValue::new(value, move |clone| {
                fill_entry(&pending, &value_map, |entry| entry.value = Some(clone));
            })
            .at(Segment::MapValue(index)),
        );
    }
    transform
}

fn clone_set(data: &SetData) -> ValueTransform {
    let shell = JsObject::set();
    let mut transform = ValueTransform::new(shell.clone());
    for (index, member) in data.values().into_iter().enumerate() {
        let set = shell.clone();
        transform.additional_values.push(
            AdditionalValue::new(member, move |clone| {
                if let Some(data) = set.as_set() {
                    data.add(clone);
                }
            })
            .at(Segment::SetEntry(index)),
        );
    }
    transform
}

/// Read the record a cloning method returns
///
/// `{ clone, propsToIgnore?: key[], ignoreProps?: bool, ignoreProto?: bool }`
fn method_transform(result: &Value) -> Result<ValueTransform, String> {
    let Some(record) = result.as_object() else {
        return Err(format!("expected an object, got {}", result.type_of()));
    };
    let clone_key = PropertyKey::string("clone");
    if !record.has_own(&clone_key) {
        return Err("result has no `clone` property".into());
    }
    let mut transform = ValueTransform::new(record.get(&clone_key));
    transform.ignore_props = flag(record, "ignoreProps")?;
    transform.ignore_proto = flag(record, "ignoreProto")?;

    match record.get(&PropertyKey::string("propsToIgnore")) {
        Value::Undefined => {}
        Value::Object(list) if list.is_array() => {
            for i in 0..list.array_length() {
                let item = list.get(&PropertyKey::Index(i));
                let key = PropertyKey::from_value(&item)
                    .ok_or_else(|| format!("propsToIgnore[{i}] is not a property key"))?;
                transform.ignore_keys.push(key);
            }
        }
        other => {
            return Err(format!("propsToIgnore must be an array, got {}", other.type_of()));
        }
    }
    Ok(transform)
}

fn flag(record: &ObjectRef, name: &str) -> Result<bool, String> {
    match record.get(&PropertyKey::string(name)) {
        Value::Undefined => Ok(false),
        Value::Boolean(b) => Ok(b),
        other => Err(format!("{name} must be a boolean, got {}", other.type_of())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entries: &[(&str, Value)]) -> Value {
        let obj = JsObject::ordinary(None);
        for (key, value) in entries {
            obj.set(PropertyKey::string(key), value.clone());
        }
        Value::object(obj)
    }

    #[test]
    fn test_method_record() {
        let ignore = Value::object(JsObject::array_from([Value::from("a"), Value::int32(0)]));
        let t = method_transform(&record(&[
            ("clone", Value::from("c")),
            ("propsToIgnore", ignore),
            ("ignoreProto", Value::boolean(true)),
        ]))
        .unwrap();
        assert_eq!(t.clone, Value::from("c"));
        assert!(t.ignore_proto && !t.ignore_props);
        assert_eq!(
            t.ignore_keys.as_slice(),
            &[PropertyKey::string("a"), PropertyKey::Index(0)]
        );
    }

    #[test]
    fn test_method_record_requires_clone() {
        let err = method_transform(&record(&[("ignoreProps", Value::boolean(true))])).unwrap_err();
        assert!(err.contains("clone"));
        assert!(method_transform(&Value::int32(1)).is_err());
    }

    #[test]
    fn test_method_record_type_checks() {
        let bad_flag = record(&[("clone", Value::Null), ("ignoreProps", Value::from("yes"))]);
        assert!(method_transform(&bad_flag).is_err());
        let bad_list = record(&[("clone", Value::Null), ("propsToIgnore", Value::from("a"))]);
        assert!(method_transform(&bad_list).is_err());
    }

    #[test]
    fn test_map_entries_commit_in_pairs() {
        let map = JsObject::map();
        map.as_map().unwrap().set(Value::from("k"), Value::int32(1));
        let mut t = clone_map(map.as_map().unwrap());
        assert_eq!(t.additional_values.len(), 2);

        let value_half = t.additional_values.pop().unwrap();
        let key_half = t.additional_values.pop().unwrap();
        let clone = t.clone.as_object().unwrap().clone();

        (value_half.assigner)(Value::int32(2));
        assert_eq!(clone.as_map().unwrap().size(), 0);
        (key_half.assigner)(Value::from("k2"));
        assert_eq!(clone.as_map().unwrap().get(&Value::from("k2")), Some(Value::int32(2)));
    }

    #[test]
    fn test_error_keeps_kind_and_leaves_properties_to_the_copier() {
        let t = clone_error(ErrorKind::TypeError);
        let shell = t.clone.as_object().unwrap();
        assert_eq!(shell.error_kind(), Some(ErrorKind::TypeError));
        assert_eq!(shell.property_count(), 0);
        assert!(t.ignore_keys.is_empty());
        assert!(!t.ignore_props);
    }
}
