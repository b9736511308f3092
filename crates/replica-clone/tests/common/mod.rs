//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use replica_clone::{CloneError, CloneOptions};
use replica_value::{JsObject, ObjectRef, PropertyKey, Value};

/// Collects every report a call emits
#[derive(Clone, Default)]
pub struct Reports(Arc<Mutex<Vec<String>>>);

impl Reports {
    pub fn options(&self) -> CloneOptions {
        let sink = self.0.clone();
        CloneOptions::new().log(move |err: &CloneError| sink.lock().push(err.to_string()))
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }
}

pub fn key(name: &str) -> PropertyKey {
    PropertyKey::string(name)
}

/// Plain object with the given enumerable data properties
pub fn object(props: &[(&str, Value)]) -> ObjectRef {
    let obj = JsObject::ordinary(None);
    for (name, value) in props {
        obj.set(key(name), value.clone());
    }
    obj
}

pub fn get(obj: &ObjectRef, name: &str) -> Value {
    obj.get(&key(name))
}

/// Object behind a value; panics for primitives
pub fn expect_object(value: &Value) -> ObjectRef {
    value.as_object().cloned().expect("expected an object")
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
