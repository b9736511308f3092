//! Customizers and `Symbol.cloningMethod`

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{Reports, expect_object, get, key, object};
use replica_clone::{
    AdditionalValue, CloneError, CloneOptions, Customizer, ValueTransform, clone_deep,
    use_customizer,
};
use replica_value::{
    JsObject, ObjectRef, PropertyAttributes, PropertyDescriptor, PropertyKey, Symbol, Value,
};

fn dates_as_strings() -> Customizer {
    Customizer::new(|value| {
        Ok(value
            .as_object()
            .and_then(|o| o.date_iso_string())
            .map(|iso| ValueTransform::new(Value::from(iso))))
    })
}

#[test]
fn test_customizer_overrides_builtin() {
    let root = object(&[("when", Value::object(JsObject::date(0.0)))]);
    let copy = clone_deep(
        &Value::object(root),
        CloneOptions::new().customizer(dates_as_strings()),
    )
    .unwrap();
    assert_eq!(
        get(&expect_object(&copy), "when"),
        Value::from("1970-01-01T00:00:00.000Z")
    );
}

#[test]
fn test_customizer_not_consulted_for_aliases() {
    let calls = Arc::new(AtomicUsize::new(0));
    let shared = object(&[]);
    let root = object(&[
        ("a", Value::object(shared.clone())),
        ("b", Value::object(shared.clone())),
    ]);
    let counting = {
        let calls = calls.clone();
        let shared = shared.clone();
        Customizer::new(move |value| {
            if value.as_object() == Some(&shared) {
                calls.fetch_add(1, Ordering::SeqCst);
            }
            Ok(None)
        })
    };

    let copy = expect_object(
        &clone_deep(&Value::object(root), CloneOptions::new().customizer(counting)).unwrap(),
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(get(&copy, "a"), get(&copy, "b"));
}

#[test]
fn test_ignore_drops_values() {
    let secretive = Customizer::new(|value| {
        Ok((value.as_str() == Some("secret")).then(ValueTransform::ignored))
    });
    let root = object(&[("public", Value::from("ok")), ("hidden", Value::from("secret"))]);
    let copy = expect_object(
        &clone_deep(&Value::object(root), CloneOptions::new().customizer(secretive.clone()))
            .unwrap(),
    );
    assert_eq!(get(&copy, "public"), Value::from("ok"));
    assert!(!copy.has_own(&key("hidden")));

    let root =
        clone_deep(&Value::from("secret"), CloneOptions::new().customizer(secretive)).unwrap();
    assert!(root.is_undefined());
}

/// `{ kind: "box", payload }` becomes a fresh box whose payload arrives via an assigner
fn boxes(built: Arc<AtomicUsize>) -> Customizer {
    Customizer::new(move |value| {
        let Some(obj) = value.as_object() else {
            return Ok(None);
        };
        if obj.get(&key("kind")) != Value::from("box") {
            return Ok(None);
        }
        built.fetch_add(1, Ordering::SeqCst);
        let shell = object(&[("kind", Value::from("box")), ("rebuilt", Value::boolean(true))]);
        let target = shell.clone();
        let payload = obj.get(&key("payload"));
        Ok(Some(
            ValueTransform::new(shell)
                .skip_props()
                .with_additional(AdditionalValue::new(payload, move |clone| {
                    target.set(key("payload"), clone);
                })),
        ))
    })
}

#[test]
fn test_additional_values_are_cloned_and_assigned() {
    let built = Arc::new(AtomicUsize::new(0));
    let payload = object(&[("n", Value::int32(1))]);
    let boxed = object(&[
        ("kind", Value::from("box")),
        ("payload", Value::object(payload.clone())),
    ]);
    let root = object(&[
        ("boxed", Value::object(boxed)),
        ("direct", Value::object(payload.clone())),
    ]);

    let copy = expect_object(
        &clone_deep(&Value::object(root), CloneOptions::new().customizer(boxes(built.clone())))
            .unwrap(),
    );
    assert_eq!(built.load(Ordering::SeqCst), 1);
    let boxed2 = expect_object(&get(&copy, "boxed"));
    assert_eq!(get(&boxed2, "rebuilt"), Value::boolean(true));
    let payload2 = get(&boxed2, "payload");
    assert_ne!(payload2, Value::object(payload));
    // The additional value shares the identity map with the rest of the graph
    assert_eq!(payload2, get(&copy, "direct"));
}

#[test]
fn test_customizer_error_falls_back() {
    let reports = Reports::default();
    let picky = Customizer::new(|value| {
        if value.as_str() == Some("bad") {
            Err("cannot handle bad".into())
        } else {
            Ok(None)
        }
    });
    let root = object(&[("v", Value::from("bad"))]);
    let copy = clone_deep(&Value::object(root), reports.options().customizer(picky)).unwrap();

    assert_eq!(get(&expect_object(&copy), "v"), Value::from("bad"));
    assert_eq!(
        reports.messages(),
        vec!["customizer failed at $.v: cannot handle bad".to_string()]
    );
}

#[test]
fn test_customizer_error_can_fail_the_call() {
    let failing = Customizer::new(|value| {
        if value.as_number().is_some() {
            Err("numbers are forbidden".into())
        } else {
            Ok(None)
        }
    });
    let root = object(&[("n", Value::int32(1))]);
    let err = clone_deep(
        &Value::object(root),
        CloneOptions::new().customizer(failing).let_customizer_throw(true),
    )
    .unwrap_err();
    match err {
        CloneError::Customizer { path, source } => {
            assert_eq!(path.unwrap().to_string(), "$.n");
            assert_eq!(source.to_string(), "numbers are forbidden");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_composed_customizers() {
    let built = Arc::new(AtomicUsize::new(0));
    let composed = use_customizer([dates_as_strings(), boxes(built.clone())]);
    let boxed = object(&[
        ("kind", Value::from("box")),
        ("payload", Value::object(JsObject::date(0.0))),
    ]);
    let copy = expect_object(
        &clone_deep(&Value::object(boxed), CloneOptions::new().customizer(composed)).unwrap(),
    );
    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert_eq!(get(&copy, "payload"), Value::from("1970-01-01T00:00:00.000Z"));
}

/// A prototype whose cloning method copies `id` and asks to skip `cache`
fn self_cloning_proto(calls: Arc<AtomicUsize>) -> ObjectRef {
    let method = JsObject::native_function("clone", move |this, _| {
        calls.fetch_add(1, Ordering::SeqCst);
        let copy = object(&[("id", this.get("id")), ("viaMethod", Value::boolean(true))]);
        let ignore = JsObject::array_from([Value::from("cache"), Value::from("id")]);
        Ok(Value::object(object(&[
            ("clone", Value::object(copy)),
            ("propsToIgnore", Value::object(ignore)),
        ])))
    });
    let proto = JsObject::ordinary(None);
    proto.define_property(
        PropertyKey::symbol(Symbol::cloning_method()),
        PropertyDescriptor::data_with_attrs(Value::object(method), PropertyAttributes::hidden()),
    );
    proto
}

fn instance(proto: &ObjectRef) -> ObjectRef {
    let obj = JsObject::ordinary(Some(proto.clone()));
    obj.set(key("id"), Value::int32(7));
    obj.set(key("cache"), Value::from("stale"));
    obj.set(key("label"), Value::from("kept"));
    obj
}

#[test]
fn test_cloning_method_is_used() {
    let calls = Arc::new(AtomicUsize::new(0));
    let proto = self_cloning_proto(calls.clone());
    let copy =
        expect_object(&clone_deep(&Value::object(instance(&proto)), CloneOptions::new()).unwrap());

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(get(&copy, "viaMethod"), Value::boolean(true));
    assert_eq!(get(&copy, "id"), Value::int32(7));
    assert_eq!(get(&copy, "label"), Value::from("kept"));
    assert!(!copy.has_own(&key("cache")));
    assert_eq!(copy.prototype(), Some(proto));
}

#[test]
fn test_cloning_methods_can_be_ignored() {
    let calls = Arc::new(AtomicUsize::new(0));
    let proto = self_cloning_proto(calls.clone());
    let copy = expect_object(
        &clone_deep(
            &Value::object(instance(&proto)),
            CloneOptions::new().ignore_cloning_methods(true),
        )
        .unwrap(),
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(get(&copy, "cache"), Value::from("stale"));
    assert!(!copy.has_own(&key("viaMethod")));
}

#[test]
fn test_throwing_cloning_method_falls_back() {
    let reports = Reports::default();
    let method = JsObject::native_function("clone", |_, _| Err(Value::from("no copies")));
    let obj = object(&[("x", Value::int32(1))]);
    let proto = JsObject::ordinary(None);
    proto.set(PropertyKey::symbol(Symbol::cloning_method()), Value::object(method));
    obj.set_prototype(Some(proto));

    let copy = expect_object(&clone_deep(&Value::object(obj), reports.options()).unwrap());
    assert_eq!(get(&copy, "x"), Value::int32(1));
    assert_eq!(reports.messages(), vec!["cloning method failed at $: no copies".to_string()]);
}

#[test]
fn test_customizer_beats_cloning_method() {
    let calls = Arc::new(AtomicUsize::new(0));
    let proto = self_cloning_proto(calls.clone());
    let replace = Customizer::new(|value| {
        Ok(value
            .as_object()
            .filter(|o| o.has_own(&key("cache")))
            .map(|_| ValueTransform::new(Value::from("customized"))))
    });
    let copy = clone_deep(
        &Value::object(instance(&proto)),
        CloneOptions::new().customizer(replace),
    )
    .unwrap();
    assert_eq!(copy, Value::from("customized"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_customizer_replaces_functions() {
    let reports = Reports::default();
    let functions_as_objects = Customizer::new(|value| {
        Ok(value
            .is_callable()
            .then(|| ValueTransform::new(JsObject::ordinary(None)).skip_props()))
    });
    let f = JsObject::native_function("f", |_, _| Ok(Value::int32(1)));
    let root = object(&[("a", Value::int32(1)), ("f", Value::object(f))]);

    let copy = expect_object(
        &clone_deep(&Value::object(root), reports.options().customizer(functions_as_objects))
            .unwrap(),
    );
    assert_eq!(get(&copy, "a"), Value::int32(1));
    let f2 = expect_object(&get(&copy, "f"));
    assert!(!f2.is_callable());
    assert_eq!(f2.property_count(), 0);
    assert_eq!(reports.len(), 0);
}
