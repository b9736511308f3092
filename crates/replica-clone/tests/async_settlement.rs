//! Promise placeholders, async mode and awaited additional values

mod common;

use std::time::Duration;

use common::{Reports, expect_object, get, init_tracing, key, object};
use replica_clone::{
    AdditionalValue, CloneOptions, Customizer, ValueTransform, clone_deep, clone_deep_async,
};
use replica_value::{ErrorKind, JsObject, JsPromise, PromiseState, Value};

fn settle_later(promise: std::sync::Arc<JsPromise>, outcome: Result<Value, Value>) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        match outcome {
            Ok(value) => promise.resolve(value),
            Err(reason) => promise.reject(reason),
        };
    });
}

fn placeholder(copy: &Value, name: &str) -> std::sync::Arc<JsPromise> {
    get(&expect_object(copy), name)
        .as_promise()
        .cloned()
        .expect("expected a promise")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_placeholder_fulfils_with_cloned_payload() {
    init_tracing();
    let source = JsPromise::new();
    let payload = object(&[("n", Value::int32(1))]);
    let root = object(&[("p", Value::object(JsObject::promise(source.clone())))]);

    let copy = clone_deep(&Value::object(root), CloneOptions::new()).unwrap();
    let pending = placeholder(&copy, "p");
    assert!(!std::sync::Arc::ptr_eq(&pending, &source));
    assert!(pending.is_pending());

    settle_later(source, Ok(Value::object(payload.clone())));
    let value = expect_object(&pending.settled().await.unwrap());
    assert_ne!(value, payload);
    assert_eq!(get(&value, "n"), Value::int32(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_placeholder_rejects_with_cloned_reason() {
    let source = JsPromise::new();
    let reason = JsObject::error(ErrorKind::RangeError, "out of range");
    let root = object(&[("p", Value::object(JsObject::promise(source.clone())))]);

    let copy = clone_deep(&Value::object(root), CloneOptions::new()).unwrap();
    settle_later(source, Err(Value::object(reason.clone())));

    let rejected = expect_object(&placeholder(&copy, "p").settled().await.unwrap_err());
    assert_ne!(rejected, reason);
    assert_eq!(rejected.error_kind(), Some(ErrorKind::RangeError));
    assert_eq!(get(&rejected, "message"), Value::from("out of range"));
}

#[test]
fn test_settled_source_settles_placeholder_before_return() {
    let root = object(&[
        ("ok", Value::object(JsObject::promise(JsPromise::resolved(Value::int32(5))))),
        ("bad", Value::object(JsObject::promise(JsPromise::rejected(Value::from("no"))))),
    ]);
    let copy = clone_deep(&Value::object(root), CloneOptions::new()).unwrap();

    assert!(matches!(
        placeholder(&copy, "ok").state(),
        PromiseState::Fulfilled(v) if v == Value::int32(5)
    ));
    assert!(matches!(
        placeholder(&copy, "bad").state(),
        PromiseState::Rejected(v) if v == Value::from("no")
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_payload_shares_identity_with_graph() {
    let shared = object(&[]);
    let source = JsPromise::new();
    let root = object(&[
        ("shared", Value::object(shared.clone())),
        ("p", Value::object(JsObject::promise(source.clone()))),
    ]);

    let copy = clone_deep(&Value::object(root.clone()), CloneOptions::new()).unwrap();
    settle_later(source, Ok(Value::object(shared)));
    let value = placeholder(&copy, "p").settled().await.unwrap();
    assert_eq!(value, get(&expect_object(&copy), "shared"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_mode_waits_for_inner_promises() {
    let source = JsPromise::new();
    let root = object(&[("p", Value::object(JsObject::promise(source.clone())))]);

    let outer = clone_deep(&Value::object(root), CloneOptions::new().async_mode(true)).unwrap();
    let outer = outer.as_promise().cloned().expect("async mode returns a promise");
    assert!(outer.is_pending());

    settle_later(source, Ok(Value::from("late")));
    let copy = outer.settled().await.unwrap();
    assert!(matches!(
        placeholder(&copy, "p").state(),
        PromiseState::Fulfilled(v) if v == Value::from("late")
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_mode_waits_for_promises_inside_settled_payloads() {
    let outer_source = JsPromise::new();
    let inner_source = JsPromise::new();
    let root = object(&[("p", Value::object(JsObject::promise(outer_source.clone())))]);

    let outer = clone_deep(&Value::object(root), CloneOptions::new().async_mode(true)).unwrap();
    let outer = outer.as_promise().cloned().expect("async mode returns a promise");

    let payload = object(&[("q", Value::object(JsObject::promise(inner_source.clone())))]);
    outer_source.resolve(Value::object(payload.clone()));
    tokio::time::sleep(Duration::from_millis(20)).await;
    // The payload arrived but still holds a pending placeholder
    assert!(outer.is_pending());

    settle_later(inner_source, Ok(Value::from("deep")));
    let copy = outer.settled().await.unwrap();
    let PromiseState::Fulfilled(payload2) = placeholder(&copy, "p").state() else {
        panic!("outer placeholder should be fulfilled");
    };
    assert_ne!(payload2, Value::object(payload));
    assert!(matches!(
        placeholder(&payload2, "q").state(),
        PromiseState::Fulfilled(v) if v == Value::from("deep")
    ));
}

#[tokio::test]
async fn test_clone_deep_async_without_promises() {
    let root = object(&[("x", Value::int32(1))]);
    let copy = clone_deep_async(&Value::object(root.clone()), CloneOptions::new())
        .unwrap()
        .await
        .unwrap();
    let copy = expect_object(&copy);
    assert_ne!(copy, root);
    assert_eq!(get(&copy, "x"), Value::int32(1));
}

#[tokio::test]
async fn test_promise_root_is_adopted() {
    let payload = object(&[("y", Value::int32(2))]);
    let root = JsObject::promise(JsPromise::resolved(Value::object(payload.clone())));
    let copy = clone_deep_async(&Value::object(root), CloneOptions::new())
        .unwrap()
        .await
        .unwrap();
    let copy = expect_object(&copy);
    assert_ne!(copy, payload);
    assert_eq!(get(&copy, "y"), Value::int32(2));
}

/// `{ lazy: promise }` becomes `{ value }` once the promise fulfils
fn lazy_fields() -> Customizer {
    Customizer::new(|value| {
        let Some(obj) = value.as_object() else {
            return Ok(None);
        };
        let Some(source) = obj.get(&key("lazy")).as_promise().cloned() else {
            return Ok(None);
        };
        let shell = JsObject::ordinary(None);
        let target = shell.clone();
        Ok(Some(ValueTransform::new(shell).skip_props().with_additional(
            AdditionalValue::awaited(Value::object(JsObject::promise(source)), move |clone| {
                target.set(key("value"), clone);
            }),
        )))
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_awaited_additional_value_is_assigned() {
    let source = JsPromise::new();
    let lazy = object(&[("lazy", Value::object(JsObject::promise(source.clone())))]);
    let inner = object(&[("deep", Value::boolean(true))]);

    let future =
        clone_deep_async(&Value::object(lazy), CloneOptions::new().customizer(lazy_fields()))
            .unwrap();
    settle_later(source, Ok(Value::object(inner.clone())));
    let copy = expect_object(&future.await.unwrap());

    let value = expect_object(&get(&copy, "value"));
    assert_ne!(value, inner);
    assert_eq!(get(&value, "deep"), Value::boolean(true));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rejected_additional_value_is_reported() {
    let reports = Reports::default();
    let source = JsPromise::new();
    let lazy = object(&[("lazy", Value::object(JsObject::promise(source.clone())))]);

    let future =
        clone_deep_async(&Value::object(lazy), reports.options().customizer(lazy_fields()))
            .unwrap();
    settle_later(source, Err(Value::object(JsObject::error(ErrorKind::Error, "boom"))));
    let copy = expect_object(&future.await.unwrap());

    assert!(!copy.has_own(&key("value")));
    assert_eq!(
        reports.messages(),
        vec!["awaited value rejected at $<additional #0>: Error: boom".to_string()]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failing_payload_rejects_outer_promise() {
    let poison = Customizer::new(|value| {
        if value.as_str() == Some("poison") {
            Err("refusing poison".into())
        } else {
            Ok(None)
        }
    });
    let source = JsPromise::new();
    let root = object(&[("p", Value::object(JsObject::promise(source.clone())))]);

    let future = clone_deep_async(
        &Value::object(root),
        CloneOptions::new().customizer(poison).let_customizer_throw(true),
    )
    .unwrap();
    settle_later(source, Ok(Value::from("poison")));

    let reason = future.await.unwrap_err();
    assert_eq!(
        reason.get("message"),
        Value::from("customizer failed at $.p<settled>: refusing poison")
    );
}
