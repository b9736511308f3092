//! Promise slot: a settle-once, observe-many deferred value
//!
//! Settlement callbacks are plain Rust closures, so the slot is independent of
//! any scheduler. [`JsPromise::settled`] bridges into `async` code through a
//! `std::future::Future` that any executor can poll.
//!
//! ## Rust API
//!
//! ```ignore
//! let resolvers = JsPromise::with_resolvers();
//! let value = Value::object(JsObject::promise(resolvers.promise.clone()));
//! // Later, possibly on another thread
//! (resolvers.resolve)(Value::number(42.0));
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

use crate::error::ErrorKind;
use crate::object::JsObject;
use crate::value::Value;

/// Promise state
#[derive(Debug, Clone)]
pub enum PromiseState {
    /// Not yet settled
    Pending,
    /// Resolved with value
    Fulfilled(Value),
    /// Rejected with reason
    Rejected(Value),
}

impl PromiseState {
    /// No longer pending
    pub fn is_settled(&self) -> bool {
        !matches!(self, PromiseState::Pending)
    }
}

/// Outcome of a settled promise
#[derive(Debug, Clone)]
pub enum Settlement {
    /// Fulfilled with value
    Fulfilled(Value),
    /// Rejected with reason
    Rejected(Value),
}

impl Settlement {
    /// Check if fulfilled
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settlement::Fulfilled(_))
    }

    /// The fulfillment value or rejection reason
    pub fn value(&self) -> &Value {
        match self {
            Settlement::Fulfilled(v) | Settlement::Rejected(v) => v,
        }
    }

    /// Same outcome kind, different payload
    pub fn with_value(&self, value: Value) -> Settlement {
        match self {
            Settlement::Fulfilled(_) => Settlement::Fulfilled(value),
            Settlement::Rejected(_) => Settlement::Rejected(value),
        }
    }

    /// `Ok(value)` or `Err(reason)`
    pub fn into_result(self) -> Result<Value, Value> {
        match self {
            Settlement::Fulfilled(v) => Ok(v),
            Settlement::Rejected(v) => Err(v),
        }
    }
}

/// Callback run once the promise settles
type SettleCallback = Box<dyn FnOnce(Settlement) + Send>;

struct PromiseInner {
    state: PromiseState,
    /// Resolved with another promise; further resolve/reject calls are ignored
    locked: bool,
    reactions: Vec<SettleCallback>,
    wakers: Vec<Waker>,
}

/// A promise slot
pub struct JsPromise {
    inner: Mutex<PromiseInner>,
}

impl fmt::Debug for JsPromise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.lock().state {
            PromiseState::Pending => write!(f, "Promise {{ <pending> }}"),
            PromiseState::Fulfilled(v) => write!(f, "Promise {{ <fulfilled>: {:?} }}", v),
            PromiseState::Rejected(v) => write!(f, "Promise {{ <rejected>: {:?} }}", v),
        }
    }
}

/// Result of `JsPromise::with_resolvers()` - the `Promise.withResolvers()` pattern
///
/// Settle the promise from anywhere through the two handles.
pub struct PromiseWithResolvers {
    /// The promise
    pub promise: Arc<JsPromise>,
    /// Resolves (and may adopt) the promise
    pub resolve: Arc<dyn Fn(Value) + Send + Sync>,
    /// Rejects the promise
    pub reject: Arc<dyn Fn(Value) + Send + Sync>,
}

impl JsPromise {
    /// Pending promise
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(PromiseInner {
                state: PromiseState::Pending,
                locked: false,
                reactions: Vec::new(),
                wakers: Vec::new(),
            }),
        })
    }

    /// Create an already fulfilled promise
    pub fn resolved(value: Value) -> Arc<Self> {
        let promise = Self::new();
        promise.resolve(value);
        promise
    }

    /// Promise already rejected with `reason`
    pub fn rejected(reason: Value) -> Arc<Self> {
        let promise = Self::new();
        promise.reject(reason);
        promise
    }

    /// Create a promise with resolve/reject handles
    pub fn with_resolvers() -> PromiseWithResolvers {
        let promise = JsPromise::new();

        let resolve = {
            let p = promise.clone();
            Arc::new(move |v: Value| {
                p.resolve(v);
            }) as Arc<dyn Fn(Value) + Send + Sync>
        };

        let reject = {
            let p = promise.clone();
            Arc::new(move |e: Value| {
                p.reject(e);
            }) as Arc<dyn Fn(Value) + Send + Sync>
        };

        PromiseWithResolvers {
            promise,
            resolve,
            reject,
        }
    }

    /// Snapshot of the state
    pub fn state(&self) -> PromiseState {
        self.inner.lock().state.clone()
    }

    /// Check if settled
    pub fn is_settled(&self) -> bool {
        self.inner.lock().state.is_settled()
    }

    /// Check if still pending
    pub fn is_pending(&self) -> bool {
        !self.is_settled()
    }

    /// Resolve the promise
    ///
    /// Resolving with another promise adopts its eventual outcome. Resolving
    /// with itself rejects with a `TypeError`. Returns false if the promise
    /// was already settled or locked in.
    pub fn resolve(self: &Arc<Self>, value: Value) -> bool {
        let Some(other) = value.as_promise().cloned() else {
            return self.settle_unlocked(Settlement::Fulfilled(value));
        };
        if Arc::ptr_eq(&other, self) {
            let err = JsObject::error(ErrorKind::TypeError, "Chaining cycle detected for promise");
            return self.settle_unlocked(Settlement::Rejected(Value::object(err)));
        }
        {
            let mut inner = self.inner.lock();
            if inner.locked || inner.state.is_settled() {
                return false;
            }
            inner.locked = true;
        }
        let this = self.clone();
        other.on_settle(move |settlement| {
            this.finish(settlement);
        });
        true
    }

    /// Reject the promise; returns false if already settled or locked in
    pub fn reject(&self, reason: Value) -> bool {
        self.settle_unlocked(Settlement::Rejected(reason))
    }

    fn settle_unlocked(&self, settlement: Settlement) -> bool {
        {
            let inner = self.inner.lock();
            if inner.locked {
                return false;
            }
        }
        self.finish(settlement)
    }

    fn finish(&self, settlement: Settlement) -> bool {
        let (reactions, wakers) = {
            let mut inner = self.inner.lock();
            if inner.state.is_settled() {
                return false;
            }
            inner.state = match &settlement {
                Settlement::Fulfilled(v) => PromiseState::Fulfilled(v.clone()),
                Settlement::Rejected(v) => PromiseState::Rejected(v.clone()),
            };
            (
                std::mem::take(&mut inner.reactions),
                std::mem::take(&mut inner.wakers),
            )
        };

        for reaction in reactions {
            reaction(settlement.clone());
        }
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// Run `f` once the promise settles (immediately if it already has)
    pub fn on_settle<F>(&self, f: F)
    where
        F: FnOnce(Settlement) + Send + 'static,
    {
        let settled = {
            let mut inner = self.inner.lock();
            match &inner.state {
                PromiseState::Pending => {
                    inner.reactions.push(Box::new(f));
                    return;
                }
                PromiseState::Fulfilled(v) => Settlement::Fulfilled(v.clone()),
                PromiseState::Rejected(v) => Settlement::Rejected(v.clone()),
            }
        };
        f(settled);
    }

    /// Future that completes with `Ok(value)` or `Err(reason)`
    pub fn settled(self: &Arc<Self>) -> SettledFuture {
        SettledFuture {
            promise: self.clone(),
        }
    }
}

/// Future returned by [`JsPromise::settled`]
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct SettledFuture {
    promise: Arc<JsPromise>,
}

impl SettledFuture {
    /// The promise being awaited
    pub fn promise(&self) -> &Arc<JsPromise> {
        &self.promise
    }
}

impl Future for SettledFuture {
    type Output = Result<Value, Value>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.promise.inner.lock();
        match &inner.state {
            PromiseState::Fulfilled(v) => Poll::Ready(Ok(v.clone())),
            PromiseState::Rejected(v) => Poll::Ready(Err(v.clone())),
            PromiseState::Pending => {
                if !inner.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    inner.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_settle_once() {
        let promise = JsPromise::new();
        assert!(promise.resolve(Value::int32(1)));
        assert!(!promise.resolve(Value::int32(2)));
        assert!(!promise.reject(Value::int32(3)));
        assert!(matches!(promise.state(), PromiseState::Fulfilled(v) if v == Value::int32(1)));
    }

    #[test]
    fn test_observe_many() {
        let promise = JsPromise::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = hits.clone();
            promise.on_settle(move |s| {
                assert!(s.is_fulfilled());
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        promise.resolve(Value::Null);
        let late = hits.clone();
        promise.on_settle(move |_| {
            late.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_adopts_other_promise() {
        let inner = JsPromise::new();
        let outer = JsPromise::new();
        assert!(outer.resolve(Value::object(JsObject::promise(inner.clone()))));
        assert!(outer.is_pending());
        assert!(!outer.reject(Value::Null));
        inner.reject(Value::from("boom"));
        assert!(matches!(outer.state(), PromiseState::Rejected(v) if v == Value::from("boom")));
    }

    #[test]
    fn test_self_resolution_rejects() {
        let promise = JsPromise::new();
        promise.resolve(Value::object(JsObject::promise(promise.clone())));
        assert!(matches!(promise.state(), PromiseState::Rejected(_)));
    }

    #[tokio::test]
    async fn test_settled_future_across_threads() {
        let resolvers = JsPromise::with_resolvers();
        let resolve = resolvers.resolve.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            resolve(Value::int32(42));
        });
        assert_eq!(resolvers.promise.settled().await, Ok(Value::int32(42)));
    }
}
