//! Async settlement
//!
//! Promise clones start out as pending placeholders. A watcher on each source
//! promise turns its settlement into a [`SettlementJob`]; jobs are queued in
//! the engine's inbox and drained by whoever holds the session, so a source
//! that settles mid-traversal (on this thread or another) never re-enters
//! the traversal.
//!
//! In async mode a [`Coordinator`] counts outstanding work and resolves the
//! call's outer promise with the root clone once the count reaches zero.

use std::sync::Arc;

use parking_lot::Mutex;
use replica_value::{JsPromise, Settlement, Value};

use crate::path::ClonePath;
use crate::transform::Assigner;

/// Where a settled, cloned payload goes
pub(crate) enum SettlementTarget {
    /// Settle a placeholder promise the same way the source settled
    Placeholder(Arc<JsPromise>),
    /// Pass the cloned fulfilment value to an assigner
    Assigner(Assigner),
}

pub(crate) struct SettlementJob {
    pub(crate) settlement: Settlement,
    pub(crate) target: SettlementTarget,
    pub(crate) path: Option<ClonePath>,
}

struct Progress {
    /// Traversal itself plus every tracked placeholder and awaited value
    pending: usize,
    root: Option<Value>,
    failure: Option<Value>,
}

/// Outstanding-work counter behind the outer promise of an async call
pub(crate) struct Coordinator {
    progress: Mutex<Progress>,
    outer: Arc<JsPromise>,
}

impl Coordinator {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            progress: Mutex::new(Progress {
                pending: 1,
                root: None,
                failure: None,
            }),
            outer: JsPromise::new(),
        })
    }

    /// The promise handed back to the caller
    pub(crate) fn outer(&self) -> Arc<JsPromise> {
        self.outer.clone()
    }

    /// Wait for `placeholder` before resolving
    pub(crate) fn track(self: &Arc<Self>, placeholder: &Arc<JsPromise>) {
        self.expect();
        let this = self.clone();
        placeholder.on_settle(move |_| this.done());
    }

    /// One more unit of outstanding work; balanced by [`Coordinator::done`]
    pub(crate) fn expect(&self) {
        self.progress.lock().pending += 1;
    }

    /// The main traversal finished with `root`
    pub(crate) fn finish_traversal(&self, root: Value) {
        self.progress.lock().root = Some(root);
        self.done();
    }

    /// Reject the outer promise once everything has settled
    pub(crate) fn fail(&self, reason: Value) {
        let mut progress = self.progress.lock();
        if progress.failure.is_none() {
            progress.failure = Some(reason);
        }
    }

    pub(crate) fn done(&self) {
        let (root, failure) = {
            let mut progress = self.progress.lock();
            progress.pending = progress.pending.saturating_sub(1);
            if progress.pending > 0 {
                return;
            }
            (progress.root.take(), progress.failure.take())
        };
        match failure {
            Some(reason) => {
                self.outer.reject(reason);
            }
            None => {
                self.outer.resolve(root.unwrap_or_default());
            }
        }
    }
}
