//! Work-queue scheduler
//!
//! Cloning never recurses. The root is the first [`QueueElement`]; processing
//! an element creates its clone shell, registers it in the identity map,
//! installs it at its destination, and queues the children. The queue is
//! drained front to back, so the graph is visited breadth first.
//!
//! One [`Engine`] serves one call, including every settlement that arrives
//! after the main traversal. Settlement jobs reuse the call's identity map.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use replica_value::{JsObject, JsPromise, ObjectRef, Settlement, Value};
use tracing::{debug, trace};

use crate::error::{CloneError, CloneResult, describe};
use crate::identity::IdentityMap;
use crate::options::CloneOptions;
use crate::path::{ClonePath, Segment, extend};
use crate::queue::{Destination, QueueElement, Role};
use crate::report::Reporter;
use crate::settlement::{Coordinator, SettlementJob, SettlementTarget};
use crate::tag::{ResolveMode, resolve};
use crate::transform::{AdditionalValue, ValueTransform};

/// Per-call state guarded by the session lock
#[derive(Default)]
pub(crate) struct Session {
    pub(crate) identity: IdentityMap,
    processed: usize,
}

pub(crate) struct Engine {
    pub(crate) options: CloneOptions,
    pub(crate) mode: ResolveMode,
    /// `Some(force)` when prototypes are cloned too
    pub(crate) fully: Option<bool>,
    pub(crate) reporter: Reporter,
    session: Mutex<Session>,
    inbox: Mutex<VecDeque<SettlementJob>>,
    coordinator: Option<Arc<Coordinator>>,
}

impl Engine {
    fn new(options: CloneOptions, fully: Option<bool>) -> Self {
        let reporter = Reporter::new(options.log_mode, options.log.clone());
        let coordinator = options.async_mode.then(Coordinator::new);
        Self {
            mode: options.resolve_mode(),
            options,
            fully,
            reporter,
            session: Mutex::new(Session::default()),
            inbox: Mutex::new(VecDeque::new()),
            coordinator,
        }
    }

    /// Clone `root`; in async mode the result is the outer promise
    pub(crate) fn run(
        root: &Value,
        options: CloneOptions,
        fully: Option<bool>,
    ) -> CloneResult<Value> {
        let engine = Arc::new(Engine::new(options, fully));
        let path = engine.reporter.wants_paths().then(ClonePath::root);

        let outcome = {
            let mut session = engine.session.lock();
            let outcome = engine.traverse(&mut session, root.clone(), path);
            if outcome.is_ok() {
                engine.drain(&mut session);
            }
            debug!(
                processed = session.processed,
                identities = session.identity.len(),
                identity_hits = session.identity.hits(),
                reported = engine.reporter.reported(),
                async_mode = engine.coordinator.is_some(),
                "clone traversal finished"
            );
            outcome
        };
        engine.pump();

        let clone = outcome?;
        match &engine.coordinator {
            Some(coordinator) => {
                let outer = coordinator.outer();
                coordinator.finish_traversal(clone);
                Ok(Value::object(JsObject::promise(outer)))
            }
            None => Ok(clone),
        }
    }

    fn traverse(
        self: &Arc<Self>,
        session: &mut Session,
        value: Value,
        path: Option<ClonePath>,
    ) -> CloneResult<Value> {
        let mut traversal = Traversal {
            engine: self,
            session,
            queue: VecDeque::new(),
            root: Value::Undefined,
            sealed: Vec::new(),
        };
        traversal.queue.push_back(QueueElement::root(value, path));
        traversal.run()
    }

    /// Watch `source` and route its settlement to `target`
    pub(crate) fn watch(
        self: &Arc<Self>,
        source: &Arc<JsPromise>,
        target: SettlementTarget,
        path: Option<ClonePath>,
    ) {
        if matches!(target, SettlementTarget::Assigner(_))
            && let Some(coordinator) = &self.coordinator
        {
            coordinator.expect();
        }
        let engine = Arc::clone(self);
        source.on_settle(move |settlement| {
            engine.deliver(SettlementJob {
                settlement,
                target,
                path,
            });
        });
    }

    /// Wait for a placeholder in async mode
    pub(crate) fn track(&self, placeholder: &Arc<JsPromise>) {
        if let Some(coordinator) = &self.coordinator {
            coordinator.track(placeholder);
        }
    }

    fn deliver(self: &Arc<Self>, job: SettlementJob) {
        trace!(fulfilled = job.settlement.is_fulfilled(), "settlement queued");
        self.inbox.lock().push_back(job);
        self.pump();
    }

    /// Drain the inbox unless someone else holds the session
    fn pump(self: &Arc<Self>) {
        loop {
            let Some(mut session) = self.session.try_lock() else {
                return;
            };
            self.drain(&mut session);
            drop(session);
            if self.inbox.lock().is_empty() {
                return;
            }
        }
    }

    fn drain(self: &Arc<Self>, session: &mut Session) {
        loop {
            let job = self.inbox.lock().pop_front();
            let Some(job) = job else { break };
            self.settle(session, job);
        }
    }

    fn settle(self: &Arc<Self>, session: &mut Session, job: SettlementJob) {
        let SettlementJob {
            settlement,
            target,
            path,
        } = job;
        let payload_path = extend(&path, Segment::Settled);

        match target {
            SettlementTarget::Placeholder(placeholder) => {
                let fulfilled = settlement.is_fulfilled();
                let payload = settlement.into_result().unwrap_or_else(|reason| reason);
                match self.traverse(session, payload, payload_path) {
                    Ok(clone) if fulfilled => {
                        placeholder.resolve(clone);
                    }
                    Ok(clone) => {
                        placeholder.reject(clone);
                    }
                    Err(err) => {
                        let reason = err.to_value();
                        self.fail(err);
                        placeholder.reject(reason);
                    }
                }
            }
            SettlementTarget::Assigner(assign) => {
                match settlement {
                    Settlement::Fulfilled(value) => {
                        match self.traverse(session, value, payload_path) {
                            Ok(clone) => assign(clone),
                            Err(err) => self.fail(err),
                        }
                    }
                    Settlement::Rejected(reason) => {
                        self.reporter.report(CloneError::SettlementRejected {
                            path,
                            reason: describe(&reason),
                        });
                    }
                }
                if let Some(coordinator) = &self.coordinator {
                    coordinator.done();
                }
            }
        }
    }

    /// A fatal error after the call returned
    fn fail(&self, err: CloneError) {
        match &self.coordinator {
            Some(coordinator) => coordinator.fail(err.to_value()),
            None => self.reporter.report(err),
        }
    }
}

/// One drain of the queue
pub(crate) struct Traversal<'a> {
    pub(crate) engine: &'a Arc<Engine>,
    pub(crate) session: &'a mut Session,
    pub(crate) queue: VecDeque<QueueElement>,
    root: Value,
    /// Clones to make non-extensible once every property is in place
    sealed: Vec<ObjectRef>,
}

impl Traversal<'_> {
    fn run(mut self) -> CloneResult<Value> {
        while let Some(element) = self.queue.pop_front() {
            self.session.processed += 1;
            self.process(element)?;
        }
        for shell in &self.sealed {
            shell.prevent_extensions();
        }
        Ok(self.root)
    }

    fn process(&mut self, element: QueueElement) -> CloneResult<()> {
        let QueueElement {
            value,
            destination,
            path,
            role,
        } = element;

        if let Value::Object(obj) = &value
            && let Some(existing) = self.session.identity.get(obj)
        {
            destination.install(existing, &mut self.root);
            return Ok(());
        }

        let transform = match self.customize(&value, &path)? {
            Some(transform) => transform,
            None => self.default_transform(&value, role, &path),
        };
        self.apply(value, transform, destination, path, role);
        Ok(())
    }

    fn customize(
        &self,
        value: &Value,
        path: &Option<ClonePath>,
    ) -> CloneResult<Option<ValueTransform>> {
        let Some(customizer) = &self.engine.options.customizer else {
            return Ok(None);
        };
        match customizer.call(value) {
            Ok(transform) => Ok(transform),
            Err(source) => {
                let err = CloneError::Customizer {
                    path: path.clone(),
                    source,
                };
                if self.engine.options.let_customizer_throw {
                    return Err(err);
                }
                self.engine.reporter.report(err);
                Ok(None)
            }
        }
    }

    fn default_transform(
        &mut self,
        value: &Value,
        role: Role,
        path: &Option<ClonePath>,
    ) -> ValueTransform {
        let Value::Object(obj) = value else {
            return ValueTransform::new(value.clone());
        };
        let tag = resolve(value, self.engine.mode);
        if role == Role::Value
            && !self.engine.options.ignore_cloning_methods
            && let Some(transform) = self.cloning_method(obj, path)
        {
            return transform;
        }
        self.strategy(tag, obj, path)
    }

    fn apply(
        &mut self,
        original: Value,
        transform: ValueTransform,
        destination: Destination,
        path: Option<ClonePath>,
        role: Role,
    ) {
        let ValueTransform {
            clone,
            additional_values,
            ignore,
            ignore_props,
            ignore_proto,
            ignore_keys,
            is_async,
        } = transform;
        if ignore {
            return;
        }

        if let Value::Object(obj) = &original {
            self.session.identity.insert(obj, clone.clone());
        }
        if is_async && let Some(placeholder) = clone.as_promise() {
            self.engine.track(placeholder);
        }
        destination.install(clone.clone(), &mut self.root);

        if let (Value::Object(obj), Value::Object(shell)) = (&original, &clone)
            && !ObjectRef::ptr_eq(obj, shell)
        {
            if !ignore_proto {
                self.link_prototype(obj, shell, &path);
            }
            if !ignore_props {
                self.copy_properties(obj, shell, &ignore_keys, role, &path);
                if !obj.is_extensible() {
                    self.sealed.push(shell.clone());
                }
            }
        }

        for (index, extra) in additional_values.into_iter().enumerate() {
            self.enqueue_additional(extra, index, &path);
        }
    }

    /// Give `shell` the prototype and properties of `original`
    ///
    /// Used for shells a strategy builds outside the queue, like the buffer
    /// behind a view.
    pub(crate) fn adopt(
        &mut self,
        original: &ObjectRef,
        shell: &ObjectRef,
        path: &Option<ClonePath>,
    ) {
        self.link_prototype(original, shell, path);
        self.copy_properties(original, shell, &[], Role::Value, path);
        if !original.is_extensible() {
            self.sealed.push(shell.clone());
        }
    }

    fn link_prototype(
        &mut self,
        original: &ObjectRef,
        shell: &ObjectRef,
        path: &Option<ClonePath>,
    ) {
        let Some(proto) = original.prototype() else {
            shell.set_prototype(None);
            return;
        };
        let walk = match self.engine.fully {
            Some(force) => force || !has_own_methods(&proto),
            None => false,
        };
        if !walk {
            shell.set_prototype(Some(proto));
            return;
        }
        self.queue.push_back(QueueElement {
            value: Value::Object(proto),
            destination: Destination::Prototype {
                child: shell.clone(),
            },
            path: extend(path, Segment::Prototype),
            role: Role::Prototype,
        });
    }

    fn enqueue_additional(
        &mut self,
        extra: AdditionalValue,
        index: usize,
        path: &Option<ClonePath>,
    ) {
        let AdditionalValue {
            value,
            assigner,
            is_async,
            segment,
        } = extra;
        let path = extend(path, segment.unwrap_or(Segment::Additional(index)));

        if is_async && let Some(source) = value.as_promise() {
            self.engine
                .watch(source, SettlementTarget::Assigner(assigner), path);
            return;
        }
        self.queue.push_back(QueueElement {
            value,
            destination: Destination::Assigner(assigner),
            path,
            role: Role::Value,
        });
    }
}

/// Own function-valued data properties other than `constructor`
fn has_own_methods(proto: &ObjectRef) -> bool {
    proto.own_keys().into_iter().any(|key| {
        key.to_value().as_str() != Some("constructor")
            && proto
                .get_own_property(&key)
                .and_then(|desc| desc.value().map(Value::is_callable))
                .unwrap_or(false)
    })
}
