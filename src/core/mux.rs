//! # Multiplexer: deduplicated attachment and synchronous cache reads.
//!
//! The [`Multiplexer`] owns the identity side table, the latest-value cache,
//! and the active-subscription records. Every query goes through
//! [`Multiplexer::resolve`], which never blocks and never awaits: it returns
//! the best currently-known view of the producer and, at most once per
//! identity, attaches to it as a side effect.
//!
//! ## Architecture
//! ```text
//!     resolve(query, scope)
//!         │
//!         ├─ Query::Value ───────────────────────────► View::Ready (unchanged)
//!         │
//!         ▼
//!     classify(producer)
//!         ├─ no capability ──────────────────────────► View::Inert (unchanged)
//!         │
//!         ▼  (Subscribable | Legacy | Thenable)
//!     ┌───────────────────────────────────────────────┐
//!     │ state lock: assign tag ── record exists?      │
//!     │   no  → reserve record + open unresolved slot │
//!     │   yes → reuse                                 │
//!     └───────────────┬───────────────────────────────┘
//!                     │ (scope?) bind destroy hook, once per tag
//!                     │ (fresh?) attach(sink) ── outside the lock
//!                     ▼
//!               read slot ──► View::Ready(latest) | View::Pending
//!
//!     sink(value): lock → epoch check → overwrite slot
//!                  then publish Emitted, call scope.notify_update()
//! ```
//!
//! ## Rules
//! - At most one active subscription per identity: the exists-check and the
//!   reservation happen under one lock acquisition, so concurrent queries
//!   for the same unseen producer cannot attach twice.
//! - The foreign attach call runs outside the lock: a producer that emits
//!   synchronously re-enters through the sink without deadlock.
//! - Emissions carry their attachment's epoch; a stale sink left over from a
//!   released subscription cannot resurrect the cache slot.
//! - Without a scope (and without `detach`), entries persist for the
//!   multiplexer's lifetime.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use crate::cache::{ProducerId, Registrar, ValueCache};
use crate::error::MuxError;
use crate::events::{Bus, Event, EventKind};
use crate::producers::{classify, ProducerRef, Sink, Subscription};

use super::config::MuxConfig;
use super::lifecycle;
use super::scope::ScopeRef;
use super::MultiplexerBuilder;

/// Input accepted by [`Multiplexer::resolve`].
pub enum Query<T> {
    /// A plain value with no async capability; resolved to itself.
    Value(T),
    /// An async producer, attached on first query.
    Producer(ProducerRef<T>),
}

impl<T> From<ProducerRef<T>> for Query<T> {
    fn from(producer: ProducerRef<T>) -> Self {
        Query::Producer(producer)
    }
}

/// Result of a query: the best currently-known state of the input.
pub enum View<T> {
    /// A passthrough value, or the latest emission.
    Ready(T),
    /// Attached, but nothing has been emitted yet.
    ///
    /// Distinct from every legitimate value, including zero-like ones.
    Pending,
    /// The producer exposed no async capability; handed back unchanged.
    ///
    /// Never conflated with [`View::Pending`]: an inert input is an ordinary
    /// value, not an unresolved producer.
    Inert(ProducerRef<T>),
}

impl<T> View<T> {
    /// True for [`View::Ready`].
    pub fn is_ready(&self) -> bool {
        matches!(self, View::Ready(_))
    }

    /// True for [`View::Pending`].
    pub fn is_pending(&self) -> bool {
        matches!(self, View::Pending)
    }

    /// True for [`View::Inert`].
    pub fn is_inert(&self) -> bool {
        matches!(self, View::Inert(_))
    }

    /// The ready value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            View::Ready(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: PartialEq> PartialEq for View<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (View::Ready(a), View::Ready(b)) => a == b,
            (View::Pending, View::Pending) => true,
            (View::Inert(a), View::Inert(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for View<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            View::Pending => f.write_str("Pending"),
            View::Inert(producer) => write!(f, "Inert({:p})", Arc::as_ptr(producer)),
        }
    }
}

/// Active-subscription record for one identity tag.
pub(crate) struct Record {
    /// Release handle, if the attachment produced one. `None` both for
    /// handle-less producers and while the attach call is still in flight.
    pub(crate) handle: Option<Box<dyn Subscription>>,
    /// Attachment generation; stale sinks are filtered by it.
    pub(crate) epoch: u64,
    /// Whether a destroy hook has been registered for this tag.
    pub(crate) bound: bool,
}

/// Mutable multiplexer state, all guarded by one lock.
pub(crate) struct State<T> {
    pub(crate) registrar: Registrar<T>,
    pub(crate) cache: ValueCache<T>,
    pub(crate) records: HashMap<ProducerId, Record>,
    pub(crate) next_epoch: u64,
}

/// State plus bus, shared with emission sinks and destroy hooks.
pub(crate) struct Shared<T> {
    pub(crate) state: Mutex<State<T>>,
    pub(crate) bus: Bus,
}

impl<T> Shared<T> {
    /// Poison-tolerant lock: the query path has no error channel, so a
    /// poisoned lock is recovered rather than surfaced.
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Value-caching subscription multiplexer.
///
/// See the [module docs](self) for the full contract. Construction is
/// runtime-free via [`Multiplexer::new`]; wiring observability subscribers
/// through [`Multiplexer::builder`] requires a Tokio runtime.
pub struct Multiplexer<T> {
    shared: Arc<Shared<T>>,
    router: Mutex<Option<crate::subscribers::RouterHandle>>,
}

impl<T: Clone + Send + 'static> Multiplexer<T> {
    /// Creates a bare multiplexer (no observability subscribers).
    pub fn new(cfg: MuxConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    registrar: Registrar::new(),
                    cache: ValueCache::with_capacity(cfg.slot_capacity()),
                    records: HashMap::new(),
                    next_epoch: 1,
                }),
                bus: Bus::new(cfg.bus_capacity_clamped()),
            }),
            router: Mutex::new(None),
        }
    }

    /// Starts a builder for a multiplexer with observability subscribers.
    pub fn builder(cfg: MuxConfig) -> MultiplexerBuilder<T> {
        MultiplexerBuilder::new(cfg)
    }

    /// Resolves a query to the best currently-known view.
    ///
    /// Plain values and inert producers pass through unchanged. For async
    /// producers this attaches on first sight (exactly once per identity),
    /// registers scope teardown when a scope is supplied, and returns the
    /// cached value synchronously - [`View::Pending`] until the first
    /// emission arrives.
    ///
    /// Never blocks. Panics raised by foreign attach or emission code
    /// propagate to the caller.
    pub fn resolve(&self, query: &Query<T>, scope: Option<&ScopeRef>) -> View<T> {
        let producer = match query {
            Query::Value(value) => return View::Ready(value.clone()),
            Query::Producer(producer) => producer,
        };
        let Some(attachment) = classify(producer.as_ref()) else {
            return View::Inert(Arc::clone(producer));
        };
        let shape = attachment.shape();

        let (id, fresh, epoch) = {
            let mut guard = self.shared.lock_state();
            let state = &mut *guard;
            let id = state.registrar.assign(producer);
            match state.records.get(&id) {
                Some(record) => (id, false, record.epoch),
                None => {
                    let epoch = state.next_epoch;
                    state.next_epoch += 1;
                    state.records.insert(
                        id,
                        Record {
                            handle: None,
                            epoch,
                            bound: false,
                        },
                    );
                    state.cache.open(id);
                    (id, true, epoch)
                }
            }
        };

        // Destruction hooks go in before the producer gets a chance to
        // emit, so a scope that dies mid-attach still tears down.
        if let Some(scope) = scope {
            self.bind_scope(id, scope);
        }

        if fresh {
            self.shared
                .bus
                .publish(Event::new(EventKind::Attached).with_producer(id).with_shape(shape));
            let sink = self.make_sink(id, epoch, scope.cloned());
            let handle = attachment.attach(sink);
            self.store_handle(id, epoch, handle);
        }

        self.read(id)
    }

    /// Reads the current view without side effects.
    ///
    /// Never assigns identity and never attaches; producers that were never
    /// resolved here read as [`View::Pending`].
    pub fn peek(&self, query: &Query<T>) -> View<T> {
        let producer = match query {
            Query::Value(value) => return View::Ready(value.clone()),
            Query::Producer(producer) => producer,
        };
        if classify(producer.as_ref()).is_none() {
            return View::Inert(Arc::clone(producer));
        }

        let state = self.shared.lock_state();
        match state.registrar.lookup(producer) {
            Some(id) => match state.cache.get(id) {
                Some(slot) => match slot.value() {
                    Some(value) => View::Ready(value.clone()),
                    None => View::Pending,
                },
                None => View::Pending,
            },
            None => View::Pending,
        }
    }

    /// Releases a producer's subscription and cache slot explicitly.
    ///
    /// The scope-less counterpart of the destruction signal: callers that
    /// never supplied a scope use this to reclaim entries.
    ///
    /// # Errors
    /// [`MuxError::UnknownProducer`] when no active subscription exists for
    /// this producer.
    pub fn detach(&self, producer: &ProducerRef<T>) -> Result<(), MuxError> {
        let id = {
            let state = self.shared.lock_state();
            state.registrar.lookup(producer)
        };
        let released = match id {
            Some(id) => lifecycle::release(&self.shared, id, "detached"),
            None => false,
        };
        if released {
            Ok(())
        } else {
            Err(MuxError::UnknownProducer)
        }
    }

    /// Releases every active subscription and cache slot.
    pub fn purge(&self) {
        let ids: Vec<ProducerId> = {
            let state = self.shared.lock_state();
            state.records.keys().copied().collect()
        };
        for id in ids {
            lifecycle::release(&self.shared, id, "purged");
        }
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.shared.lock_state().records.len()
    }

    /// True when no subscription is active.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Taps the raw event stream.
    ///
    /// The receiver observes events published after this call; slow
    /// receivers lag per the bus contract.
    pub fn watch(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Releases everything, then stops the subscriber pump (if any) and
    /// drains its queues.
    pub async fn shutdown(&self) {
        self.purge();
        let router = {
            let mut router = self.router.lock().unwrap_or_else(PoisonError::into_inner);
            router.take()
        };
        if let Some(router) = router {
            router.stop().await;
        }
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.shared.bus
    }

    pub(crate) fn install_router(&self, handle: crate::subscribers::RouterHandle) {
        let mut router = self.router.lock().unwrap_or_else(PoisonError::into_inner);
        *router = Some(handle);
    }

    /// Marks the record bound and registers the destroy hook, backing out
    /// when the scope turns the registration down.
    fn bind_scope(&self, id: ProducerId, scope: &ScopeRef) {
        {
            let mut state = self.shared.lock_state();
            match state.records.get_mut(&id) {
                Some(record) if !record.bound => record.bound = true,
                _ => return,
            }
        }
        if !lifecycle::bind(&self.shared, id, scope) {
            let mut state = self.shared.lock_state();
            if let Some(record) = state.records.get_mut(&id) {
                record.bound = false;
            }
        }
    }

    /// Builds the emission sink for one attachment.
    ///
    /// The scope captured here is the one supplied at attach time; its
    /// notifier fires once per emission, after the cache write.
    fn make_sink(&self, id: ProducerId, epoch: u64, scope: Option<ScopeRef>) -> Sink<T> {
        let shared = Arc::clone(&self.shared);
        Box::new(move |value: T| {
            let live = {
                let mut guard = shared.lock_state();
                let state = &mut *guard;
                match state.records.get(&id) {
                    Some(record) if record.epoch == epoch => state.cache.store(id, value),
                    _ => false,
                }
            };
            if live {
                shared.bus.publish(Event::new(EventKind::Emitted).with_producer(id));
                if let Some(scope) = &scope {
                    scope.notify_update();
                }
            }
        })
    }

    /// Stores the handle returned by a finished attach call, unless the
    /// record was torn down mid-attach - then the handle is released on the
    /// spot.
    fn store_handle(&self, id: ProducerId, epoch: u64, handle: Option<Box<dyn Subscription>>) {
        let stale = {
            let mut state = self.shared.lock_state();
            match state.records.get_mut(&id) {
                Some(record) if record.epoch == epoch => {
                    record.handle = handle;
                    None
                }
                _ => handle,
            }
        };
        if let Some(handle) = stale {
            handle.unsubscribe();
        }
    }

    fn read(&self, id: ProducerId) -> View<T> {
        let state = self.shared.lock_state();
        match state.cache.get(id) {
            Some(slot) => match slot.value() {
                Some(value) => View::Ready(value.clone()),
                None => View::Pending,
            },
            None => View::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scope::{DestroyHook, OwnedScope, Scope};
    use crate::producers::{LegacySuccess, OnceSource, Producer, StreamSource, Subscribable, Thenable};
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Journal = Arc<Mutex<Vec<&'static str>>>;

    fn mux() -> Multiplexer<i32> {
        Multiplexer::new(MuxConfig::default())
    }

    /// Observable-like mock that counts subscribe calls, remembers its sink
    /// even after release, and counts handle releases.
    #[derive(Default)]
    struct CountingStream {
        journal: Journal,
        subscribes: AtomicUsize,
        releases: Arc<AtomicUsize>,
        sink: Mutex<Option<Sink<i32>>>,
    }

    impl CountingStream {
        fn with_journal(journal: &Journal) -> Self {
            Self {
                journal: Arc::clone(journal),
                ..Self::default()
            }
        }

        fn emit(&self, value: i32) {
            let guard = self.sink.lock().unwrap();
            if let Some(sink) = guard.as_ref() {
                sink(value);
            }
        }

        fn subscribe_count(&self) -> usize {
            self.subscribes.load(Ordering::SeqCst)
        }

        fn release_count(&self) -> usize {
            self.releases.load(Ordering::SeqCst)
        }
    }

    impl Producer<i32> for CountingStream {
        fn as_subscribable(&self) -> Option<&dyn Subscribable<i32>> {
            Some(self)
        }
    }

    impl Subscribable<i32> for CountingStream {
        fn subscribe(&self, sink: Sink<i32>) -> Option<Box<dyn Subscription>> {
            self.journal.lock().unwrap().push("subscribe");
            self.subscribes.fetch_add(1, Ordering::SeqCst);
            *self.sink.lock().unwrap() = Some(sink);
            Some(Box::new(CountingHandle {
                releases: Arc::clone(&self.releases),
            }))
        }
    }

    struct CountingHandle {
        releases: Arc<AtomicUsize>,
    }

    impl Subscription for CountingHandle {
        fn unsubscribe(self: Box<Self>) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Scope mock with observable notify/hook bookkeeping.
    struct ProbeScope {
        journal: Journal,
        notified: AtomicUsize,
        hooks: Mutex<Vec<DestroyHook>>,
        accept: bool,
    }

    impl ProbeScope {
        fn new(accept: bool) -> Self {
            Self {
                journal: Journal::default(),
                notified: AtomicUsize::new(0),
                hooks: Mutex::new(Vec::new()),
                accept,
            }
        }

        fn with_journal(journal: &Journal) -> Self {
            Self {
                journal: Arc::clone(journal),
                ..Self::new(true)
            }
        }

        fn fire(&self) {
            let hooks = std::mem::take(&mut *self.hooks.lock().unwrap());
            for hook in hooks {
                hook();
            }
        }

        fn notify_count(&self) -> usize {
            self.notified.load(Ordering::SeqCst)
        }
    }

    impl Scope for ProbeScope {
        fn on_destroy(&self, hook: DestroyHook) -> bool {
            if !self.accept {
                return false;
            }
            self.journal.lock().unwrap().push("hook_registered");
            self.hooks.lock().unwrap().push(hook);
            true
        }

        fn notify_update(&self) {
            self.notified.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Producer with no capability at all.
    struct Opaque;
    impl Producer<i32> for Opaque {}

    /// Legacy HTTP-style mock exposing both success and then.
    #[derive(Default)]
    struct LegacyHttp {
        sink: Mutex<Option<Sink<i32>>>,
        via_success: AtomicUsize,
        via_then: AtomicUsize,
    }

    impl LegacyHttp {
        fn deliver(&self, value: i32) {
            let guard = self.sink.lock().unwrap();
            if let Some(sink) = guard.as_ref() {
                sink(value);
            }
        }
    }

    impl Producer<i32> for LegacyHttp {
        fn as_legacy(&self) -> Option<&dyn LegacySuccess<i32>> {
            Some(self)
        }
        fn as_thenable(&self) -> Option<&dyn Thenable<i32>> {
            Some(self)
        }
    }

    impl LegacySuccess<i32> for LegacyHttp {
        fn success(&self, sink: Sink<i32>) {
            self.via_success.fetch_add(1, Ordering::SeqCst);
            *self.sink.lock().unwrap() = Some(sink);
        }
    }

    impl Thenable<i32> for LegacyHttp {
        fn then(&self, _sink: Sink<i32>) {
            self.via_then.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn drain_kinds(rx: &mut broadcast::Receiver<Event>) -> Vec<(EventKind, Option<ProducerId>)> {
        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push((ev.kind, ev.producer));
        }
        kinds
    }

    #[test]
    fn test_plain_value_passes_through() {
        let mux: Multiplexer<String> = Multiplexer::new(MuxConfig::default());

        let view = mux.resolve(&Query::Value("foo".to_string()), None);
        assert_eq!(view, View::Ready("foo".to_string()));

        // Empty is a value too, not an unresolved state.
        let view = mux.resolve(&Query::Value(String::new()), None);
        assert_eq!(view, View::Ready(String::new()));
        assert!(mux.is_empty());
    }

    #[test]
    fn test_none_value_passes_through() {
        let mux: Multiplexer<Option<i32>> = Multiplexer::new(MuxConfig::default());
        let view = mux.resolve(&Query::Value(None), None);
        assert_eq!(view, View::Ready(None));
        assert!(!view.is_pending());
    }

    #[test]
    fn test_inert_producer_handed_back_unchanged() {
        let mux = mux();
        let producer: ProducerRef<i32> = Arc::new(Opaque);
        let query = Query::Producer(Arc::clone(&producer));

        match mux.resolve(&query, None) {
            View::Inert(returned) => assert!(Arc::ptr_eq(&producer, &returned)),
            other => panic!("expected Inert, got {other:?}"),
        }
        // No identity, no registration.
        assert!(mux.is_empty());
        assert!(mux.peek(&query).is_inert());
    }

    #[test]
    fn test_unsettled_promise_reads_pending_then_zero() {
        let mux = mux();
        let source = Arc::new(OnceSource::new());
        let producer: ProducerRef<i32> = source.clone();
        let query = Query::Producer(producer);

        assert_eq!(mux.resolve(&query, None), View::Pending);

        source.settle(0);
        // A falsy-looking value is still a value.
        assert_eq!(mux.resolve(&query, None), View::Ready(0));
    }

    #[test]
    fn test_settled_promise_delivers_during_attach() {
        let mux = mux();
        let source = Arc::new(OnceSource::new());
        source.settle(42);

        let producer: ProducerRef<i32> = source.clone();
        let query = Query::Producer(producer);
        assert_eq!(mux.resolve(&query, None), View::Ready(42));
    }

    #[test]
    fn test_repeated_resolves_attach_once() {
        let mux = mux();
        let source = Arc::new(CountingStream::default());
        let producer: ProducerRef<i32> = source.clone();
        let query = Query::from(producer);

        mux.resolve(&query, None);
        mux.resolve(&query, None);
        mux.resolve(&query, None);

        assert_eq!(source.subscribe_count(), 1);
        assert_eq!(mux.len(), 1);
    }

    #[test]
    fn test_last_value_wins() {
        let mux = mux();
        let source = Arc::new(StreamSource::new());
        let producer: ProducerRef<i32> = source.clone();
        let query = Query::Producer(producer);

        mux.resolve(&query, None);

        source.emit(42);
        assert_eq!(mux.resolve(&query, None), View::Ready(42));

        source.emit(7);
        assert_eq!(mux.resolve(&query, None), View::Ready(7));
    }

    #[test]
    fn test_notifier_fires_once_per_emission() {
        let mux = mux();
        let source = Arc::new(CountingStream::default());
        let producer: ProducerRef<i32> = source.clone();
        let query = Query::Producer(producer);

        let scope = Arc::new(ProbeScope::new(true));
        let scope_ref: ScopeRef = scope.clone();

        mux.resolve(&query, Some(&scope_ref));
        assert_eq!(scope.notify_count(), 0);

        source.emit(5);
        assert_eq!(scope.notify_count(), 1);

        // Unchanged value still counts as an emission.
        source.emit(5);
        assert_eq!(scope.notify_count(), 2);
    }

    #[test]
    fn test_destroy_hook_registered_before_attach() {
        let mux = mux();
        let journal = Journal::default();
        let source = Arc::new(CountingStream::with_journal(&journal));
        let producer: ProducerRef<i32> = source.clone();
        let scope = Arc::new(ProbeScope::with_journal(&journal));
        let scope_ref: ScopeRef = scope.clone();

        mux.resolve(&Query::Producer(producer), Some(&scope_ref));

        assert_eq!(*journal.lock().unwrap(), vec!["hook_registered", "subscribe"]);
    }

    #[test]
    fn test_destroy_releases_and_next_resolve_reattaches() {
        let mux = mux();
        let source = Arc::new(CountingStream::default());
        let producer: ProducerRef<i32> = source.clone();
        let query = Query::Producer(producer);
        let scope = Arc::new(ProbeScope::new(true));
        let scope_ref: ScopeRef = scope.clone();

        mux.resolve(&query, Some(&scope_ref));
        source.emit(1);
        assert_eq!(mux.resolve(&query, Some(&scope_ref)), View::Ready(1));

        scope.fire();
        assert_eq!(source.release_count(), 1);
        assert!(mux.is_empty());

        // Cached value is gone; the same producer attaches from scratch.
        assert_eq!(mux.resolve(&query, None), View::Pending);
        assert_eq!(source.subscribe_count(), 2);
    }

    #[test]
    fn test_released_identity_tag_is_reused() {
        let mux = mux();
        let mut rx = mux.watch();
        let source = Arc::new(CountingStream::default());
        let producer: ProducerRef<i32> = source.clone();
        let query = Query::Producer(producer);
        let scope = Arc::new(OwnedScope::new());
        let scope_ref: ScopeRef = scope.clone();

        mux.resolve(&query, Some(&scope_ref));
        scope.destroy();
        mux.resolve(&query, None);

        let events = drain_kinds(&mut rx);
        let kinds: Vec<EventKind> = events.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::Attached, EventKind::Released, EventKind::Attached]
        );
        // Identity is keyed by the allocation, not by cache presence.
        assert_eq!(events[0].1, events[2].1);
    }

    #[test]
    fn test_scope_without_destroy_support_is_unmanaged() {
        let mux = mux();
        let source = Arc::new(CountingStream::default());
        let producer: ProducerRef<i32> = source.clone();
        let query = Query::Producer(producer);
        let scope = Arc::new(ProbeScope::new(false));
        let scope_ref: ScopeRef = scope.clone();

        mux.resolve(&query, Some(&scope_ref));
        source.emit(3);

        // The notifier capability still works without destruction support.
        assert_eq!(scope.notify_count(), 1);
        scope.fire();
        assert_eq!(mux.resolve(&query, None), View::Ready(3));
        assert_eq!(mux.len(), 1);
    }

    #[test]
    fn test_late_scope_binding_after_scopeless_attach() {
        let mux = mux();
        let source = Arc::new(CountingStream::default());
        let producer: ProducerRef<i32> = source.clone();
        let query = Query::Producer(Arc::clone(&producer));
        let scope = Arc::new(ProbeScope::new(true));
        let scope_ref: ScopeRef = scope.clone();

        mux.resolve(&query, None);
        mux.resolve(&query, Some(&scope_ref));

        scope.fire();
        assert_eq!(source.release_count(), 1);
        assert!(mux.is_empty());
    }

    #[test]
    fn test_detach_unknown_producer_errors() {
        let mux = mux();
        let producer: ProducerRef<i32> = Arc::new(CountingStream::default());

        assert_eq!(mux.detach(&producer), Err(MuxError::UnknownProducer));
    }

    #[test]
    fn test_detach_releases_subscription() {
        let mux = mux();
        let source = Arc::new(CountingStream::default());
        let producer: ProducerRef<i32> = source.clone();

        mux.resolve(&Query::Producer(Arc::clone(&producer)), None);
        assert_eq!(mux.detach(&producer), Ok(()));

        assert_eq!(source.release_count(), 1);
        assert!(mux.is_empty());
        assert_eq!(mux.detach(&producer), Err(MuxError::UnknownProducer));
    }

    #[test]
    fn test_purge_releases_everything() {
        let mux = mux();
        let first = Arc::new(CountingStream::default());
        let second = Arc::new(CountingStream::default());
        let p1: ProducerRef<i32> = first.clone();
        let p2: ProducerRef<i32> = second.clone();

        mux.resolve(&Query::Producer(p1), None);
        mux.resolve(&Query::Producer(p2), None);
        assert_eq!(mux.len(), 2);

        mux.purge();
        assert!(mux.is_empty());
        assert_eq!(first.release_count(), 1);
        assert_eq!(second.release_count(), 1);
    }

    #[test]
    fn test_stale_emission_after_release_is_discarded() {
        let mux = mux();
        let source = Arc::new(CountingStream::default());
        let producer: ProducerRef<i32> = source.clone();
        let query = Query::Producer(Arc::clone(&producer));

        mux.resolve(&query, None);
        source.emit(1);
        assert_eq!(mux.resolve(&query, None), View::Ready(1));

        mux.detach(&producer).expect("active subscription");

        // The mock still holds the old sink; its epoch is dead.
        source.emit(2);
        assert_eq!(mux.peek(&query), View::Pending);

        // A fresh attach starts unresolved and accepts new emissions.
        assert_eq!(mux.resolve(&query, None), View::Pending);
        source.emit(3);
        assert_eq!(mux.resolve(&query, None), View::Ready(3));
    }

    #[test]
    fn test_legacy_success_is_preferred_over_then() {
        let mux = mux();
        let source = Arc::new(LegacyHttp::default());
        let producer: ProducerRef<i32> = source.clone();
        let query = Query::Producer(producer);

        assert_eq!(mux.resolve(&query, None), View::Pending);
        assert_eq!(source.via_success.load(Ordering::SeqCst), 1);
        assert_eq!(source.via_then.load(Ordering::SeqCst), 0);

        source.deliver(200);
        assert_eq!(mux.resolve(&query, None), View::Ready(200));
    }

    #[test]
    fn test_peek_never_attaches() {
        let mux = mux();
        let source = Arc::new(CountingStream::default());
        let producer: ProducerRef<i32> = source.clone();
        let query = Query::Producer(producer);

        assert_eq!(mux.peek(&query), View::Pending);
        assert_eq!(source.subscribe_count(), 0);
        assert!(mux.is_empty());
    }
}
