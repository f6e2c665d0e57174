//! # Built-in producers.
//!
//! Two ready-made implementations of the capability traits so the crate is
//! usable without writing a producer by hand:
//!
//! - [`OnceSource`] — promise-like: settles exactly once; sinks registered
//!   after settlement observe the value immediately.
//! - [`StreamSource`] — stream-like: emits any number of values to every
//!   registered sink; each subscription can be released individually.
//!
//! Both are thread-safe and cheap to share behind an `Arc`, which is also
//! what gives them their identity for deduplication.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use super::producer::{Producer, Sink, Subscribable, Subscription, Thenable};

/// Promise-like producer that settles exactly once.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use valmux::{Multiplexer, MuxConfig, OnceSource, ProducerRef, Query, View};
///
/// let mux: Multiplexer<i32> = Multiplexer::new(MuxConfig::default());
/// let source = Arc::new(OnceSource::new());
/// let producer: ProducerRef<i32> = source.clone();
/// let query = Query::Producer(producer);
///
/// assert_eq!(mux.resolve(&query, None), View::Pending);
/// source.settle(7);
/// assert_eq!(mux.resolve(&query, None), View::Ready(7));
/// ```
pub struct OnceSource<T> {
    state: Mutex<OnceState<T>>,
}

struct OnceState<T> {
    value: Option<T>,
    waiters: Vec<Sink<T>>,
}

impl<T: Clone + Send + 'static> OnceSource<T> {
    /// Creates an unsettled source.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(OnceState {
                value: None,
                waiters: Vec::new(),
            }),
        }
    }

    /// Settles the source, delivering `value` to all waiting sinks in
    /// registration order. Calls after the first are ignored.
    pub fn settle(&self, value: T) {
        let waiters = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.value.is_some() {
                return;
            }
            state.value = Some(value.clone());
            std::mem::take(&mut state.waiters)
        };
        for sink in waiters {
            sink(value.clone());
        }
    }

    /// True once `settle` has been called.
    pub fn is_settled(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .value
            .is_some()
    }
}

impl<T: Clone + Send + 'static> Default for OnceSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Producer<T> for OnceSource<T> {
    fn as_thenable(&self) -> Option<&dyn Thenable<T>> {
        Some(self)
    }
}

impl<T: Clone + Send + 'static> Thenable<T> for OnceSource<T> {
    fn then(&self, sink: Sink<T>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.value.clone() {
            Some(value) => {
                drop(state);
                sink(value);
            }
            None => state.waiters.push(sink),
        }
    }
}

/// Stream-like producer that fans each emission out to all current sinks.
///
/// Subscriptions are released individually: the handle returned from
/// `subscribe` removes exactly the sink it registered.
pub struct StreamSource<T> {
    sinks: Arc<Mutex<Vec<(u64, Sink<T>)>>>,
    next: AtomicU64,
}

impl<T: Clone + Send + 'static> StreamSource<T> {
    /// Creates a source with no sinks.
    pub fn new() -> Self {
        Self {
            sinks: Arc::new(Mutex::new(Vec::new())),
            next: AtomicU64::new(1),
        }
    }

    /// Delivers `value` to every registered sink, in registration order.
    pub fn emit(&self, value: T) {
        let sinks = self.sinks.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, sink) in sinks.iter() {
            sink(value.clone());
        }
    }

    /// Number of currently registered sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<T: Clone + Send + 'static> Default for StreamSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Producer<T> for StreamSource<T> {
    fn as_subscribable(&self) -> Option<&dyn Subscribable<T>> {
        Some(self)
    }
}

impl<T: Clone + Send + 'static> Subscribable<T> for StreamSource<T> {
    fn subscribe(&self, sink: Sink<T>) -> Option<Box<dyn Subscription>> {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, sink));
        Some(Box::new(StreamSubscription {
            sinks: Arc::downgrade(&self.sinks),
            id,
        }))
    }
}

/// Handle removing one sink from its [`StreamSource`].
///
/// Holds only a weak reference, so an outstanding handle never keeps the
/// source alive.
struct StreamSubscription<T> {
    sinks: Weak<Mutex<Vec<(u64, Sink<T>)>>>,
    id: u64,
}

impl<T: Send + 'static> Subscription for StreamSubscription<T> {
    fn unsubscribe(self: Box<Self>) {
        if let Some(sinks) = self.sinks.upgrade() {
            sinks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI64;

    fn recording_sink(seen: &Arc<Mutex<Vec<i32>>>) -> Sink<i32> {
        let seen = Arc::clone(seen);
        Box::new(move |value| seen.lock().unwrap().push(value))
    }

    #[test]
    fn test_once_source_delivers_to_waiting_sink() {
        let source: OnceSource<i32> = OnceSource::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        source.then(recording_sink(&seen));

        assert!(seen.lock().unwrap().is_empty());
        source.settle(5);
        assert_eq!(*seen.lock().unwrap(), vec![5]);
    }

    #[test]
    fn test_once_source_settled_delivers_immediately() {
        let source: OnceSource<i32> = OnceSource::new();
        source.settle(9);

        let seen = Arc::new(Mutex::new(Vec::new()));
        source.then(recording_sink(&seen));
        assert_eq!(*seen.lock().unwrap(), vec![9]);
    }

    #[test]
    fn test_once_source_settles_only_once() {
        let source: OnceSource<i32> = OnceSource::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        source.then(recording_sink(&seen));

        source.settle(1);
        source.settle(2);

        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert!(source.is_settled());
    }

    #[test]
    fn test_stream_source_fans_out_in_order() {
        let source: StreamSource<i32> = StreamSource::new();
        let total = Arc::new(AtomicI64::new(0));

        for _ in 0..3 {
            let total = Arc::clone(&total);
            source.subscribe(Box::new(move |value| {
                total.fetch_add(i64::from(value), Ordering::SeqCst);
            }));
        }

        source.emit(10);
        assert_eq!(total.load(Ordering::SeqCst), 30);
    }

    #[test]
    fn test_stream_source_unsubscribe_removes_one_sink() {
        let source: StreamSource<i32> = StreamSource::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let handle = source.subscribe(recording_sink(&seen)).expect("handle");
        source.subscribe(recording_sink(&seen));
        assert_eq!(source.sink_count(), 2);

        source.emit(1);
        handle.unsubscribe();
        assert_eq!(source.sink_count(), 1);

        source.emit(2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 1, 2]);
    }
}
