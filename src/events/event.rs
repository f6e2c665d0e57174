//! # Runtime events emitted by the multiplexer.
//!
//! [`EventKind`] classifies what happened to a producer's subscription;
//! [`Event`] carries the metadata: a monotonic sequence number, a wall-clock
//! timestamp, and optional identity/shape/reason fields depending on the
//! kind.
//!
//! Events are observability only. The query path never waits on them, and
//! they are distinct from the scope's `notify_update` hook, which is a
//! synchronous per-emission callback owned by the embedding layer.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::cache::ProducerId;
use crate::producers::Shape;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of multiplexer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A producer was attached for the first time under its identity.
    ///
    /// Sets:
    /// - `producer`: identity tag
    /// - `shape`: selected capability
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Attached,

    /// A producer delivered a value; the cache slot was overwritten.
    ///
    /// Sets:
    /// - `producer`: identity tag
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Emitted,

    /// A subscription and its cache slot were released.
    ///
    /// Sets:
    /// - `producer`: identity tag
    /// - `reason`: `"scope_destroyed"`, `"detached"`, or `"purged"`
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Released,

    /// The subscriber pump fell behind the bus and skipped events.
    ///
    /// Sets:
    /// - `reason`: how many events were skipped
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ListenerLagged,
}

/// Multiplexer event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Identity tag of the producer, if applicable.
    pub producer: Option<ProducerId>,
    /// Capability shape selected at attachment.
    pub shape: Option<Shape>,
    /// Human-readable reason (release cause, lag details, etc.).
    pub reason: Option<Arc<str>>,
    /// Event classification.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            producer: None,
            shape: None,
            reason: None,
            kind,
        }
    }

    /// Attaches the producer's identity tag.
    #[inline]
    pub fn with_producer(mut self, id: ProducerId) -> Self {
        self.producer = Some(id);
        self
    }

    /// Attaches the selected capability shape.
    #[inline]
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let first = Event::new(EventKind::Attached);
        let second = Event::new(EventKind::Emitted);
        assert!(second.seq > first.seq);
    }

    #[test]
    fn test_builders_set_fields() {
        let id = crate::cache::ProducerId::test_tag(3);
        let ev = Event::new(EventKind::Released)
            .with_producer(id)
            .with_reason("detached");

        assert_eq!(ev.kind, EventKind::Released);
        assert_eq!(ev.producer, Some(id));
        assert_eq!(ev.reason.as_deref(), Some("detached"));
        assert!(ev.shape.is_none());
    }
}
