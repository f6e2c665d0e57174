//! # Capability classification.
//!
//! [`classify`] inspects a producer's capability shape and returns the
//! attachment strategy to use, or `None` when the object exposes no async
//! capability at all (the caller then treats it as an ordinary value and
//! hands it back unchanged).
//!
//! ## Priority
//! Probes run in strict order:
//! 1. subscribe-style ([`Subscribable`]) — multi-shot,
//! 2. legacy success-callback ([`LegacySuccess`]),
//! 3. then-style ([`Thenable`]) — one-shot.
//!
//! Multi-shot producers are probed first so stream-like objects that also
//! expose a `then` shape are never mistaken for one-shot promises.

use super::producer::{LegacySuccess, Producer, Sink, Subscribable, Subscription, Thenable};

/// Classification tag of a producer's selected capability.
///
/// Carried on [`Attached`](crate::EventKind::Attached) events and useful in
/// logs/metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Multi-shot subscribe capability was selected.
    Subscribable,
    /// Legacy success-callback capability was selected.
    Legacy,
    /// One-shot then capability was selected.
    Thenable,
}

impl Shape {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Shape::Subscribable => "subscribable",
            Shape::Legacy => "legacy",
            Shape::Thenable => "thenable",
        }
    }
}

/// Attachment strategy selected for one producer, borrowed for one query.
pub(crate) enum Attachment<'a, T> {
    Subscribable(&'a dyn Subscribable<T>),
    Legacy(&'a dyn LegacySuccess<T>),
    Thenable(&'a dyn Thenable<T>),
}

impl<'a, T> Attachment<'a, T> {
    /// The classification tag for events and logs.
    pub(crate) fn shape(&self) -> Shape {
        match self {
            Attachment::Subscribable(_) => Shape::Subscribable,
            Attachment::Legacy(_) => Shape::Legacy,
            Attachment::Thenable(_) => Shape::Thenable,
        }
    }

    /// Hands the sink to the producer through the selected capability.
    ///
    /// Only subscribe-style attachments yield a release handle; the one-shot
    /// shapes have nothing to release.
    pub(crate) fn attach(self, sink: Sink<T>) -> Option<Box<dyn Subscription>> {
        match self {
            Attachment::Subscribable(subscribable) => subscribable.subscribe(sink),
            Attachment::Legacy(legacy) => {
                legacy.success(sink);
                None
            }
            Attachment::Thenable(thenable) => {
                thenable.then(sink);
                None
            }
        }
    }
}

/// Selects the attachment strategy for a producer, in strict priority order.
///
/// Returns `None` for inert producers (no capability exposed).
pub(crate) fn classify<T: 'static>(producer: &dyn Producer<T>) -> Option<Attachment<'_, T>> {
    if let Some(subscribable) = producer.as_subscribable() {
        return Some(Attachment::Subscribable(subscribable));
    }
    if let Some(legacy) = producer.as_legacy() {
        return Some(Attachment::Legacy(legacy));
    }
    producer.as_thenable().map(Attachment::Thenable)
}
