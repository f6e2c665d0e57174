//! # Producer capability contract.
//!
//! A producer is any shared object that will deliver one or more values of
//! type `T` at times of its own choosing. Producers are distinguished by
//! **referential identity** (their allocation), never by value equality, and
//! they do not share one concrete type: each advertises the capabilities it
//! supports through the probe methods on [`Producer`].
//!
//! Three capability shapes exist:
//! - [`Subscribable`] — multi-shot, stream-like (`subscribe(sink) -> handle`);
//! - [`LegacySuccess`] — one-shot success-callback shape kept for older
//!   HTTP-client style producers (`success(sink)`);
//! - [`Thenable`] — one-shot, promise-like (`then(sink)`).
//!
//! A producer may support several shapes at once; selection between them is
//! the classifier's business (see [`Shape`](crate::Shape) for the priority).
//!
//! ## Example
//! ```rust
//! use valmux::{Producer, Sink, Thenable};
//!
//! struct Settled(i32);
//!
//! impl Producer<i32> for Settled {
//!     fn as_thenable(&self) -> Option<&dyn Thenable<i32>> {
//!         Some(self)
//!     }
//! }
//!
//! impl Thenable<i32> for Settled {
//!     fn then(&self, sink: Sink<i32>) {
//!         sink(self.0);
//!     }
//! }
//! ```

use std::sync::Arc;

/// Callback handed to a producer at attachment; invoked once per emission.
///
/// The sink may be called synchronously from inside the attach call (an
/// already-settled promise-like does exactly that) or later from any thread.
pub type Sink<T> = Box<dyn Fn(T) + Send + Sync + 'static>;

/// Shared handle to a producer, the unit of identity for deduplication.
pub type ProducerRef<T> = Arc<dyn Producer<T>>;

/// # Asynchronous value producer, probed for its capability shape.
///
/// All probes default to `None`; implementors override the ones they
/// support. An implementor overriding none of them is *inert*: queries hand
/// it back unchanged instead of attaching (see
/// [`View::Inert`](crate::View::Inert)).
pub trait Producer<T>: Send + Sync + 'static {
    /// Multi-shot subscribe capability, probed first.
    fn as_subscribable(&self) -> Option<&dyn Subscribable<T>> {
        None
    }

    /// Legacy success-callback capability, probed second.
    fn as_legacy(&self) -> Option<&dyn LegacySuccess<T>> {
        None
    }

    /// One-shot then capability, probed last.
    fn as_thenable(&self) -> Option<&dyn Thenable<T>> {
        None
    }
}

/// Stream-like capability: may emit any number of values over time.
pub trait Subscribable<T> {
    /// Registers the sink and returns an optional release handle.
    ///
    /// `None` means the producer offers no explicit release; teardown for
    /// such subscriptions is a no-op.
    fn subscribe(&self, sink: Sink<T>) -> Option<Box<dyn Subscription>>;
}

/// Legacy one-shot capability for success-callback producers.
pub trait LegacySuccess<T> {
    /// Registers the sink; it observes the settled value at most once.
    fn success(&self, sink: Sink<T>);
}

/// Promise-like one-shot capability.
pub trait Thenable<T> {
    /// Registers the sink; it observes the settled value at most once.
    ///
    /// If the producer already settled, implementations are expected to
    /// invoke the sink synchronously before returning.
    fn then(&self, sink: Sink<T>);
}

/// Opaque release handle returned by a [`Subscribable`] attachment.
///
/// Consumed exactly once when the owning subscription is torn down.
pub trait Subscription: Send + 'static {
    /// Releases the producer-side resources for this subscription.
    fn unsubscribe(self: Box<Self>);
}
