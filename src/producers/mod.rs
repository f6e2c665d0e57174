//! Producer abstractions: capability traits, classification, and built-in sources.

mod classify;
mod producer;
mod sources;

pub use classify::Shape;
pub(crate) use classify::classify;
pub use producer::{LegacySuccess, Producer, ProducerRef, Sink, Subscribable, Subscription, Thenable};
pub use sources::{OnceSource, StreamSource};
