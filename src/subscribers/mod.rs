//! Observability fan-out: subscriber trait, per-subscriber queues, bus pump.

#[cfg(feature = "logging")]
mod log;
mod router;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use router::{Router, RouterHandle};
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
