//! Error types used by the multiplexer.
//!
//! The query path (`resolve`/`peek`) has no error channel: inert inputs are
//! passed through unchanged, and panics raised by foreign producer code
//! propagate to the caller. [`MuxError`] covers the explicit management
//! operations only.

use thiserror::Error;

/// # Errors produced by multiplexer management operations.
///
/// These represent failures of caller-driven bookkeeping, such as releasing
/// a producer that was never attached.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxError {
    /// The producer has no active subscription in this multiplexer.
    ///
    /// Returned by `detach` when the producer was never resolved here, or
    /// when its subscription was already released.
    #[error("no active subscription for this producer")]
    UnknownProducer,
}

impl MuxError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use valmux::MuxError;
    ///
    /// assert_eq!(MuxError::UnknownProducer.as_label(), "unknown_producer");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            MuxError::UnknownProducer => "unknown_producer",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            MuxError::UnknownProducer => "no active subscription for this producer".to_string(),
        }
    }
}
