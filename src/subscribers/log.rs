//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [attached] producer=#1 shape=subscribable
//! [emitted] producer=#1
//! [released] producer=#1 reason=scope_destroyed
//! [listener-lagged] reason=skipped 12 events
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use - implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let producer = e
            .producer
            .map(|id| id.to_string())
            .unwrap_or_else(|| "?".to_string());

        match e.kind {
            EventKind::Attached => {
                let shape = e.shape.map(|s| s.as_label()).unwrap_or("?");
                println!("[attached] producer={producer} shape={shape}");
            }
            EventKind::Emitted => {
                println!("[emitted] producer={producer}");
            }
            EventKind::Released => {
                let reason = e.reason.as_deref().unwrap_or("?");
                println!("[released] producer={producer} reason={reason}");
            }
            EventKind::ListenerLagged => {
                let reason = e.reason.as_deref().unwrap_or("?");
                println!("[listener-lagged] reason={reason}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
