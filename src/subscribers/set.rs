//! # SubscriberSet: non-blocking fan-out over multiple subscribers.
//!
//! [`SubscriberSet`] distributes each [`Event`] to multiple subscribers
//! **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and logged (isolation).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow (events are dropped for
//!   that subscriber).

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::Event;

use super::Subscribe;

/// Per-subscriber channel with metadata
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    ///
    /// Requires a running Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let s = Arc::clone(&sub);

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = s.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        eprintln!("[valmux] subscriber '{}' panicked: {:?}", s.name(), panic_err);
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fan-out one event to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the event is
    /// dropped for it and a warning is logged with the subscriber's name.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    eprintln!(
                        "[valmux] subscriber '{}' dropped event: queue full",
                        channel.name
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    eprintln!(
                        "[valmux] subscriber '{}' dropped event: worker closed",
                        channel.name
                    );
                }
            }
        }
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Forward(mpsc::UnboundedSender<EventKind>);

    #[async_trait]
    impl Subscribe for Forward {
        async fn on_event(&self, event: &Event) {
            let _ = self.0.send(event.kind);
        }

        fn name(&self) -> &'static str {
            "forward"
        }

        fn queue_capacity(&self) -> usize {
            4
        }
    }

    #[tokio::test]
    async fn test_emit_reaches_every_subscriber() {
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let set = SubscriberSet::new(vec![Arc::new(Forward(tx_a)), Arc::new(Forward(tx_b))]);
        assert_eq!(set.len(), 2);

        set.emit(&Event::new(EventKind::Attached));

        for rx in [&mut rx_a, &mut rx_b] {
            let kind = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("delivered in time")
                .expect("channel open");
            assert_eq!(kind, EventKind::Attached);
        }

        set.shutdown().await;
    }

    struct Tiny(mpsc::UnboundedSender<EventKind>);

    #[async_trait]
    impl Subscribe for Tiny {
        async fn on_event(&self, event: &Event) {
            let _ = self.0.send(event.kind);
        }

        fn name(&self) -> &'static str {
            "tiny"
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn test_overflow_drops_for_that_subscriber_only() {
        let (tx_tiny, mut rx_tiny) = mpsc::unbounded_channel();
        let (tx_big, mut rx_big) = mpsc::unbounded_channel();
        let set = SubscriberSet::new(vec![Arc::new(Tiny(tx_tiny)), Arc::new(Forward(tx_big))]);

        // Workers get no chance to drain between these sends on a
        // current-thread runtime, so the capacity-1 queue overflows.
        for _ in 0..3 {
            set.emit(&Event::new(EventKind::Emitted));
        }
        set.shutdown().await;

        let mut tiny = 0;
        while rx_tiny.recv().await.is_some() {
            tiny += 1;
        }
        let mut big = 0;
        while rx_big.recv().await.is_some() {
            big += 1;
        }
        assert_eq!(tiny, 1);
        assert_eq!(big, 3);
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let set = SubscriberSet::new(vec![Arc::new(Forward(tx))]);

        set.emit(&Event::new(EventKind::Attached));
        set.emit(&Event::new(EventKind::Emitted));
        set.shutdown().await;

        assert_eq!(rx.recv().await, Some(EventKind::Attached));
        assert_eq!(rx.recv().await, Some(EventKind::Emitted));
        assert_eq!(rx.recv().await, None);
    }
}
