//! # Router: bus-to-subscriber pump.
//!
//! One background task subscribes to the [`Bus`] and forwards every event to
//! the [`SubscriberSet`]:
//!
//! ```text
//! Publishers (many):                      Subscribers (many):
//!   resolve/attach ──┐
//!   emission sinks ──┼──► Bus ──► Router ──► SubscriberSet ──► on_event()
//!   teardown hooks ──┘  (broadcast)  (pump)   (per-sub queues)
//! ```
//!
//! ## Rules
//! - The pump stops on cancellation or when the bus closes. Events the bus
//!   already accepted are still forwarded, and the set is drained, so a stop
//!   never loses what was published before it.
//! - When the pump lags behind the bus it publishes
//!   [`EventKind::ListenerLagged`] and keeps going; skipped events are lost.

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};

use super::SubscriberSet;

pub(crate) struct Router;

impl Router {
    /// Spawns the pump task. Requires a running Tokio runtime.
    pub(crate) fn spawn(bus: &Bus, set: SubscriberSet, token: CancellationToken) -> RouterHandle {
        let mut rx = bus.subscribe();
        let bus = bus.clone();
        let stop = token.clone();

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            bus.publish(
                                Event::new(EventKind::ListenerLagged)
                                    .with_reason(format!("skipped {skipped} events")),
                            );
                            continue;
                        }
                    }
                }
            }

            // Stopping must not lose what the bus already accepted.
            loop {
                match rx.try_recv() {
                    Ok(ev) => set.emit(&ev),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }

            set.shutdown().await;
        });

        RouterHandle { token, join }
    }
}

/// Handle to a running pump; stopping it drains the subscriber queues.
pub(crate) struct RouterHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl RouterHandle {
    pub(crate) async fn stop(self) {
        self.token.cancel();
        let _ = self.join.await;
    }
}
