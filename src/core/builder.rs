//! Builder wiring observability subscribers to a multiplexer.

use std::marker::PhantomData;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::subscribers::{Router, Subscribe, SubscriberSet};

use super::config::MuxConfig;
use super::mux::Multiplexer;

/// Builder for constructing a [`Multiplexer`] with optional subscribers.
///
/// ## Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use valmux::{Multiplexer, MuxConfig, Subscribe};
/// # struct Metrics;
/// # #[async_trait::async_trait]
/// # impl Subscribe for Metrics {
/// #     async fn on_event(&self, _event: &valmux::Event) {}
/// #     fn name(&self) -> &'static str { "metrics" }
/// # }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mux: Multiplexer<i32> = Multiplexer::builder(MuxConfig::default())
///     .with_subscriber(Arc::new(Metrics))
///     .build();
/// # mux.shutdown().await;
/// # }
/// ```
pub struct MultiplexerBuilder<T> {
    cfg: MuxConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    _values: PhantomData<fn() -> T>,
}

impl<T: Clone + Send + 'static> MultiplexerBuilder<T> {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: MuxConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            _values: PhantomData,
        }
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Replaces the subscriber list.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the multiplexer.
    ///
    /// When subscribers were supplied, this spawns the bus pump and the
    /// per-subscriber workers, which requires a running Tokio runtime. With
    /// no subscribers the result is identical to [`Multiplexer::new`] and
    /// needs no runtime.
    pub fn build(self) -> Multiplexer<T> {
        let mux = Multiplexer::new(self.cfg);
        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers);
            let handle = Router::spawn(mux.bus(), set, CancellationToken::new());
            mux.install_router(handle);
        }
        mux
    }
}
