//! Observability demo: route multiplexer events through the built-in
//! LogWriter subscriber.
//!
//! Run with: `cargo run --example observed --features logging`

use std::sync::Arc;
use std::time::Duration;

use valmux::{LogWriter, Multiplexer, MuxConfig, OnceSource, ProducerRef, Query};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let mux: Multiplexer<String> = Multiplexer::builder(MuxConfig::default())
        .with_subscriber(Arc::new(LogWriter))
        .build();

    let source = Arc::new(OnceSource::new());
    let producer: ProducerRef<String> = source.clone();
    let query = Query::Producer(producer.clone());

    mux.resolve(&query, None);
    source.settle("hello".to_string());
    mux.detach(&producer).expect("active subscription");

    // Let the pump catch up before draining it for good.
    tokio::time::sleep(Duration::from_millis(50)).await;
    mux.shutdown().await;
}
