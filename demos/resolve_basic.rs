//! Minimal end-to-end walkthrough: attach once, read synchronously, tear
//! down via scope destruction. No async runtime required.

use std::sync::Arc;

use valmux::{Multiplexer, MuxConfig, OwnedScope, ProducerRef, Query, ScopeRef, StreamSource};

fn main() {
    let mux: Multiplexer<i32> = Multiplexer::new(MuxConfig::default());

    let source = Arc::new(StreamSource::new());
    let producer: ProducerRef<i32> = source.clone();
    let query = Query::Producer(producer);

    let scope = Arc::new(OwnedScope::new());
    let scope_ref: ScopeRef = scope.clone();

    println!("before any emission: {:?}", mux.resolve(&query, Some(&scope_ref)));

    source.emit(42);
    println!("after emit(42):      {:?}", mux.resolve(&query, Some(&scope_ref)));

    source.emit(7);
    println!("after emit(7):       {:?}", mux.resolve(&query, Some(&scope_ref)));

    scope.destroy();
    println!("after destroy:       {:?}", mux.peek(&query));
    println!("active subscriptions: {}", mux.len());
}
