//! # valmux
//!
//! **valmux** is a value-caching subscription multiplexer for Rust.
//!
//! Given an arbitrary asynchronous producer - promise-like or stream-like -
//! it attaches to the producer exactly once no matter how many times it is
//! queried, caches the most recently emitted value, and exposes that value
//! synchronously on every query. A scope's destruction signal releases the
//! subscription and discards the cached value. The crate is designed as a
//! building block for rendering layers and other consumers that re-read
//! async state on every pass.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌────────────┐   ┌────────────┐   ┌────────────┐
//!  │  Producer  │   │  Producer  │   │  Producer  │
//!  │ (stream)   │   │ (promise)  │   │  (legacy)  │
//!  └─────┬──────┘   └─────┬──────┘   └─────┬──────┘
//!        ▼                ▼                ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  Multiplexer                                              │
//! │  - Registrar (identity tags, Weak side table)             │
//! │  - ValueCache (latest value + presence flag per tag)      │
//! │  - Records (one active subscription per tag, epoch)       │
//! │  - Bus (broadcast events)                                 │
//! └──────┬──────────────────────┬─────────────────────┬───────┘
//!        │ resolve(query,scope) │ sink(value)         │ events
//!        ▼                      ▼                     ▼
//!   View::Ready |      cache overwrite +       Router ─► SubscriberSet
//!   View::Pending |    scope.notify_update()         ┌─────┼─────┐
//!   View::Inert                                      ▼     ▼     ▼
//!                                                  sub1  sub2  subN
//! ```
//!
//! ### Lifecycle
//! ```text
//! resolve(producer, scope)
//!   ├─► classify: Subscribable | Legacy | Thenable | inert
//!   ├─► first sight: reserve tag, open unresolved slot,
//!   │     bind scope destroy hook, attach(sink) once
//!   ├─► every emission: overwrite slot, notify scope
//!   └─► every call: return latest view, synchronously
//!
//! scope destroyed / detach / purge
//!   └─► remove record + slot atomically, unsubscribe handle,
//!       publish Released; next resolve re-attaches, same tag
//! ```
//!
//! ## Features
//! | Area              | Description                                                         | Key types / traits                    |
//! |-------------------|---------------------------------------------------------------------|---------------------------------------|
//! | **Queries**       | Deduplicated attachment, synchronous cached reads.                  | [`Multiplexer`], [`Query`], [`View`]  |
//! | **Producers**     | Duck-shaped capability contract plus built-in sources.              | [`Producer`], [`OnceSource`], [`StreamSource`] |
//! | **Scopes**        | Destruction-bound teardown and per-emission notification.           | [`Scope`], [`OwnedScope`]             |
//! | **Subscriber API**| Hook into multiplexer events (logging, metrics, custom subscribers).| [`Subscribe`]                         |
//! | **Errors**        | Typed errors for management operations.                             | [`MuxError`]                          |
//! | **Configuration** | Centralize instance settings.                                       | [`MuxConfig`]                         |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use valmux::{Multiplexer, MuxConfig, OwnedScope, ProducerRef, Query, ScopeRef, StreamSource, View};
//!
//! let mux: Multiplexer<i32> = Multiplexer::new(MuxConfig::default());
//!
//! let source = Arc::new(StreamSource::new());
//! let producer: ProducerRef<i32> = source.clone();
//! let query = Query::Producer(producer);
//!
//! let scope = Arc::new(OwnedScope::new());
//! let scope_ref: ScopeRef = scope.clone();
//!
//! // Nothing emitted yet: the view is pending, never a fake default.
//! assert_eq!(mux.resolve(&query, Some(&scope_ref)), View::Pending);
//!
//! source.emit(42);
//! assert_eq!(mux.resolve(&query, Some(&scope_ref)), View::Ready(42));
//!
//! // Destroying the scope releases the subscription and the cached value.
//! scope.destroy();
//! assert!(mux.is_empty());
//! ```

mod cache;
mod core;
mod error;
mod events;
mod producers;
mod subscribers;

// ---- Public re-exports ----

pub use cache::ProducerId;
pub use core::{
    DestroyHook, Multiplexer, MultiplexerBuilder, MuxConfig, OwnedScope, Query, Scope, ScopeRef,
    View,
};
pub use error::MuxError;
pub use events::{Event, EventKind};
pub use producers::{
    LegacySuccess, OnceSource, Producer, ProducerRef, Shape, Sink, StreamSource, Subscribable,
    Subscription, Thenable,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
