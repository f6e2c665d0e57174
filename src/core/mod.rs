//! Core runtime: the multiplexer, its configuration, and scope binding.

mod builder;
mod config;
mod lifecycle;
mod mux;
mod scope;

pub use builder::MultiplexerBuilder;
pub use config::MuxConfig;
pub use mux::{Multiplexer, Query, View};
pub use scope::{DestroyHook, OwnedScope, Scope, ScopeRef};
