//! # Lifecycle binding: scope destruction releases the subscription.
//!
//! [`bind`] hands a scope a one-shot hook for one identity tag. When the
//! scope fires it, the subscription record and the cache slot are removed
//! under a single lock acquisition, then the handle (if any) is released
//! outside the lock. The hook holds only a weak reference to the shared
//! state, so a long-lived scope never keeps a dropped multiplexer alive.
//!
//! [`release`] is the shared teardown primitive; `detach` and `purge` go
//! through it as well, with their own reason labels.

use std::sync::Arc;

use crate::cache::ProducerId;
use crate::events::{Event, EventKind};

use super::mux::Shared;
use super::scope::{DestroyHook, ScopeRef};

/// Registers a destroy hook for `id` on the scope.
///
/// Returns the scope's answer: `false` means the scope has no destruction
/// signal and entry lifetime stays unmanaged.
pub(crate) fn bind<T: Send + 'static>(
    shared: &Arc<Shared<T>>,
    id: ProducerId,
    scope: &ScopeRef,
) -> bool {
    let weak = Arc::downgrade(shared);
    let hook: DestroyHook = Box::new(move || {
        if let Some(shared) = weak.upgrade() {
            release(&shared, id, "scope_destroyed");
        }
    });
    scope.on_destroy(hook)
}

/// Removes the subscription record and cache slot for `id` atomically,
/// releases the handle, and publishes [`EventKind::Released`].
///
/// Returns `false` when no active record existed (already released, or
/// never attached).
pub(crate) fn release<T: 'static>(shared: &Shared<T>, id: ProducerId, reason: &'static str) -> bool {
    let handle = {
        let mut state = shared.lock_state();
        let Some(record) = state.records.remove(&id) else {
            return false;
        };
        state.cache.remove(id);
        state.registrar.compact();
        record.handle
    };
    if let Some(handle) = handle {
        handle.unsubscribe();
    }
    shared
        .bus
        .publish(Event::new(EventKind::Released).with_producer(id).with_reason(reason));
    true
}
