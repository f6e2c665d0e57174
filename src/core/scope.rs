//! # Scope: a bounded external lifetime.
//!
//! A [`Scope`] is whatever the embedding layer uses to delimit how long a
//! cached subscription should live - a view, a request, a session. Both of
//! its capabilities are optional:
//!
//! - a **destruction signal** ([`Scope::on_destroy`]) that, once fired,
//!   releases the subscription bound to it and discards the cached value;
//! - an **update notifier** ([`Scope::notify_update`]) invoked once per
//!   emission so a dependent view can re-read the cache.
//!
//! A scope without destruction support leaves entry lifetime unmanaged: the
//! subscription and its cache slot then persist until the caller detaches
//! them or the multiplexer is dropped.
//!
//! [`OwnedScope`] is a ready-made implementation for embedders that do not
//! bring their own lifecycle object.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// One-shot callback fired when a scope is destroyed.
pub type DestroyHook = Box<dyn FnOnce() + Send + 'static>;

/// Shared handle to a scope.
pub type ScopeRef = Arc<dyn Scope>;

/// External lifecycle object with optional capabilities.
///
/// Both methods have "capability absent" defaults, so implementors opt into
/// exactly the hooks their lifecycle model supports.
pub trait Scope: Send + Sync + 'static {
    /// Registers a one-shot destruction hook.
    ///
    /// Returns `true` when the hook was accepted (it will fire exactly once
    /// when the scope dies). The default drops the hook and returns `false`:
    /// no destruction signal is available.
    fn on_destroy(&self, hook: DestroyHook) -> bool {
        drop(hook);
        false
    }

    /// Requests that dependent consumers re-read the cache.
    ///
    /// Invoked synchronously once per emission, never before the first one.
    /// The default is a no-op.
    fn notify_update(&self) {}
}

/// Self-contained scope with explicit and RAII destruction.
///
/// Hooks run exactly once, in registration order, on the first of:
/// an explicit [`destroy`](OwnedScope::destroy) call or drop. Hooks
/// registered after destruction fire immediately, so late binders release
/// their resources promptly instead of leaking them.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use valmux::{OwnedScope, Scope, ScopeRef};
///
/// let scope = Arc::new(OwnedScope::new());
/// let as_scope: ScopeRef = scope.clone();
///
/// as_scope.on_destroy(Box::new(|| println!("torn down")));
/// scope.destroy();
/// assert!(scope.is_destroyed());
/// ```
pub struct OwnedScope {
    hooks: Mutex<Vec<DestroyHook>>,
    destroyed: AtomicBool,
    notifier: Option<Box<dyn Fn() + Send + Sync + 'static>>,
}

impl OwnedScope {
    /// Creates a live scope with no update notifier.
    pub fn new() -> Self {
        Self {
            hooks: Mutex::new(Vec::new()),
            destroyed: AtomicBool::new(false),
            notifier: None,
        }
    }

    /// Creates a live scope whose `notify_update` invokes `notifier`.
    pub fn with_notifier(notifier: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            hooks: Mutex::new(Vec::new()),
            destroyed: AtomicBool::new(false),
            notifier: Some(Box::new(notifier)),
        }
    }

    /// Fires all registered hooks once, in registration order.
    ///
    /// Idempotent: only the first call (or drop) runs the hooks.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        let hooks = {
            let mut hooks = self.hooks.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *hooks)
        };
        for hook in hooks {
            hook();
        }
    }

    /// True once `destroy` ran (explicitly or via drop).
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl Default for OwnedScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope for OwnedScope {
    fn on_destroy(&self, hook: DestroyHook) -> bool {
        {
            let mut hooks = self.hooks.lock().unwrap_or_else(PoisonError::into_inner);
            if !self.destroyed.load(Ordering::SeqCst) {
                hooks.push(hook);
                return true;
            }
        }
        // Scope already died; release immediately rather than leak.
        hook();
        true
    }

    fn notify_update(&self) {
        if let Some(notifier) = &self.notifier {
            notifier();
        }
    }
}

impl Drop for OwnedScope {
    fn drop(&mut self) {
        self.destroy();
    }
}
