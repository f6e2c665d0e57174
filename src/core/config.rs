//! # Multiplexer configuration.
//!
//! Provides [`MuxConfig`] centralized settings for a [`Multiplexer`]
//! instance.
//!
//! ## Sentinel values
//! - `slot_capacity = 0` → no cache preallocation
//! - `bus_capacity` is clamped to a minimum of 1 by the bus
//!
//! [`Multiplexer`]: crate::Multiplexer

/// Configuration for one multiplexer instance.
///
/// ## Field semantics
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped)
/// - `slot_capacity`: cache slots to preallocate (`0` = none)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to
/// avoid sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Copy, Debug)]
pub struct MuxConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events observe
    /// `Lagged` and skip older items. Minimum value is 1 (enforced by the
    /// bus).
    pub bus_capacity: usize,

    /// Number of cache slots to preallocate.
    ///
    /// - `0` = no preallocation
    /// - `n > 0` = room for `n` identities before the map grows
    pub slot_capacity: usize,
}

impl MuxConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the preallocation size as an `Option`.
    ///
    /// - `None` → no preallocation
    /// - `Some(n)` → preallocate room for `n` identities
    #[inline]
    pub fn slot_capacity(&self) -> Option<usize> {
        if self.slot_capacity == 0 {
            None
        } else {
            Some(self.slot_capacity)
        }
    }
}

impl Default for MuxConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024` (good baseline)
    /// - `slot_capacity = 0` (no preallocation)
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            slot_capacity: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_accessors() {
        let cfg = MuxConfig {
            bus_capacity: 0,
            slot_capacity: 0,
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.slot_capacity(), None);

        let cfg = MuxConfig {
            bus_capacity: 16,
            slot_capacity: 8,
        };
        assert_eq!(cfg.bus_capacity_clamped(), 16);
        assert_eq!(cfg.slot_capacity(), Some(8));
    }
}
