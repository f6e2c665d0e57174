//! # Latest-value store.
//!
//! One [`Slot`] per queried identity, holding the most recent emission and a
//! presence flag. The flag is what keeps "no value yet" distinct from any
//! legitimately emitted value — including values that are zero, empty, or
//! `None` when the value type is itself an `Option`.
//!
//! ## Rules
//! - A slot exists iff its identity has been queried at least once.
//! - Emissions overwrite; last value wins, nothing is buffered.
//! - Release removes the slot; a later query re-creates it unresolved.

use std::collections::HashMap;

use super::identity::ProducerId;

/// Cache cell for one identity: the latest value, if any was emitted.
pub(crate) struct Slot<T> {
    value: Option<T>,
}

impl<T> Slot<T> {
    /// Latest emission, or `None` while unresolved.
    pub(crate) fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

/// Map from identity tag to latest known value plus presence flag.
pub(crate) struct ValueCache<T> {
    slots: HashMap<ProducerId, Slot<T>>,
}

impl<T> ValueCache<T> {
    pub(crate) fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            slots: match capacity {
                Some(capacity) => HashMap::with_capacity(capacity),
                None => HashMap::new(),
            },
        }
    }

    /// Creates the unresolved slot for a newly queried identity.
    pub(crate) fn open(&mut self, id: ProducerId) {
        self.slots.entry(id).or_insert(Slot { value: None });
    }

    /// Overwrites the slot with a fresh emission (last-value-wins).
    ///
    /// Returns `false` when the slot is gone — the subscription was released
    /// and the emission must be discarded rather than resurrect the entry.
    pub(crate) fn store(&mut self, id: ProducerId, value: T) -> bool {
        match self.slots.get_mut(&id) {
            Some(slot) => {
                slot.value = Some(value);
                true
            }
            None => false,
        }
    }

    pub(crate) fn get(&self, id: ProducerId) -> Option<&Slot<T>> {
        self.slots.get(&id)
    }

    pub(crate) fn remove(&mut self, id: ProducerId) -> bool {
        self.slots.remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> ProducerId {
        ProducerId::test_tag(n)
    }

    #[test]
    fn test_open_slot_is_unresolved() {
        let mut cache: ValueCache<i32> = ValueCache::with_capacity(None);
        let id = id(1);
        cache.open(id);

        let slot = cache.get(id).expect("slot exists");
        assert!(slot.value().is_none());
    }

    #[test]
    fn test_store_overwrites_last_value_wins() {
        let mut cache: ValueCache<i32> = ValueCache::with_capacity(Some(4));
        let id = id(1);
        cache.open(id);

        assert!(cache.store(id, 42));
        assert!(cache.store(id, 7));
        assert_eq!(cache.get(id).and_then(Slot::value), Some(&7));
    }

    #[test]
    fn test_zero_is_present_not_unresolved() {
        let mut cache: ValueCache<i32> = ValueCache::with_capacity(None);
        let id = id(1);
        cache.open(id);
        cache.store(id, 0);

        assert_eq!(cache.get(id).and_then(Slot::value), Some(&0));
    }

    #[test]
    fn test_none_of_option_type_is_a_value() {
        let mut cache: ValueCache<Option<i32>> = ValueCache::with_capacity(None);
        let id = id(1);

        cache.open(id);
        assert!(cache.get(id).expect("slot").value().is_none());

        cache.store(id, None);
        assert_eq!(cache.get(id).expect("slot").value(), Some(&None));
    }

    #[test]
    fn test_store_after_remove_is_discarded() {
        let mut cache: ValueCache<i32> = ValueCache::with_capacity(None);
        let id = id(1);
        cache.open(id);

        assert!(cache.remove(id));
        assert!(!cache.store(id, 1));
        assert!(cache.get(id).is_none());
    }
}
