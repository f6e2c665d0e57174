//! # Identity side table.
//!
//! Producers carry no common interface and no intrinsic key: the only thing
//! that tells two of them apart is which allocation they live in. The
//! [`Registrar`] memoizes a stable [`ProducerId`] per allocation in a side
//! table, without touching the producer itself.
//!
//! ## Rules
//! - Tags start at 1 and increase monotonically; a tag is never re-issued to
//!   a *different* allocation.
//! - Entries are non-owning (`Weak`): the registrar never extends a
//!   producer's lifetime.
//! - An entry whose producer has been dropped is dead. If its address is
//!   later reused by a new allocation, the dead entry is replaced and a
//!   fresh tag assigned.
//! - Releasing a subscription does not remove the entry: a still-alive
//!   producer keeps its tag across detach/re-attach cycles.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::producers::{Producer, ProducerRef};

/// Stable identity tag for one producer allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProducerId(u64);

impl ProducerId {
    /// The underlying integer, monotonically assigned from 1.
    pub fn get(self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn test_tag(n: u64) -> Self {
        ProducerId(n)
    }
}

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Entry<T> {
    origin: Weak<dyn Producer<T>>,
    id: ProducerId,
}

/// Side table mapping producer allocations to identity tags.
pub(crate) struct Registrar<T> {
    entries: HashMap<usize, Entry<T>>,
    next: u64,
}

impl<T: 'static> Registrar<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next: 1,
        }
    }

    fn address(producer: &ProducerRef<T>) -> usize {
        Arc::as_ptr(producer) as *const () as usize
    }

    /// Returns the memoized tag for this allocation, assigning a fresh one
    /// on first encounter or when a dead entry's address was reused.
    pub(crate) fn assign(&mut self, producer: &ProducerRef<T>) -> ProducerId {
        let address = Self::address(producer);
        if let Some(entry) = self.entries.get(&address) {
            // The caller holds a strong reference, so a live entry at the
            // same address is necessarily the same allocation.
            if entry.origin.strong_count() > 0 {
                return entry.id;
            }
        }

        let id = ProducerId(self.next);
        self.next += 1;
        self.entries.insert(
            address,
            Entry {
                origin: Arc::downgrade(producer),
                id,
            },
        );
        id
    }

    /// Read-only probe; never assigns.
    pub(crate) fn lookup(&self, producer: &ProducerRef<T>) -> Option<ProducerId> {
        self.entries
            .get(&Self::address(producer))
            .filter(|entry| entry.origin.strong_count() > 0)
            .map(|entry| entry.id)
    }

    /// Drops dead entries. Bounded housekeeping, called on release paths.
    pub(crate) fn compact(&mut self) {
        self.entries
            .retain(|_, entry| entry.origin.strong_count() > 0);
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Null;
    impl Producer<i32> for Null {}

    fn producer() -> ProducerRef<i32> {
        Arc::new(Null)
    }

    #[test]
    fn test_tags_start_at_one_and_increase() {
        let mut registrar: Registrar<i32> = Registrar::new();
        let first = producer();
        let second = producer();

        assert_eq!(registrar.assign(&first).get(), 1);
        assert_eq!(registrar.assign(&second).get(), 2);
    }

    #[test]
    fn test_tag_is_stable_per_allocation() {
        let mut registrar: Registrar<i32> = Registrar::new();
        let p = producer();
        let alias = Arc::clone(&p);

        let id = registrar.assign(&p);
        assert_eq!(registrar.assign(&alias), id);
        assert_eq!(registrar.lookup(&p), Some(id));
    }

    #[test]
    fn test_lookup_never_assigns() {
        let registrar: Registrar<i32> = Registrar::new();
        assert_eq!(registrar.lookup(&producer()), None);
    }

    #[test]
    fn test_distinct_allocations_get_distinct_tags() {
        let mut registrar: Registrar<i32> = Registrar::new();
        let a = producer();
        let b = producer();

        assert_ne!(registrar.assign(&a), registrar.assign(&b));
    }

    #[test]
    fn test_compact_drops_dead_entries_only() {
        let mut registrar: Registrar<i32> = Registrar::new();
        let keep = producer();
        let drop_me = producer();

        let kept = registrar.assign(&keep);
        registrar.assign(&drop_me);
        drop(drop_me);

        registrar.compact();
        assert_eq!(registrar.entry_count(), 1);
        assert_eq!(registrar.lookup(&keep), Some(kept));
    }
}
