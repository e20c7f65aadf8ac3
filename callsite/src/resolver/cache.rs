//! Address to location memoization
//!
//! Symbol resolution walks DWARF line tables; a hot logging call site should
//! pay for that once. Return addresses are stable for the life of the process
//! and resolve deterministically, so entries are write-once and never
//! evicted. The number of distinct call sites is bounded by code size.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::Location;
use crate::symbolization::Address;

/// Hit and miss counters of a [`LocationCache`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Resolved locations keyed by return address, behind a single mutex.
#[derive(Debug, Default)]
pub struct LocationCache {
    entries: Mutex<HashMap<Address, Location>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LocationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of the cached location for `address`, if any.
    pub fn lookup(&self, address: Address) -> Option<Location> {
        let found = self.entries().get(&address).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Insert or overwrite the location for `address`.
    pub fn store(&self, address: Address, location: Location) {
        self.entries().insert(address, location);
    }

    /// Number of cached addresses
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    // Entries are write-once values, a panic elsewhere cannot leave one half-written
    fn entries(&self) -> MutexGuard<'_, HashMap<Address, Location>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
