//! Count-based eviction.
//!
//! Keeps at most `max_entries` files after each write by removing the oldest
//! by mtime. Since the cache only writes each file once, mtime order is write
//! order and this is FIFO rather than LRU: reads never refresh an entry.

use tracing::debug;

use super::store::{remove_quietly, CacheStore};

/// Caps the number of stored entries.
pub struct EvictionManager<'a> {
    store: &'a CacheStore,
}

impl<'a> EvictionManager<'a> {
    pub fn new(store: &'a CacheStore) -> Self {
        Self { store }
    }

    /// Delete the oldest entries until at most `max_entries` remain.
    ///
    /// Returns the number of files this call removed. Under concurrent
    /// writers the cap can be transiently exceeded.
    pub fn enforce(&self, max_entries: usize) -> usize {
        let Ok(entries) = self.store.list() else {
            return 0;
        };
        if entries.len() <= max_entries {
            return 0;
        }

        let surplus = entries.len() - max_entries;
        let removed = entries
            .iter()
            .take(surplus)
            .filter(|entry| remove_quietly(&entry.path))
            .count();

        debug!(removed, max_entries, "Evicted oldest cache entries");
        removed
    }
}
