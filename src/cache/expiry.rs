//! Time-based bulk cleanup.
//!
//! Sweeps run at the start of every write; there is no background timer.
//! The sweep uses file mtime as a cheap stand-in for age. The read path does
//! its own precise check against the timestamp stored inside the entry.

use std::time::{Duration, SystemTime};

use tracing::debug;

use super::store::{remove_quietly, CacheStore};

/// Removes entries whose file mtime is older than the TTL.
pub struct ExpiryManager<'a> {
    store: &'a CacheStore,
    ttl: Duration,
}

impl<'a> ExpiryManager<'a> {
    pub fn new(store: &'a CacheStore, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Delete every entry modified more than `ttl` before `now`.
    ///
    /// Returns the number of files this call removed. Listing failures and
    /// individual delete failures are ignored.
    pub fn sweep(&self, now: SystemTime) -> usize {
        let Ok(entries) = self.store.list() else {
            return 0;
        };

        let mut removed = 0;
        for entry in entries {
            let age = now.duration_since(entry.modified).unwrap_or_default();
            if age > self.ttl && remove_quietly(&entry.path) {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "Swept expired cache entries");
        }
        removed
    }
}
