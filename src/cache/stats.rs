//! Read-only cache diagnostics.

use std::path::PathBuf;

use serde::Serialize;

use super::store::CacheStore;
use crate::config::CacheConfig;

/// Snapshot of cache state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of entry files currently on disk (expired-but-unswept included).
    pub size: usize,
    /// Entry time-to-live in seconds.
    #[serde(rename = "ttl")]
    pub ttl_secs: u64,
    /// Entry cap enforced after each write.
    pub max_size: usize,
    pub cache_dir: PathBuf,
    /// Sum of entry file sizes.
    pub total_bytes: u64,
}

/// Builds [`CacheStats`] from the directory listing.
pub struct StatsReporter<'a> {
    store: &'a CacheStore,
    config: &'a CacheConfig,
}

impl<'a> StatsReporter<'a> {
    pub fn new(store: &'a CacheStore, config: &'a CacheConfig) -> Self {
        Self { store, config }
    }

    /// Collect stats. May create the cache directory; nothing else changes.
    pub fn report(&self) -> CacheStats {
        let _ = self.store.ensure_dir();
        let entries = self.store.list().unwrap_or_default();
        CacheStats {
            size: entries.len(),
            ttl_secs: self.config.ttl_secs,
            max_size: self.config.effective_max_entries(),
            cache_dir: self.config.dir.clone(),
            total_bytes: entries.iter().map(|e| e.bytes).sum(),
        }
    }
}
