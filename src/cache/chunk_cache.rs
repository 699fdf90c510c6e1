//! Chunk cache with TTL expiry and count-based eviction.
//!
//! Stashes a sequence of edit chunks under a short key in
//! `<temp>/chunkstash-cache/<key>.json` so a later tool call can fetch it.
//! Entries expire after a configurable TTL and the oldest are evicted once
//! the directory holds more than the configured number of entries.
//!
//! No failure here reaches the caller as an error: reads degrade to a miss,
//! writes still hand back a key, and both log what happened.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::entry::{CacheEntry, EditChunk};
use super::eviction::EvictionManager;
use super::expiry::ExpiryManager;
use super::key::{prompt_fingerprint, KeyGenerator};
use super::path::PathResolver;
use super::stats::{CacheStats, StatsReporter};
use super::store::{remove_quietly, CacheStore, EntryFile, ReadOutcome};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::logging::RequestTimer;

/// Why a lookup produced no chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// Key is malformed or resolves outside the cache directory.
    InvalidKey,
    NotFound,
    /// Entry outlived its TTL and has been deleted.
    Expired,
    /// Entry failed to parse and has been deleted.
    Corrupt,
}

/// Result of [`ChunkCache::lookup`].
#[derive(Debug)]
pub enum Lookup {
    Hit(Vec<EditChunk>),
    Miss(MissReason),
    /// The entry could not be read for a reason other than absence.
    Failed(CacheError),
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// Collapse to "chunks or nothing".
    pub fn into_chunks(self) -> Option<Vec<EditChunk>> {
        match self {
            Lookup::Hit(chunks) => Some(chunks),
            Lookup::Miss(_) | Lookup::Failed(_) => None,
        }
    }
}

/// Result of [`ChunkCache::cache_chunks`].
///
/// The key is always usable as a handle. `failure` is set when the entry
/// could not be persisted; that failure has already been logged.
#[derive(Debug)]
pub struct StashReceipt {
    pub key: String,
    pub failure: Option<CacheError>,
}

impl StashReceipt {
    pub fn is_persisted(&self) -> bool {
        self.failure.is_none()
    }
}

/// Disk-backed chunk cache.
pub struct ChunkCache {
    config: CacheConfig,
    store: CacheStore,
    clock: Arc<dyn Clock>,
    rng: StdRng,
}

impl ChunkCache {
    /// Create a cache over `config.dir` using the wall clock and an
    /// entropy-seeded key generator. The directory is created lazily.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), StdRng::from_entropy())
    }

    /// Create a cache with an explicit clock and key RNG.
    pub fn with_parts(config: CacheConfig, clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        let store = CacheStore::new(PathResolver::new(config.dir.clone()));
        Self {
            config,
            store,
            clock,
            rng,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Store `chunks` and return the key they can be fetched with.
    ///
    /// Sweeps expired entries, picks a key, writes the entry, then evicts
    /// the oldest entries beyond the cap. Persistence failures are logged
    /// and reported in the receipt; the key is returned regardless.
    pub fn cache_chunks(&mut self, prompt: &str, chunks: Vec<EditChunk>) -> StashReceipt {
        let mut timer = RequestTimer::new("cache_chunks");
        let chunk_count = chunks.len();

        let dir_failure = self.store.ensure_dir().err();

        timer.start("sweep");
        let swept = self.sweep_expired();
        timer.finish("sweep");

        let fingerprint = prompt_fingerprint(prompt);
        let key = KeyGenerator::new(self.store.resolver())
            .generate(&mut self.rng, &fingerprint)
            .into_key();

        if let Some(e) = dir_failure {
            warn!(
                key = %key,
                chunks = chunk_count,
                "Cache directory unavailable, entry not persisted"
            );
            return StashReceipt {
                key,
                failure: Some(e),
            };
        }

        timer.start("write");
        let entry = CacheEntry::new(chunks, self.clock.now_millis(), fingerprint);
        let written = self.store.write(&key, &entry, self.clock.now_system());
        timer.finish("write");

        let bytes = match written {
            Ok(bytes) => bytes,
            Err(e) => {
                return StashReceipt {
                    key,
                    failure: Some(e),
                }
            }
        };

        timer.start("evict");
        let evicted =
            EvictionManager::new(&self.store).enforce(self.config.effective_max_entries());
        timer.finish("evict");

        info!(
            key = %key,
            chunks = chunk_count,
            bytes,
            swept,
            evicted,
            "Cached edit chunks"
        );
        StashReceipt { key, failure: None }
    }

    /// Fetch the chunks stored under `key`, or `None` on any kind of miss.
    pub fn get_chunks(&self, key: &str) -> Option<Vec<EditChunk>> {
        self.lookup(key).into_chunks()
    }

    /// Fetch the chunks stored under `key` with the reason for a miss.
    ///
    /// A malformed key is rejected before any filesystem access. An entry
    /// whose embedded timestamp is older than the TTL is deleted and reported
    /// as expired, whether or not a sweep has reached it yet.
    pub fn lookup(&self, key: &str) -> Lookup {
        if !PathResolver::is_valid_key(key) {
            debug!(key_len = key.len(), "Rejected malformed cache key");
            return Lookup::Miss(MissReason::InvalidKey);
        }
        if let Err(e) = self.store.ensure_dir() {
            return Lookup::Failed(e);
        }

        match self.store.read(key) {
            ReadOutcome::Found(entry) => {
                let now = self.clock.now_millis();
                if entry.is_expired(now, self.config.ttl_millis()) {
                    debug!(key, age_ms = entry.age_millis(now), "Cache entry expired, removing");
                    self.store.delete(key);
                    return Lookup::Miss(MissReason::Expired);
                }
                debug!(key, chunks = entry.chunks.len(), "Cache hit");
                Lookup::Hit(entry.chunks)
            }
            ReadOutcome::NotFound => Lookup::Miss(MissReason::NotFound),
            ReadOutcome::Corrupt => Lookup::Miss(MissReason::Corrupt),
            ReadOutcome::Failed(CacheError::InvalidKey { .. }) => {
                debug!(key, "Cache key resolves outside the cache directory");
                Lookup::Miss(MissReason::InvalidKey)
            }
            ReadOutcome::Failed(e) => Lookup::Failed(e),
        }
    }

    /// Count, TTL, cap and directory.
    pub fn stats(&self) -> CacheStats {
        StatsReporter::new(&self.store, &self.config).report()
    }

    /// Delete every entry. Returns how many files were removed.
    pub fn clear(&self) -> usize {
        let removed = self
            .entries()
            .into_iter()
            .filter(|entry| remove_quietly(&entry.path))
            .count();
        info!(removed, "Cleared chunk cache");
        removed
    }

    /// Delete one entry. Invalid keys are ignored without touching disk.
    pub fn remove(&self, key: &str) -> bool {
        if !PathResolver::is_valid_key(key) {
            return false;
        }
        self.store.delete(key)
    }

    /// Entry files currently on disk, oldest first.
    pub fn entries(&self) -> Vec<EntryFile> {
        match self.store.list() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Failed to list cache directory");
                Vec::new()
            }
        }
    }

    /// Run an expiry sweep now. Returns how many entries were removed.
    pub fn sweep_expired(&self) -> usize {
        ExpiryManager::new(&self.store, self.config.ttl()).sweep(self.clock.now_system())
    }
}
