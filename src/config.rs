//! Cache configuration.
//!
//! The cache directory, TTL and entry cap are an explicitly constructed
//! value handed to [`crate::ChunkCache::new`]. Nothing here is read from
//! environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Directory name created under the platform temp dir.
pub const DEFAULT_CACHE_SUBDIR: &str = "chunkstash-cache";

/// Entries older than this are treated as absent (10 minutes).
pub const DEFAULT_TTL_SECS: u64 = 600;

/// Upper bound on stored entries after every write.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Chunk cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding `<key>.json` entry files.
    pub dir: PathBuf,
    /// Maximum entry age in seconds.
    pub ttl_secs: u64,
    /// Maximum number of entries kept after a write. Clamped to at least 1.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir().join(DEFAULT_CACHE_SUBDIR),
            ttl_secs: DEFAULT_TTL_SECS,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    /// Load config from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(CacheError::Config(format!(
                    "Failed to read config at {:?}: {}",
                    path, e
                )))
            }
        };
        toml::from_str(&raw)
            .map_err(|e| CacheError::Config(format!("Failed to parse config at {:?}: {}", path, e)))
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// TTL as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// TTL in milliseconds, the unit entry timestamps are stored in.
    pub fn ttl_millis(&self) -> u64 {
        self.ttl_secs.saturating_mul(1000)
    }

    /// Entry cap with the zero case clamped to 1.
    pub fn effective_max_entries(&self) -> usize {
        self.max_entries.max(1)
    }
}
