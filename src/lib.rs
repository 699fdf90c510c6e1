//! chunkstash — ephemeral disk-backed cache for oversized tool results.
//!
//! A multi-step tool workflow that produces more edit chunks than fit in one
//! response stashes them with [`ChunkCache::cache_chunks`], hands the short
//! key back to the caller, and serves the chunks from a follow-up call with
//! [`ChunkCache::get_chunks`]. Entries live in a private directory under the
//! platform temp dir, expire after a TTL, and are capped in number.
//!
//! # Example
//!
//! ```rust
//! use chunkstash::{CacheConfig, ChunkCache, EditChunk};
//! use serde_json::json;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut cache = ChunkCache::new(CacheConfig::default().with_dir(dir.path().join("stash")));
//!
//! let chunks = vec![EditChunk(json!({"file": "src/main.rs", "patch": "@@ -1 +1 @@"}))];
//! let receipt = cache.cache_chunks("fix bug", chunks.clone());
//! assert_eq!(receipt.key.len(), 8);
//! assert_eq!(cache.get_chunks(&receipt.key), Some(chunks));
//! assert!(cache.get_chunks("00000000").is_none());
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod utils;

pub use cache::{
    CacheEntry, CacheStats, ChunkCache, Clock, EditChunk, EntryFile, Lookup, ManualClock,
    MissReason, StashReceipt, SystemClock,
};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
