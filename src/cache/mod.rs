//! Ephemeral on-disk cache for edit chunks, with TTL expiry and FIFO eviction.

pub mod chunk_cache;
pub mod clock;
pub mod entry;
pub mod eviction;
pub mod expiry;
pub mod key;
pub mod path;
pub mod stats;
pub mod store;

pub use chunk_cache::{ChunkCache, Lookup, MissReason, StashReceipt};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, EditChunk};
pub use key::{prompt_fingerprint, KeyOutcome};
pub use path::PathResolver;
pub use stats::CacheStats;
pub use store::EntryFile;
