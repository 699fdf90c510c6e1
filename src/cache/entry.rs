//! On-disk entry format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One opaque unit of a multi-part result.
///
/// The cache never looks inside a chunk; it is stored and returned as the
/// JSON value it was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditChunk(pub Value);

impl From<Value> for EditChunk {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl EditChunk {
    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// Contents of a `<key>.json` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Chunks in the order they were cached.
    pub chunks: Vec<EditChunk>,
    /// Creation time, epoch milliseconds.
    pub timestamp: u64,
    /// SHA-256 hex digest of the originating prompt.
    pub prompt_hash: String,
}

impl CacheEntry {
    pub fn new(chunks: Vec<EditChunk>, timestamp: u64, prompt_hash: String) -> Self {
        Self {
            chunks,
            timestamp,
            prompt_hash,
        }
    }

    /// Age relative to `now_millis`; a timestamp in the future has age 0.
    pub fn age_millis(&self, now_millis: u64) -> u64 {
        now_millis.saturating_sub(self.timestamp)
    }

    /// Strictly older than the TTL.
    pub fn is_expired(&self, now_millis: u64, ttl_millis: u64) -> bool {
        self.age_millis(now_millis) > ttl_millis
    }
}
