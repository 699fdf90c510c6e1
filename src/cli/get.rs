//! `get` command handler.

use anyhow::Result;

use chunkstash::{ChunkCache, Lookup, MissReason};

/// Print the chunks for `key` as a JSON array. Returns `false` on a miss.
pub(crate) fn cmd_get(cache: &ChunkCache, key: &str) -> Result<bool> {
    match cache.lookup(key) {
        Lookup::Hit(chunks) => {
            println!("{}", serde_json::to_string_pretty(&chunks)?);
            Ok(true)
        }
        Lookup::Miss(reason) => {
            eprintln!("{}", miss_message(reason));
            Ok(false)
        }
        Lookup::Failed(e) => Err(e.into()),
    }
}

fn miss_message(reason: MissReason) -> &'static str {
    match reason {
        MissReason::InvalidKey => "Invalid key: expected 8 hex characters.",
        MissReason::NotFound => "No cached chunks for that key.",
        MissReason::Expired => "Cached chunks for that key have expired.",
        MissReason::Corrupt => "Cached entry was corrupt and has been removed.",
    }
}
