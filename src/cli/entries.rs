//! `ls`, `rm` and `clear` command handlers.

use std::time::SystemTime;

use chrono::{DateTime, Utc};

use chunkstash::ChunkCache;

/// List entries oldest first.
pub(crate) fn cmd_ls(cache: &ChunkCache) -> bool {
    let entries = cache.entries();
    if entries.is_empty() {
        println!("No cached entries.");
        return true;
    }

    println!("{:<10} {:<22} {:>10}", "Key", "Written", "Bytes");
    println!("{}", "-".repeat(44));
    let now = SystemTime::now();
    for entry in entries {
        let written: DateTime<Utc> = entry.modified.into();
        let age = now.duration_since(entry.modified).unwrap_or_default();
        println!(
            "{:<10} {:<22} {:>10}",
            entry.key,
            format!("{} ({}s ago)", written.format("%H:%M:%S"), age.as_secs()),
            entry.bytes,
        );
    }
    true
}

/// Remove one entry. Returns `false` if nothing was removed.
pub(crate) fn cmd_rm(cache: &ChunkCache, key: &str) -> bool {
    if cache.remove(key) {
        println!("Removed {}", key);
        true
    } else {
        eprintln!("No entry removed for that key.");
        false
    }
}

/// Remove every entry.
pub(crate) fn cmd_clear(cache: &ChunkCache) -> bool {
    let removed = cache.clear();
    println!("Cleared {} cached entr{}.", removed, if removed == 1 { "y" } else { "ies" });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkstash::{CacheConfig, EditChunk};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_rm_and_clear() {
        let tmp = TempDir::new().unwrap();
        let mut cache = ChunkCache::new(CacheConfig::default().with_dir(tmp.path().join("cache")));
        let a = cache.cache_chunks("a", vec![EditChunk(json!("a"))]).key;
        cache.cache_chunks("b", vec![EditChunk(json!("b"))]);

        assert!(cmd_rm(&cache, &a));
        assert!(!cmd_rm(&cache, &a));
        assert!(cmd_ls(&cache));
        assert!(cmd_clear(&cache));
        assert_eq!(cache.stats().size, 0);
    }
}
