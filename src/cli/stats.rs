//! `stats` command handler.

use anyhow::Result;

use chunkstash::ChunkCache;

/// Print cache statistics.
pub(crate) fn cmd_stats(cache: &ChunkCache, json: bool) -> Result<bool> {
    let stats = cache.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(true);
    }

    println!("{:<12} {} / {}", "Entries", stats.size, stats.max_size);
    println!("{:<12} {}s", "TTL", stats.ttl_secs);
    println!("{:<12} {}", "Bytes", stats.total_bytes);
    println!("{:<12} {}", "Directory", stats.cache_dir.display());
    Ok(true)
}
