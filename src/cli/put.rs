//! `put` command handler.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use chunkstash::{ChunkCache, EditChunk};

/// Cache the chunk array from `file` (or stdin) and print the key.
pub(crate) fn cmd_put(cache: &mut ChunkCache, prompt: &str, file: Option<&Path>) -> Result<bool> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read chunks from stdin")?;
            buf
        }
    };

    let chunks = parse_chunks(&raw)?;
    let receipt = cache.cache_chunks(prompt, chunks);
    if let Some(err) = &receipt.failure {
        eprintln!("warning: entry was not persisted: {}", err);
    }
    println!("{}", receipt.key);
    Ok(true)
}

pub(crate) fn parse_chunks(raw: &str) -> Result<Vec<EditChunk>> {
    serde_json::from_str(raw).context("Chunks must be a JSON array")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkstash::CacheConfig;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_chunks_array() {
        let chunks = parse_chunks(r#"[{"a":1}, "two", 3]"#).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], EditChunk(json!("two")));
    }

    #[test]
    fn test_parse_chunks_rejects_non_array() {
        assert!(parse_chunks(r#"{"a":1}"#).is_err());
        assert!(parse_chunks("not json").is_err());
    }

    #[test]
    fn test_put_from_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("chunks.json");
        std::fs::write(&file, r#"[{"path":"a.rs"}]"#).unwrap();
        let mut cache = ChunkCache::new(CacheConfig::default().with_dir(tmp.path().join("cache")));

        assert!(cmd_put(&mut cache, "fix bug", Some(&file)).unwrap());
        assert_eq!(cache.stats().size, 1);
    }
}
