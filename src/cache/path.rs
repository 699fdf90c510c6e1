//! Key validation and key-to-path resolution.
//!
//! Every filesystem path the cache touches for a caller-supplied key goes
//! through [`PathResolver::resolve`] first. The key pattern is checked before
//! anything on disk is consulted, so a malformed key never causes I/O.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CacheError, Result};

/// Extension of entry files.
pub const ENTRY_EXTENSION: &str = "json";

static KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-fA-F0-9]{8}$").unwrap());

static ENTRY_FILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-f0-9]{8}\.json$").unwrap());

/// Maps cache keys to entry paths strictly inside the cache directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    dir: PathBuf,
}

impl PathResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The configured (non-canonical) cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns `true` if `key` is exactly 8 hex digits (either case).
    pub fn is_valid_key(key: &str) -> bool {
        KEY_RE.is_match(key)
    }

    /// Returns the key stem if `name` is a well-formed entry filename.
    pub fn key_from_file_name(name: &str) -> Option<&str> {
        if ENTRY_FILE_RE.is_match(name) {
            name.strip_suffix(".json")
        } else {
            None
        }
    }

    /// Resolve `key` to the canonical path of its entry file.
    ///
    /// The key is lowercased so the on-disk name always matches
    /// `^[a-f0-9]{8}\.json$`. The candidate is canonicalized (following any
    /// existing symlink) and must sit directly inside the canonical cache
    /// directory. Dangling symlinks are rejected since a write would follow
    /// them.
    pub fn resolve(&self, key: &str) -> Result<PathBuf> {
        if !Self::is_valid_key(key) {
            return Err(CacheError::invalid_key(key));
        }

        let canonical_dir = std::fs::canonicalize(&self.dir)?;
        let candidate =
            canonical_dir.join(format!("{}.{}", key.to_ascii_lowercase(), ENTRY_EXTENSION));

        let resolved = match std::fs::canonicalize(&candidate) {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if std::fs::symlink_metadata(&candidate).is_ok() {
                    return Err(CacheError::invalid_key(key));
                }
                candidate
            }
            Err(_) => return Err(CacheError::invalid_key(key)),
        };

        if resolved.parent() != Some(canonical_dir.as_path()) || resolved == canonical_dir {
            return Err(CacheError::invalid_key(key));
        }
        Ok(resolved)
    }
}
