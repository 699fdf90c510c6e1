//! Error types for the chunk cache.
//!
//! Nothing in the cache is fatal to its caller. These errors are carried
//! inside tri-state results ([`crate::cache::Lookup`],
//! [`crate::cache::StashReceipt`]) so a caller can observe a failure that
//! was already logged without being forced to handle it.

use thiserror::Error;

/// Errors produced by the cache core.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The key is malformed or would resolve outside the cache directory.
    ///
    /// Only the length of the rejected input is kept; its text is never
    /// echoed into logs or messages.
    #[error("Invalid cache key ({len} bytes)")]
    InvalidKey { len: usize },

    /// Filesystem failure (mkdir, read, write, unlink).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry could not be serialized or parsed.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Config file could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),
}

impl CacheError {
    pub(crate) fn invalid_key(key: &str) -> Self {
        CacheError::InvalidKey { len: key.len() }
    }
}

/// Result alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_key_hides_input() {
        let err = CacheError::invalid_key("../../etc/passwd");
        let msg = err.to_string();
        assert_eq!(msg, "Invalid cache key (16 bytes)");
        assert!(!msg.contains("passwd"));
    }

    #[test]
    fn test_io_error_from() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CacheError = io.into();
        assert!(matches!(err, CacheError::Io(_)));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_serde_error_from() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CacheError = parse.into();
        assert!(err.to_string().starts_with("Serialization error"));
    }
}
