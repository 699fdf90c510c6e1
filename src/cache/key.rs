//! Cache key generation.
//!
//! Keys are 4 random bytes hex-encoded to 8 characters. The randomness only
//! keeps concurrent writers from picking the same filename; keys are not
//! secrets and carry no unpredictability guarantee. After
//! [`MAX_KEY_ATTEMPTS`] collisions the generator falls back to the first 8
//! hex characters of the prompt fingerprint.

use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::path::PathResolver;

/// Random draws before falling back to the fingerprint prefix.
pub const MAX_KEY_ATTEMPTS: usize = 5;

/// Length of a cache key in hex characters.
pub const KEY_LEN: usize = 8;

/// SHA-256 hex digest of the full prompt text.
pub fn prompt_fingerprint(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hex::encode(hasher.finalize())
}

/// How a key was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// A random key with no existing entry.
    Random(String),
    /// Every random draw collided; the fingerprint prefix resolved cleanly.
    Fingerprint(String),
    /// The fingerprint prefix did not resolve either. Returned anyway so the
    /// caller still gets a key; persistence under it may fail.
    Advisory(String),
}

impl KeyOutcome {
    pub fn key(&self) -> &str {
        match self {
            KeyOutcome::Random(k) | KeyOutcome::Fingerprint(k) | KeyOutcome::Advisory(k) => k,
        }
    }

    pub fn into_key(self) -> String {
        match self {
            KeyOutcome::Random(k) | KeyOutcome::Fingerprint(k) | KeyOutcome::Advisory(k) => k,
        }
    }
}

/// Produces fresh cache keys, checking the directory for collisions.
pub struct KeyGenerator<'a> {
    resolver: &'a PathResolver,
}

impl<'a> KeyGenerator<'a> {
    pub fn new(resolver: &'a PathResolver) -> Self {
        Self { resolver }
    }

    /// Draw one candidate key from `rng`.
    pub fn random_key<R: RngCore + ?Sized>(rng: &mut R) -> String {
        let mut bytes = [0u8; KEY_LEN / 2];
        rng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Generate a key for an entry created from `fingerprint`.
    ///
    /// Never fails: the worst case is an [`KeyOutcome::Advisory`] key.
    pub fn generate<R: RngCore + ?Sized>(&self, rng: &mut R, fingerprint: &str) -> KeyOutcome {
        for attempt in 1..=MAX_KEY_ATTEMPTS {
            let key = Self::random_key(rng);
            if self.is_free(&key) {
                return KeyOutcome::Random(key);
            }
            debug!(key = %key, attempt, "Cache key collision");
        }

        let fallback: String = fingerprint.chars().take(KEY_LEN).collect();
        if self.resolver.resolve(&fallback).is_ok() {
            debug!(key = %fallback, "Using fingerprint-derived cache key");
            KeyOutcome::Fingerprint(fallback)
        } else {
            warn!(
                key_len = fallback.len(),
                "Fingerprint-derived cache key does not resolve; returning it as advisory"
            );
            KeyOutcome::Advisory(fallback)
        }
    }

    /// Resolves inside the directory and nothing exists there yet.
    fn is_free(&self, key: &str) -> bool {
        match self.resolver.resolve(key) {
            Ok(path) => std::fs::symlink_metadata(path).is_err(),
            Err(_) => false,
        }
    }
}
