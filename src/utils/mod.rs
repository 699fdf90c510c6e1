//! Shared helpers.

pub mod redact;
