//! Log line redaction.
//!
//! Masks credentials that can end up in diagnostic text: bearer tokens,
//! provider API keys, cloud access keys, JWTs and `secret=value` style
//! pairs. Applied to every formatted log line by
//! [`crate::logging::RedactingMakeWriter`].

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// Replacement for a redacted value.
pub const REDACTED: &str = "[REDACTED]";

static BEARER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(bearer\s+)[A-Za-z0-9\-._~+/]+=*").unwrap());

static API_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:sk-ant-|sk-proj-|sk-)[A-Za-z0-9_\-]{16,}").unwrap());

static AWS_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b").unwrap());

static GITHUB_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:ghp|gho|ghu|ghs|ghr|github_pat)_[A-Za-z0-9_]{20,}").unwrap());

static JWT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\beyJ[A-Za-z0-9_\-]{8,}\.[A-Za-z0-9_\-]{8,}\.[A-Za-z0-9_\-]{8,}").unwrap()
});

static SECRET_PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b((?:password|passwd|secret|token|api[_-]?key|access[_-]?key)["']?\s*[:=]\s*["']?)[^\s"',;]+"#,
    )
    .unwrap()
});

/// Redact sensitive substrings in `text`.
///
/// Returns the input unchanged (borrowed) when nothing matches.
pub fn redact_sensitive(text: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(text);

    for re in [&*API_KEY_RE, &*AWS_KEY_RE, &*GITHUB_TOKEN_RE, &*JWT_RE] {
        if re.is_match(&out) {
            out = Cow::Owned(re.replace_all(&out, REDACTED).into_owned());
        }
    }

    // Keep the label ("Bearer ", "password=") and mask only the value.
    for re in [&*BEARER_RE, &*SECRET_PAIR_RE] {
        if re.is_match(&out) {
            out = Cow::Owned(
                re.replace_all(&out, |caps: &regex::Captures| {
                    format!("{}{}", &caps[1], REDACTED)
                })
                .into_owned(),
            );
        }
    }

    out
}
