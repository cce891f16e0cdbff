//! Secret redaction and privacy-markup stripping (spec §4.1, component C1).

mod error;
mod patterns;

pub use error::ScrubError;
pub use error::Result;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

/// Default byte cap applied to observation payloads before they reach the
/// store (spec §4.1 `enforceByteLimit`).
pub const OBSERVATION_BYTE_LIMIT: usize = 50 * 1024;

static PRIVATE_BLOCK: Lazy<Regex> =
    Lazy::new(|| regex_unwrap(r"(?is)<private>.*?</private>"));

static CONTEXT_BLOCK: Lazy<Regex> =
    Lazy::new(|| regex_unwrap(r"(?is)<c-mem-context>.*?</c-mem-context>"));

static CONTROL_TAG: Lazy<Regex> =
    Lazy::new(|| regex_unwrap(r"(?i)<c-mem-(compress|summarize|context)"));

static LONG_BASE64_RUN: Lazy<Regex> = Lazy::new(|| regex_unwrap(r"[A-Za-z0-9+/]{200,}={0,2}"));

fn regex_unwrap(pattern: &str) -> Regex {
    #[allow(clippy::expect_used)]
    Regex::new(pattern).expect("static scrubber regex is valid")
}

/// Bound on how many strip passes `strip_privacy_markup` will run, to
/// defend against pathological nested-tag inputs (spec §4.1).
const MAX_STRIP_PASSES: usize = 64;

/// Replace every match of the secret-pattern set with a stable opaque marker.
pub fn scrub_string(s: &str) -> String {
    patterns::apply_all(s)
}

/// Deep-copy a JSON value, substituting scrubbed strings; non-string
/// primitives (numbers, bools, null) pass through untouched.
pub fn scrub_json(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(scrub_string(s)),
        Value::Array(items) => Value::Array(items.iter().map(scrub_json).collect()),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), scrub_json(v));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

/// Remove `<private>...</private>` and `<c-mem-context>...</c-mem-context>`
/// blocks case-insensitively. Iterates until no further change, bounded by
/// [`MAX_STRIP_PASSES`].
pub fn strip_privacy_markup(s: &str) -> String {
    let mut current = s.to_string();
    for _ in 0..MAX_STRIP_PASSES {
        let stripped = CONTEXT_BLOCK.replace_all(&current, "");
        let stripped = PRIVATE_BLOCK.replace_all(&stripped, "");
        if stripped == current {
            return stripped.into_owned();
        }
        current = stripped.into_owned();
    }
    current
}

/// True iff, after stripping, only whitespace remains and at least one
/// privacy block was present in the original.
pub fn is_fully_private(s: &str) -> bool {
    let had_block = PRIVATE_BLOCK.is_match(s) || CONTEXT_BLOCK.is_match(s);
    had_block && strip_privacy_markup(s).trim().is_empty()
}

/// Truncate `s` to at most `limit` UTF-8 bytes on a code-point boundary,
/// appending a truncation marker when truncation occurred.
pub fn enforce_byte_limit(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        return s.to_string();
    }
    let mut boundary = limit.min(s.len());
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }
    format!("{}…[truncated]", &s[..boundary])
}

/// Reject raw inputs carrying a reserved control tag; otherwise return the
/// NFKC-normalized, scanned input. Warns (does not fail) on long base64
/// runs, since those are legitimate tool output as often as they are
/// embedded secrets.
pub fn validate_content(s: &str) -> Result<String> {
    let normalized: String = s.nfkc().collect();
    if CONTROL_TAG.is_match(&normalized) {
        return Err(ScrubError::ControlTags);
    }
    if LONG_BASE64_RUN.is_match(&normalized) {
        tracing::warn!("scrubber: long base64-like run detected in content");
    }
    Ok(normalized)
}

#[cfg(test)]
#[path = "lib.test.rs"]
mod tests;
