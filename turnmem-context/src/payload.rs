//! Reads the JSON list fields the Compressor encoded into an
//! observation's `compressed` column (spec §4.6, §4.7). Parsed loosely:
//! any field that is absent or not an array of strings is treated as
//! empty rather than erroring, since a fallback record's `compressed`
//! blob may not be JSON at all.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CompressedPayload {
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub modified_files: Vec<String>,
}

pub(crate) fn parse(compressed: &str) -> CompressedPayload {
    serde_json::from_str(compressed).unwrap_or_default()
}

/// The first sentence of `text`, including its terminator, split on the
/// first `.`, `?`, or `!` followed by whitespace or end-of-string; falls
/// back to the whole (trimmed) string if no terminator is found.
pub(crate) fn first_sentence(text: &str) -> &str {
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if matches!(b, b'.' | b'?' | b'!') {
            let next_is_boundary = match bytes.get(i + 1) {
                Some(c) => c.is_ascii_whitespace(),
                None => true,
            };
            if next_is_boundary {
                return text[..=i].trim_end();
            }
        }
    }
    text.trim()
}

#[cfg(test)]
#[path = "payload.test.rs"]
mod tests;
