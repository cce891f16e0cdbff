//! Hand-rolled XML-ish request building and permissive response parsing
//! (spec §6.2). The LLM's response is not well-formed XML in the general
//! case, so this deliberately does not reach for a real XML parser: each
//! named element is extracted independently, first match, case
//! insensitive, whitespace-trimmed — exactly the permissiveness the spec
//! calls for.

use once_cell::sync::Lazy;
use regex::Regex;
use regex::RegexBuilder;

/// Output is truncated to this many bytes, with a marker, before being
/// embedded in a compress request (spec §6.2).
pub const TOOL_OUTPUT_LIMIT_BYTES: usize = 8 * 1024;

/// Escapes `& < > " '` for embedding in the hand-built request XML.
/// Order matters: `&` must be escaped first or every other escape's
/// ampersand would itself get escaped.
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// JSON-serializes non-string values, leaves strings as-is, per spec
/// §6.2 "JSON-serialized when not strings".
pub fn stringify_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

static ELEMENT_CACHE_MEMORY: Lazy<Regex> = Lazy::new(|| tag_regex("memory"));
static ELEMENT_CACHE_SUMMARY: Lazy<Regex> = Lazy::new(|| tag_regex("session_summary"));

fn tag_regex(tag: &str) -> Regex {
    #[allow(clippy::expect_used)]
    RegexBuilder::new(&format!(r"<{tag}>(.*?)</{tag}>"))
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .expect("static tag pattern is valid regex")
}

/// Finds the first `<memory>…</memory>` block in a compression response.
pub fn extract_memory_block(raw: &str) -> Option<String> {
    ELEMENT_CACHE_MEMORY
        .captures(raw)
        .map(|c| c[1].trim().to_string())
}

/// Finds the first `<session_summary>…</session_summary>` block in a
/// summarization response.
pub fn extract_summary_block(raw: &str) -> Option<String> {
    ELEMENT_CACHE_SUMMARY
        .captures(raw)
        .map(|c| c[1].trim().to_string())
}

/// First match of a named element, trimmed. Built per-call since element
/// names vary; the two blocks above are the only ones worth caching as
/// statics since they're looked up once per response.
pub fn extract_first(tag: &str, xml: &str) -> Option<String> {
    let re = tag_regex(&regex::escape(tag));
    let text = re.captures(xml).map(|c| c[1].trim().to_string())?;
    if text.is_empty() { None } else { Some(text) }
}

/// All matches of a repeated named element, in document order, trimmed,
/// empty entries dropped.
pub fn extract_repeated(tag: &str, xml: &str) -> Vec<String> {
    let re = tag_regex(&regex::escape(tag));
    re.captures_iter(xml)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "xml.test.rs"]
mod tests;
