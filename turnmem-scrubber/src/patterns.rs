//! Secret-pattern table.
//!
//! Ordered most-specific first, per spec §4.1: a later, more generic
//! pattern must never get the chance to re-match text a more specific
//! pattern already replaced, since the opaque marker itself cannot match
//! any entry here.

use once_cell::sync::Lazy;
use regex::Regex;

/// The opaque replacement marker. Deliberately short, mixed-case, and
/// bracketed so none of the patterns below can ever match it back.
pub const MARKER: &str = "[scrubbed]";

/// Cap on replacements performed per call to guard against pathological
/// inputs driving quadratic rebuilds (design note §9).
pub const MAX_REPLACEMENTS: usize = 100;

struct Pattern {
    name: &'static str,
    regex: Lazy<Regex>,
}

macro_rules! pat {
    ($name:expr, $re:expr) => {
        Pattern {
            name: $name,
            regex: Lazy::new(|| {
                #[allow(clippy::expect_used)]
                Regex::new($re).expect("static pattern is valid regex")
            }),
        }
    };
}

static AWS_ACCESS_KEY: Pattern = pat!("aws_access_key", r"(?:AKIA|ASIA|AROA|AIDA)[A-Z0-9]{16}");

static AWS_SECRET_ASSIGN: Pattern = pat!(
    "aws_secret_assignment",
    r"(?i)aws_secret_access_key\s*[:=]\s*['\x22]?[A-Za-z0-9/+=]{30,}['\x22]?"
);

static ANTHROPIC_KEY: Pattern = pat!("anthropic_key", r"sk-ant-[A-Za-z0-9_-]{20,}");

static GENERIC_SK_KEY: Pattern = pat!("generic_sk_key", r"\bsk-[A-Za-z0-9]{20,}\b");

static BEARER_TOKEN: Pattern = pat!("bearer_token", r"(?i)Bearer\s+[A-Za-z0-9._-]{10,}");

static JWT: Pattern = pat!(
    "jwt",
    r"\b[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\b"
);

static URL_CREDENTIALS: Pattern = pat!(
    "url_credentials",
    r"[A-Za-z][A-Za-z0-9+.-]*://[^\s/:@]+:[^\s/@]+@"
);

static KEY_VALUE_SECRET: Pattern = pat!(
    "key_value_secret",
    r#"(?i)\b(password|passwd|secret|api_key|apikey|token)\s*[:=]\s*['"]?[^\s'"]{4,}['"]?"#
);

static DOTENV_STYLE: Pattern = pat!("dotenv_style", r"(?m)^[A-Z][A-Z0-9_]*=\S{8,}$");

/// All patterns, in application order (most specific first).
pub(crate) fn all() -> [&'static Pattern; 9] {
    [
        &AWS_ACCESS_KEY,
        &AWS_SECRET_ASSIGN,
        &ANTHROPIC_KEY,
        &GENERIC_SK_KEY,
        &BEARER_TOKEN,
        &JWT,
        &URL_CREDENTIALS,
        &KEY_VALUE_SECRET,
        &DOTENV_STYLE,
    ]
}

pub(crate) fn apply_all(input: &str) -> String {
    let mut out = input.to_string();
    for pattern in all() {
        out = cap_replace(&pattern.regex, &out);
        tracing::trace!(pattern = pattern.name, "scrubber pattern pass complete");
    }
    out
}

/// Replace at most `MAX_REPLACEMENTS` non-overlapping matches of `re` in
/// `s` with [`MARKER`]. Rust's `regex` crate carries no mutable
/// "lastIndex"-style iteration state, so unlike the engines that motivated
/// this cap (§9 design note), a single `Regex` is always safe to reuse
/// across calls; the cap here only bounds replacement *count*, not state.
fn cap_replace(re: &Regex, s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut last_end = 0;
    for m in re.find_iter(s).take(MAX_REPLACEMENTS) {
        result.push_str(&s[last_end..m.start()]);
        result.push_str(MARKER);
        last_end = m.end();
    }
    result.push_str(&s[last_end..]);
    result
}

#[cfg(test)]
#[path = "patterns.test.rs"]
mod tests;
