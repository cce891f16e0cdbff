//! Prompt-injection pattern table (spec §4.4 point 3).
//!
//! Bounded and ordered: the first match wins and scanning stops there, so
//! the order here only affects which `kind` gets reported when more than
//! one pattern would otherwise match the same text.

use once_cell::sync::Lazy;
use regex::Regex;

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

static IGNORE_INSTRUCTIONS: Pattern = pat!(
    "ignore_instructions",
    r"(?i)ignore (all )?(previous|prior|above|earlier) (instructions|context|prompt)"
);

static ROLE_REASSIGNMENT: Pattern = pat!("role_reassignment", r"(?i)you are now (a|an|the) ");

static NEW_SYSTEM_PROMPT: Pattern = pat!(
    "new_system_prompt",
    r"(?i)new (system )?(prompt|instructions|context|rules):"
);

static BRACKET_ROLE: Pattern = pat!(
    "bracket_role",
    r"(?i)\[(system|assistant|human|INST)\]"
);

static CHATML_ROLE: Pattern = pat!("chatml_role", r"(?i)<\|(system|assistant|human)\|>");

static IMPORTANT_DIRECTIVE: Pattern = pat!(
    "important_directive",
    r"(?i)IMPORTANT: you must (always|never|ignore)"
);

static DISREGARD: Pattern = pat!(
    "disregard",
    r"(?i)disregard (all )?(previous|prior) "
);

static JAILBREAK: Pattern = pat!("jailbreak", r"(?i)jailbreak");

static DAN_MODE: Pattern = pat!("dan_mode", r"(?i)DAN mode");

static PRETEND_NOT_AI: Pattern = pat!(
    "pretend_not_ai",
    r"(?i)pretend you are (not an AI|a human)"
);

/// All patterns, in scan order.
pub const INJECTION_PATTERNS: [&str; 10] = [
    "ignore_instructions",
    "role_reassignment",
    "new_system_prompt",
    "bracket_role",
    "chatml_role",
    "important_directive",
    "disregard",
    "jailbreak",
    "dan_mode",
    "pretend_not_ai",
];

fn all() -> [&'static Pattern; 10] {
    [
        &IGNORE_INSTRUCTIONS,
        &ROLE_REASSIGNMENT,
        &NEW_SYSTEM_PROMPT,
        &BRACKET_ROLE,
        &CHATML_ROLE,
        &IMPORTANT_DIRECTIVE,
        &DISREGARD,
        &JAILBREAK,
        &DAN_MODE,
        &PRETEND_NOT_AI,
    ]
}

/// Returns the name of the first pattern that matches `haystack`, or `None`.
pub(crate) fn first_match(haystack: &str) -> Option<&'static str> {
    all()
        .into_iter()
        .find(|pattern| pattern.regex.is_match(haystack))
        .map(|pattern| pattern.name)
}

#[cfg(test)]
#[path = "patterns.test.rs"]
mod tests;
