//! FTS5 match-string escaping (spec §4.2).
//!
//! The FTS match expression is the one runtime-constructed SQL literal in
//! this crate; every other query is parameterized. Wrapping the trimmed
//! query in double quotes and doubling internal double quotes turns it
//! into an FTS5 string literal, which defeats FTS query-syntax injection
//! (`AND`/`OR`/`NOT`/`NEAR`/column filters) the same way a parameterized
//! bind would for ordinary SQL.
pub fn escape_fts_query(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let doubled = trimmed.replace('"', "\"\"");
    Some(format!("\"{doubled}\""))
}

#[cfg(test)]
#[path = "fts.test.rs"]
mod tests;
