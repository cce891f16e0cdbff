use super::*;

#[test]
fn wraps_in_quotes_and_doubles_internal_quotes() {
    assert_eq!(
        escape_fts_query("say \"hi\"").as_deref(),
        Some("\"say \"\"hi\"\"\"")
    );
}

#[test]
fn trims_whitespace() {
    assert_eq!(escape_fts_query("  hello  ").as_deref(), Some("\"hello\""));
}

#[test]
fn empty_input_yields_no_query() {
    assert_eq!(escape_fts_query(""), None);
    assert_eq!(escape_fts_query("   "), None);
}
