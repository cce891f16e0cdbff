use super::*;

#[test]
fn parses_facts_and_modified_files() {
    let raw = r#"{"facts":["uses tokio::spawn"],"modified_files":["src/lib.rs","src/main.rs"],"tags":["queue"]}"#;
    let payload = parse(raw);
    assert_eq!(payload.facts, vec!["uses tokio::spawn".to_string()]);
    assert_eq!(
        payload.modified_files,
        vec!["src/lib.rs".to_string(), "src/main.rs".to_string()]
    );
}

#[test]
fn missing_fields_are_empty_not_an_error() {
    let payload = parse(r#"{"title":"no lists here"}"#);
    assert!(payload.facts.is_empty());
    assert!(payload.modified_files.is_empty());
}

#[test]
fn non_json_blob_is_empty_not_an_error() {
    let payload = parse("Raw observation from Bash. Compression failed after 3 attempts.");
    assert!(payload.facts.is_empty());
    assert!(payload.modified_files.is_empty());
}

#[test]
fn wrong_shaped_fields_are_ignored() {
    let payload = parse(r#"{"facts":"not-an-array","modified_files":42}"#);
    assert!(payload.facts.is_empty());
    assert!(payload.modified_files.is_empty());
}

#[test]
fn first_sentence_splits_on_period() {
    assert_eq!(
        first_sentence("Fixed the race condition. Added a regression test."),
        "Fixed the race condition."
    );
}

#[test]
fn first_sentence_splits_on_question_or_bang() {
    assert_eq!(first_sentence("Is this cached? Yes, via Lazy."), "Is this cached?");
    assert_eq!(first_sentence("Stop! Do not retry."), "Stop!");
}

#[test]
fn first_sentence_does_not_split_on_decimal_point() {
    assert_eq!(first_sentence("Timeout is 2.5 seconds total."), "Timeout is 2.5 seconds total.");
}

#[test]
fn first_sentence_falls_back_to_whole_trimmed_string() {
    assert_eq!(first_sentence("  no terminator here  "), "no terminator here");
}
