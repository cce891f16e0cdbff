use super::*;

#[test]
fn escapes_all_five_characters() {
    assert_eq!(xml_escape(r#"a & b < c > d " e ' f"#), "a &amp; b &lt; c &gt; d &quot; e &apos; f");
}

#[test]
fn stringify_json_leaves_strings_bare() {
    let v = serde_json::json!("hello");
    assert_eq!(stringify_json(&v), "hello");
}

#[test]
fn stringify_json_serializes_non_strings() {
    let v = serde_json::json!({"a": 1});
    assert_eq!(stringify_json(&v), r#"{"a":1}"#);
}

#[test]
fn extract_memory_block_is_case_insensitive() {
    let raw = "some preamble <MEMORY>inner content</MEMORY> trailer";
    assert_eq!(extract_memory_block(raw), Some("inner content".to_string()));
}

#[test]
fn extract_first_trims_whitespace() {
    let xml = "<title>\n  fixed a bug  \n</title>";
    assert_eq!(extract_first("title", xml), Some("fixed a bug".to_string()));
}

#[test]
fn extract_first_returns_none_for_empty_element() {
    let xml = "<title>   </title>";
    assert_eq!(extract_first("title", xml), None);
}

#[test]
fn extract_repeated_collects_all_matches_in_order() {
    let xml = "<tags><tag>alpha</tag><tag>beta</tag><tag>  </tag><tag>gamma</tag></tags>";
    assert_eq!(
        extract_repeated("tag", xml),
        vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()]
    );
}

#[test]
fn extract_repeated_returns_empty_for_absent_tag() {
    let xml = "<memory><title>x</title></memory>";
    assert!(extract_repeated("fact", xml).is_empty());
}
