use super::*;

fn summary(id: i64, created_at: i64) -> Summary {
    Summary {
        id,
        session_id: id,
        request: Some("fix the flaky test".to_string()),
        investigated: Some("race in the poller".to_string()),
        learned: Some("poll interval was shorter than the sleep".to_string()),
        completed: Some("1 observation recorded this session".to_string()),
        next_steps: Some("None".to_string()),
        created_at,
    }
}

#[test]
fn renders_all_labelled_fields() {
    let section = render(&[summary(1, 1_700_000_000)], 5, 10_000);
    assert_eq!(section.included, 1);
    assert!(!section.truncated);
    assert!(section.markdown.contains("- Request: fix the flaky test"));
    assert!(section.markdown.contains("- Done: 1 observation recorded this session"));
    assert!(section.markdown.contains("- Discovered: poll interval was shorter than the sleep"));
    assert!(section.markdown.contains("- Remaining: None"));
    assert!(section.markdown.contains("- Notes: race in the poller"));
}

#[test]
fn missing_field_falls_back_to_none_placeholder() {
    let mut s = summary(1, 1_700_000_000);
    s.learned = None;
    let section = render(&[s], 5, 10_000);
    assert!(section.markdown.contains("- Discovered: None"));
}

#[test]
fn blank_field_falls_back_to_none_placeholder() {
    let mut s = summary(1, 1_700_000_000);
    s.request = Some("   ".to_string());
    let section = render(&[s], 5, 10_000);
    assert!(section.markdown.contains("- Request: None"));
}

#[test]
fn caps_at_max_sessions_and_marks_truncated() {
    let summaries: Vec<Summary> = (0..8).map(|i| summary(i, 1_700_000_000 + i)).collect();
    let section = render(&summaries, 5, 100_000);
    assert_eq!(section.included, 5);
    assert!(section.truncated);
}

#[test]
fn stops_early_when_budget_exhausted() {
    let summaries: Vec<Summary> = (0..5).map(|i| summary(i, 1_700_000_000 + i)).collect();
    let one_block_len = render_one(&summaries[0]).len();
    let section = render(&summaries, 5, one_block_len + 1);
    assert_eq!(section.included, 1);
    assert!(section.truncated);
}

#[test]
fn empty_input_yields_empty_untruncated_markdown() {
    let section = render(&[], 5, 10_000);
    assert_eq!(section.included, 0);
    assert!(section.markdown.is_empty());
    assert!(!section.truncated);
}
