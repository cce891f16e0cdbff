use super::*;
use turnmem_store::NewObservation;
use turnmem_store::ObsType;

fn test_store() -> Store {
    #[allow(clippy::expect_used)]
    Store::open_in_memory(b"test-hmac-key".to_vec()).expect("open in-memory store")
}

#[test]
fn empty_project_yields_a_context_block_with_no_sections() {
    let store = test_store();
    let result = build(&store, "demo", &ContextOptions::default()).unwrap();
    assert!(result.markdown.starts_with("<c-mem-context>"));
    assert!(result.markdown.trim_end().ends_with("</c-mem-context>"));
    assert!(result.markdown.contains("Memory context for project `demo`"));
    assert!(!result.markdown.contains("## Session Summaries"));
    assert!(!result.markdown.contains("## Observations"));
    assert_eq!(result.summary_count, 0);
    assert_eq!(result.observation_count, 0);
    assert!(!result.truncated);
}

#[test]
fn includes_summaries_and_observations_for_the_project() {
    let store = test_store();
    let session = store.create_session("key-1", "demo").unwrap();
    store
        .insert_summary(
            session.id,
            Some("add caching".to_string()),
            Some("the db layer".to_string()),
            Some("reads dominate writes".to_string()),
            Some("added an LRU cache".to_string()),
            Some("wire up metrics".to_string()),
        )
        .unwrap();
    store
        .insert_observation(NewObservation {
            session_id: session.id,
            prompt_number: 1,
            tool_name: "Edit".to_string(),
            raw_input: None,
            compressed: r#"{"facts":["cache size is 256"],"modified_files":["src/cache.rs"]}"#.to_string(),
            obs_type: ObsType::Feature,
            title: "Add LRU cache".to_string(),
            narrative: "Added an LRU cache in front of the query layer. It defaults to 256 entries.".to_string(),
        })
        .unwrap();

    let result = build(&store, "demo", &ContextOptions::default()).unwrap();
    assert_eq!(result.summary_count, 1);
    assert_eq!(result.observation_count, 1);
    assert!(result.markdown.contains("## Session Summaries"));
    assert!(result.markdown.contains("- Done: added an LRU cache"));
    assert!(result.markdown.contains("## Observations"));
    assert!(result.markdown.contains("[feature] Add LRU cache"));
    assert!(result.markdown.contains("src/cache.rs"));
}

#[test]
fn other_typed_observations_are_dropped_once_a_summary_is_present() {
    let store = test_store();
    let session = store.create_session("key-1", "demo").unwrap();
    store
        .insert_summary(session.id, Some("r".to_string()), None, None, None, None)
        .unwrap();
    store
        .insert_observation(NewObservation {
            session_id: session.id,
            prompt_number: 1,
            tool_name: "Bash".to_string(),
            raw_input: None,
            compressed: "{}".to_string(),
            obs_type: ObsType::Other,
            title: "Bash — session prompt #1".to_string(),
            narrative: "Raw observation from Bash. Compression failed after 3 attempts.".to_string(),
        })
        .unwrap();

    let result = build(&store, "demo", &ContextOptions::default()).unwrap();
    assert_eq!(result.observation_count, 0);
    assert!(!result.markdown.contains("## Observations"));
}

#[test]
fn a_different_project_does_not_leak_into_the_context() {
    let store = test_store();
    let session = store.create_session("key-1", "other-project").unwrap();
    store
        .insert_observation(NewObservation {
            session_id: session.id,
            prompt_number: 1,
            tool_name: "Edit".to_string(),
            raw_input: None,
            compressed: "{}".to_string(),
            obs_type: ObsType::Bugfix,
            title: "Fix off-by-one".to_string(),
            narrative: "Fixed an off-by-one error in the paginator.".to_string(),
        })
        .unwrap();

    let result = build(&store, "demo", &ContextOptions::default()).unwrap();
    assert_eq!(result.observation_count, 0);
    assert!(!result.markdown.contains("Fix off-by-one"));
}

#[test]
fn tiny_token_budget_truncates_and_still_produces_a_valid_wrapper() {
    let store = test_store();
    let session = store.create_session("key-1", "demo").unwrap();
    for n in 0..10 {
        store
            .insert_observation(NewObservation {
                session_id: session.id,
                prompt_number: n,
                tool_name: "Edit".to_string(),
                raw_input: None,
                compressed: "{}".to_string(),
                obs_type: ObsType::Bugfix,
                title: format!("fix #{n}"),
                narrative: "Fixed a subtle race condition in the scheduler.".to_string(),
            })
            .unwrap();
    }

    let options = ContextOptions {
        token_budget: 40,
        ..ContextOptions::default()
    };
    let result = build(&store, "demo", &options).unwrap();
    assert!(result.markdown.starts_with("<c-mem-context>"));
    assert!(result.markdown.trim_end().ends_with("</c-mem-context>"));
    assert!(result.truncated);
    assert!(result.observation_count < 10);
}

#[test]
fn token_estimate_is_roughly_markdown_length_over_four() {
    let store = test_store();
    let result = build(&store, "demo", &ContextOptions::default()).unwrap();
    let expected = (result.markdown.len() + CHARS_PER_TOKEN - 1) / CHARS_PER_TOKEN;
    assert_eq!(result.token_estimate, expected);
}
