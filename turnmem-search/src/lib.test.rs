use super::*;
use turnmem_store::NewObservation;

fn test_store() -> Store {
    Store::open_in_memory(b"test-key".to_vec()).unwrap()
}

fn insert(store: &Store, session_id: i64, prompt_number: i64, title: &str, ty: ObsType) -> Observation {
    store
        .insert_observation(NewObservation {
            session_id,
            prompt_number,
            tool_name: "edit".to_string(),
            raw_input: None,
            compressed: format!("compressed {title}"),
            obs_type: ty,
            title: title.to_string(),
            narrative: format!("narrative about {title}"),
        })
        .unwrap()
}

#[test]
fn search_index_returns_empty_for_blank_query() {
    let store = test_store();
    let rows = search_index(&store, "   ", None).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn search_index_finds_matching_title() {
    let store = test_store();
    let session = store.create_session("sess-1", "proj").unwrap();
    insert(&store, session.id, 1, "fixed pagination bug", ObsType::Bugfix);
    insert(&store, session.id, 2, "added new widget", ObsType::Feature);

    let rows = search_index(&store, "pagination", None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "fixed pagination bug");
}

#[test]
fn get_timeline_returns_window_around_anchor() {
    let store = test_store();
    let session = store.create_session("sess-2", "proj").unwrap();
    let mut obs = Vec::new();
    for i in 0..10 {
        obs.push(insert(&store, session.id, i, &format!("obs {i}"), ObsType::Other));
    }
    let anchor = obs[5].id;
    let window = get_timeline(&store, anchor, 2).unwrap();
    assert_eq!(window.len(), 5); // 2 before, anchor, 2 after
    assert_eq!(window[2].id, anchor);
}

#[test]
fn get_timeline_clamps_at_session_boundaries() {
    let store = test_store();
    let session = store.create_session("sess-3", "proj").unwrap();
    let obs = insert(&store, session.id, 1, "only one", ObsType::Other);
    let window = get_timeline(&store, obs.id, 5).unwrap();
    assert_eq!(window.len(), 1);
}

#[test]
fn get_timeline_missing_anchor_is_empty() {
    let store = test_store();
    let window = get_timeline(&store, 999, 5).unwrap();
    assert!(window.is_empty());
}

#[test]
fn get_by_ids_is_ascending_by_created_at() {
    let store = test_store();
    let session = store.create_session("sess-4", "proj").unwrap();
    let a = insert(&store, session.id, 1, "first", ObsType::Other);
    let b = insert(&store, session.id, 2, "second", ObsType::Other);
    let rows = get_by_ids(&store, &[b.id, a.id]).unwrap();
    assert_eq!(rows.iter().map(|o| o.id).collect::<Vec<_>>(), vec![a.id, b.id]);
}

#[test]
fn search_keyword_ranks_by_bm25() {
    let store = test_store();
    let session = store.create_session("sess-5", "proj").unwrap();
    insert(&store, session.id, 1, "pagination bug in list view", ObsType::Bugfix);
    insert(&store, session.id, 2, "unrelated refactor", ObsType::Refactor);
    let results = search_keyword_default(&store, "pagination", None).unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].title.contains("pagination"));
}

#[test]
fn search_by_type_filters_correctly() {
    let store = test_store();
    let session = store.create_session("sess-6", "proj").unwrap();
    insert(&store, session.id, 1, "a bug", ObsType::Bugfix);
    insert(&store, session.id, 2, "a feature", ObsType::Feature);
    let results = search_by_type(&store, "bugfix", None, 20).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].obs_type, ObsType::Bugfix);
}

#[test]
fn search_by_date_range_is_ascending() {
    let store = test_store();
    let session = store.create_session("sess-7", "proj").unwrap();
    let a = insert(&store, session.id, 1, "first", ObsType::Other);
    let b = insert(&store, session.id, 2, "second", ObsType::Other);
    let results = search_by_date_range(&store, 0, i64::MAX, None).unwrap();
    assert_eq!(results.iter().map(|o| o.id).collect::<Vec<_>>(), vec![a.id, b.id]);
}
