use super::*;

fn store() -> Store {
    #[allow(clippy::expect_used)]
    Store::open_in_memory(b"test-hmac-key".to_vec()).expect("open in-memory store")
}

#[test]
fn create_session_is_idempotent() {
    let db = store();
    let a = db.create_session("sess-abc12345", "proj").unwrap();
    let b = db.create_session("sess-abc12345", "proj").unwrap();
    assert_eq!(a.id, b.id);
    let sessions = db.list_sessions(Some("proj"), 10, 0).unwrap();
    assert_eq!(sessions.len(), 1);
}

#[test]
fn prompt_counter_increments_monotonically() {
    let db = store();
    let session = db.create_session("s1", "p").unwrap();
    for expected in 1..=5 {
        let count = db.increment_prompt_counter(session.id).unwrap();
        assert_eq!(count, expected);
    }
}

#[test]
fn latest_user_prompt_returns_the_highest_prompt_number() {
    let db = store();
    let session = db.create_session("s1", "p").unwrap();
    assert!(db.get_latest_user_prompt(session.id).unwrap().is_none());
    db.insert_user_prompt(session.id, 1, "first").unwrap();
    db.insert_user_prompt(session.id, 2, "second").unwrap();
    let latest = db.get_latest_user_prompt(session.id).unwrap().unwrap();
    assert_eq!(latest.text, "second");
    assert_eq!(latest.prompt_number, 2);
}

#[test]
fn observation_roundtrip_verifies_hmac() {
    let db = store();
    let session = db.create_session("s1", "p").unwrap();
    let inserted = db
        .insert_observation(NewObservation {
            session_id: session.id,
            prompt_number: 1,
            tool_name: "Read".into(),
            raw_input: Some("{}".into()),
            compressed: "{\"tags\":[]}".into(),
            obs_type: ObsType::Bugfix,
            title: "Fixed thing".into(),
            narrative: "Found and fixed a bug.".into(),
        })
        .unwrap();
    assert!(inserted.hmac_valid);

    let fetched = db.get_observation(inserted.id).unwrap().unwrap();
    assert!(fetched.hmac_valid);
    assert_eq!(fetched.title, "Fixed thing");
}

#[test]
fn tampered_row_fails_verification_but_is_still_returned() {
    let db = store();
    let session = db.create_session("s1", "p").unwrap();
    let inserted = db
        .insert_observation(NewObservation {
            session_id: session.id,
            prompt_number: 1,
            tool_name: "Read".into(),
            raw_input: None,
            compressed: "orig".into(),
            obs_type: ObsType::Other,
            title: "t".into(),
            narrative: "n".into(),
        })
        .unwrap();

    {
        let conn = db.lock();
        conn.execute(
            "UPDATE observations SET narrative = 'tampered' WHERE id = ?1",
            params![inserted.id],
        )
        .unwrap();
    }

    let fetched = db.get_observation(inserted.id).unwrap().unwrap();
    assert!(!fetched.hmac_valid);
    assert_eq!(fetched.narrative, "tampered");
}

#[test]
fn fts_search_finds_inserted_observation() {
    let db = store();
    let session = db.create_session("s1", "proj").unwrap();
    db.insert_observation(NewObservation {
        session_id: session.id,
        prompt_number: 1,
        tool_name: "Bash".into(),
        raw_input: None,
        compressed: "{}".into(),
        obs_type: ObsType::Feature,
        title: "Added retry logic".into(),
        narrative: "Implemented exponential backoff for the queue worker.".into(),
    })
    .unwrap();

    let query = escape_fts_query("backoff").unwrap();
    let results = db.search_index(&query, Some("proj"), 10).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0.title, "Added retry logic");
}

#[test]
fn fts_search_respects_project_scope() {
    let db = store();
    let s1 = db.create_session("s1", "proj-a").unwrap();
    let s2 = db.create_session("s2", "proj-b").unwrap();
    for (session, title) in [(&s1, "alpha thing"), (&s2, "alpha thing")] {
        db.insert_observation(NewObservation {
            session_id: session.id,
            prompt_number: 1,
            tool_name: "Bash".into(),
            raw_input: None,
            compressed: "{}".into(),
            obs_type: ObsType::Other,
            title: title.into(),
            narrative: "matching alpha narrative".into(),
        })
        .unwrap();
    }
    let query = escape_fts_query("alpha").unwrap();
    let results = db.search_index(&query, Some("proj-a"), 10).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0.session_id, s1.id);
}

#[test]
fn enqueue_rejects_oversize_payload() {
    let db = store();
    let session = db.create_session("s1", "p").unwrap();
    let huge = format!("{{\"data\":\"{}\"}}", "x".repeat(MAX_QUEUE_PAYLOAD_BYTES));
    let err = db
        .enqueue(session.id, QueueItemType::Observation, &huge)
        .unwrap_err();
    assert!(matches!(err, StoreErr::PayloadTooLarge { .. }));
}

#[test]
fn enqueue_rejects_invalid_json() {
    let db = store();
    let session = db.create_session("s1", "p").unwrap();
    let err = db
        .enqueue(session.id, QueueItemType::Observation, "not json")
        .unwrap_err();
    assert!(matches!(err, StoreErr::InvalidPayload { .. }));
}

#[test]
fn queue_lifecycle_pending_processing_processed() {
    let db = store();
    let session = db.create_session("s1", "p").unwrap();
    let item = db
        .enqueue(session.id, QueueItemType::Observation, "{}")
        .unwrap();
    assert_eq!(db.dequeue_pending(10).unwrap().len(), 1);

    db.mark_processing(item.id).unwrap();
    assert_eq!(db.dequeue_pending(10).unwrap().len(), 0);

    db.mark_processed(item.id).unwrap();
    let counts = db.queue_counts().unwrap();
    assert_eq!(counts.processed, 1);
    assert_eq!(counts.pending, 0);
    assert_eq!(counts.processing, 0);
}

#[test]
fn retry_count_increments_only_on_failure() {
    let db = store();
    let session = db.create_session("s1", "p").unwrap();
    let item = db
        .enqueue(session.id, QueueItemType::Observation, "{}")
        .unwrap();
    db.mark_processing(item.id).unwrap();
    let retries = db.requeue_after_failure(item.id, "boom").unwrap();
    assert_eq!(retries, 1);

    db.mark_processing(item.id).unwrap();
    db.mark_failed(item.id, "boom again").unwrap();
    let counts = db.queue_counts().unwrap();
    assert_eq!(counts.failed, 1);

    // mark_failed is a terminal-status transition, not a second increment.
    let failed = db.get_queue_item(item.id).unwrap().unwrap();
    assert_eq!(failed.retry_count, 1);
}

#[test]
fn stuck_items_are_detected_by_age() {
    let db = store();
    let session = db.create_session("s1", "p").unwrap();
    let item = db
        .enqueue(session.id, QueueItemType::Observation, "{}")
        .unwrap();
    db.mark_processing(item.id).unwrap();
    {
        let conn = db.lock();
        conn.execute(
            "UPDATE queue_items SET started_at = ?2 WHERE id = ?1",
            params![item.id, now_epoch() - 600],
        )
        .unwrap();
    }
    let stuck = db.list_stuck(300).unwrap();
    assert_eq!(stuck.len(), 1);
    assert_eq!(stuck[0].id, item.id);
}

#[test]
fn recover_stuck_moves_rows_back_to_pending() {
    let db = store();
    let session = db.create_session("s1", "p").unwrap();
    let item = db
        .enqueue(session.id, QueueItemType::Observation, "{}")
        .unwrap();
    db.mark_processing(item.id).unwrap();
    let recovered = db.recover_stuck(None).unwrap();
    assert_eq!(recovered, vec![item.id]);
    assert_eq!(db.dequeue_pending(10).unwrap().len(), 1);
}

#[test]
fn stats_are_scoped_to_project() {
    let db = store();
    let s1 = db.create_session("s1", "proj-a").unwrap();
    db.create_session("s2", "proj-b").unwrap();
    db.insert_observation(NewObservation {
        session_id: s1.id,
        prompt_number: 1,
        tool_name: "Read".into(),
        raw_input: None,
        compressed: "{}".into(),
        obs_type: ObsType::Other,
        title: "t".into(),
        narrative: "n".into(),
    })
    .unwrap();

    let stats = db.stats(Some("proj-a")).unwrap();
    assert_eq!(stats.observations, 1);
    assert_eq!(stats.sessions, 1);

    let all_stats = db.stats(None).unwrap();
    assert_eq!(all_stats.sessions, 2);
}
