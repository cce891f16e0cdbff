use super::*;

fn test_store() -> Arc<Store> {
    #[allow(clippy::expect_used)]
    Arc::new(Store::open_in_memory(b"test-hmac-key".to_vec()).expect("open in-memory store"))
}

#[tokio::test]
async fn rejects_non_localhost_remote() {
    let broker = SseBroker::new(test_store());
    let err = broker.add_client("10.0.0.5:1234").unwrap_err();
    assert!(matches!(err, SseError::NotLocalhost { .. }));
    broker.stop();
}

#[tokio::test]
async fn accepts_localhost_remote_and_delivers_broadcast() {
    let broker = SseBroker::new(test_store());
    let (_id, mut rx) = broker.add_client("127.0.0.1:54321").unwrap();
    broker.broadcast_observation_created(1, 2, "demo", "Edit");
    let frame = rx.recv().await.unwrap();
    assert!(frame.contains("event: observation-created"));
    assert!(frame.contains("\"project\":\"demo\""));
    assert!(frame.contains("\"toolName\":\"Edit\""));
    broker.stop();
}

#[tokio::test]
async fn each_broadcast_gets_an_increasing_id() {
    let broker = SseBroker::new(test_store());
    let (_id, mut rx) = broker.add_client("localhost").unwrap();
    broker.broadcast_user_prompt_created(1, 1, "demo", 1);
    broker.broadcast_user_prompt_created(2, 1, "demo", 2);
    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert!(first.starts_with("id: 1\n"));
    assert!(second.starts_with("id: 2\n"));
    broker.stop();
}

#[tokio::test]
async fn remove_client_stops_further_delivery() {
    let broker = SseBroker::new(test_store());
    let (id, mut rx) = broker.add_client("::1").unwrap();
    broker.remove_client(id);
    broker.broadcast_user_prompt_created(1, 1, "demo", 1);
    assert!(rx.recv().await.is_none());
    broker.stop();
}

#[tokio::test]
async fn dropping_the_receiver_reaps_the_client_on_next_broadcast() {
    let broker = SseBroker::new(test_store());
    let (_id, rx) = broker.add_client("127.0.0.1").unwrap();
    drop(rx);
    assert_eq!(broker.client_count(), 1);
    broker.broadcast_user_prompt_created(1, 1, "demo", 1);
    assert_eq!(broker.client_count(), 0);
    broker.stop();
}

#[tokio::test(start_paused = true)]
async fn keep_alive_ping_fires_every_thirty_seconds() {
    let broker = SseBroker::new(test_store());
    let (_id, mut rx) = broker.add_client("127.0.0.1").unwrap();
    tokio::time::advance(Duration::from_secs(31)).await;
    let frame = rx.recv().await.unwrap();
    assert!(frame.contains("event: ping"));
    assert!(frame.contains("\"ts\""));
    broker.stop();
}

#[tokio::test]
async fn notifier_observation_created_looks_up_project_from_the_session() {
    let store = test_store();
    let session = store.create_session("key-1", "demo").unwrap();
    let broker = SseBroker::new(Arc::clone(&store));
    let (_id, mut rx) = broker.add_client("127.0.0.1").unwrap();

    turnmem_queue::Notifier::observation_created(&broker, session.id, 42);

    let frame = rx.recv().await.unwrap();
    assert!(frame.contains("\"project\":\"demo\""));
    assert!(frame.contains("\"queueId\":42"));
    broker.stop();
}
