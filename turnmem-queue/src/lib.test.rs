use super::*;
use async_trait::async_trait;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

struct CountingProcessor {
    calls: AtomicUsize,
    fail_first_n: usize,
}

#[async_trait]
impl Processor for CountingProcessor {
    async fn process(&self, _item: &QueueItem) -> std::result::Result<(), String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first_n {
            Err("synthetic failure".to_string())
        } else {
            Ok(())
        }
    }
}

struct RecordingNotifier {
    created: AtomicUsize,
    failed: AtomicUsize,
}

impl RecordingNotifier {
    fn new() -> Self {
        RecordingNotifier {
            created: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn observation_created(&self, _session_id: i64, _queue_id: i64) {
        self.created.fetch_add(1, Ordering::SeqCst);
    }
    fn item_failed(&self, _session_id: i64, _queue_id: i64, _error: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

fn test_store() -> Arc<Store> {
    Arc::new(Store::open_in_memory(b"test-key".to_vec()).unwrap())
}

#[tokio::test]
async fn enqueue_creates_session_and_notifies() {
    let store = test_store();
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = QueueEngine::new(store.clone(), notifier.clone());

    let item = engine
        .enqueue("session-a", "edit", "{}", "some output", "proj")
        .unwrap();

    assert_eq!(item.session_id, store.get_session_by_key("session-a").unwrap().unwrap().id);
    assert_eq!(notifier.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn enqueue_truncates_oversize_tool_result() {
    let store = test_store();
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = QueueEngine::new(store.clone(), notifier);
    let huge = "a".repeat(60 * 1024);

    let item = engine
        .enqueue("session-b", "bash", "{}", &huge, "proj")
        .unwrap();

    assert!(item.payload.len() < 60 * 1024);
    assert!(item.payload.contains("truncated"));
}

#[tokio::test]
async fn successful_processing_marks_item_processed() {
    let store = test_store();
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = QueueEngine::new(store.clone(), notifier.clone());
    let processor = Arc::new(CountingProcessor {
        calls: AtomicUsize::new(0),
        fail_first_n: 0,
    });

    engine.start(processor.clone()).await.unwrap();
    engine
        .enqueue("session-c", "edit", "{}", "ok", "proj")
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    let counts = store.queue_counts().unwrap();
    assert_eq!(counts.processed, 1);
    engine.stop();
}

#[tokio::test]
async fn exhausting_retries_marks_item_failed() {
    let store = test_store();
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = QueueEngine::with_config(store.clone(), notifier.clone(), 1, 300);
    let processor = Arc::new(CountingProcessor {
        calls: AtomicUsize::new(0),
        fail_first_n: 100,
    });

    engine.start(processor.clone()).await.unwrap();
    let item = engine
        .enqueue("session-d", "edit", "{}", "will fail", "proj")
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let counts = store.queue_counts().unwrap();
    assert_eq!(counts.failed, 1);
    assert_eq!(notifier.failed.load(Ordering::SeqCst), 1);

    // max_retries = 1: a single failure event exhausts retries. mark_failed
    // must not bump retry_count a second time.
    let failed = store.get_queue_item(item.id).unwrap().unwrap();
    assert_eq!(failed.retry_count, 1);
    engine.stop();
}

#[tokio::test]
async fn enqueue_summary_tags_the_row_and_notifies() {
    let store = test_store();
    let session = store.create_session("session-f", "proj").unwrap();
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = QueueEngine::new(store.clone(), notifier.clone());

    let item = engine
        .enqueue_summary(session.id, Some("do the thing"), Some("done"))
        .unwrap();

    assert_eq!(item.item_type, QueueItemType::Summary);
    assert!(item.payload.contains("do the thing"));
    assert_eq!(notifier.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn recover_stuck_requeues_processing_rows() {
    let store = test_store();
    let session = store.create_session("session-e", "proj").unwrap();
    let item = store
        .enqueue(session.id, QueueItemType::Observation, "{}")
        .unwrap();
    store.mark_processing(item.id).unwrap();

    let notifier = Arc::new(RecordingNotifier::new());
    let engine = QueueEngine::new(store.clone(), notifier);
    engine.recover_stuck().unwrap();

    let counts = store.queue_counts().unwrap();
    assert_eq!(counts.pending, 1);
    assert_eq!(counts.processing, 0);
}
