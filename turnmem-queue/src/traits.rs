//! The two seams the queue engine is built around: something that turns a
//! raw tool invocation into a stored observation/summary (`Processor`),
//! and something that tells the outside world what just happened
//! (`Notifier`, implemented by `turnmem-sse` in the full worker).

use async_trait::async_trait;
use turnmem_store::QueueItem;

/// Consumes one queue item (compress, scrub, anomaly-filter, persist).
/// Errors are turned into the queue's retry/backoff machinery; the
/// returned string becomes the row's `error` column.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, item: &QueueItem) -> std::result::Result<(), String>;
}

/// Fire-and-forget event sink (spec §6.4 SSE events). Implementations
/// must not block: the queue engine calls these from inside its lock
/// sections.
pub trait Notifier: Send + Sync {
    fn observation_created(&self, session_id: i64, queue_id: i64) {
        let _ = (session_id, queue_id);
    }
    fn item_failed(&self, session_id: i64, queue_id: i64, error: &str) {
        let _ = (session_id, queue_id, error);
    }
    fn item_stuck(&self, session_id: i64, queue_id: i64) {
        let _ = (session_id, queue_id);
    }
}

/// A `Notifier` that drops every event; useful for tests and for callers
/// that do not wire up SSE.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {}
