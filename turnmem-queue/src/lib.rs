//! Queue Engine (spec §4.5, component C5).
//!
//! An in-memory scheduler layered over the persistent queue table: at most
//! one in-flight item per session, 500 ms polling, 60 s stuck scanning,
//! exponential backoff on retry. Grounded on the teacher's worker-pool
//! pattern (`cocode-rs` task schedulers use the same poll-interval +
//! per-key lock map shape), adapted to tokio's task/time primitives.

mod error;
mod traits;

pub use error::QueueError;
pub use error::Result;
pub use traits::NoopNotifier;
pub use traits::Notifier;
pub use traits::Processor;

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::task::JoinSet;
use turnmem_store::QueueItem;
use turnmem_store::QueueItemType;
use turnmem_store::Store;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_STUCK_THRESHOLD_SECS: i64 = 300;
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const STUCK_SCAN_INTERVAL: Duration = Duration::from_secs(60);
pub const REFILL_CAP: i64 = 200;
pub const TOOL_RESULT_LIMIT_BYTES: usize = 50 * 1024;

struct Handles {
    poll: JoinHandle<()>,
    stuck: JoinHandle<()>,
}

struct Shared {
    store: Arc<Store>,
    notifier: Arc<dyn Notifier>,
    processor: Mutex<Option<Arc<dyn Processor>>>,
    processing_by_session: Mutex<HashMap<i64, i64>>,
    pending: Mutex<VecDeque<QueueItem>>,
    max_retries: u32,
    stuck_threshold_secs: i64,
}

/// The queue engine. Cheap to clone (an `Arc` internally); clone it to
/// hand a handle to background tasks or HTTP handlers.
#[derive(Clone)]
pub struct QueueEngine {
    shared: Arc<Shared>,
    handles: Arc<Mutex<Option<Handles>>>,
}

impl QueueEngine {
    pub fn new(store: Arc<Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_config(
            store,
            notifier,
            DEFAULT_MAX_RETRIES,
            DEFAULT_STUCK_THRESHOLD_SECS,
        )
    }

    pub fn with_config(
        store: Arc<Store>,
        notifier: Arc<dyn Notifier>,
        max_retries: u32,
        stuck_threshold_secs: i64,
    ) -> Self {
        QueueEngine {
            shared: Arc::new(Shared {
                store,
                notifier,
                processor: Mutex::new(None),
                processing_by_session: Mutex::new(HashMap::new()),
                pending: Mutex::new(VecDeque::new()),
                max_retries,
                stuck_threshold_secs,
            }),
            handles: Arc::new(Mutex::new(None)),
        }
    }

    /// Resets stale `processing` rows from a previous run, refills the
    /// in-memory pending list, and schedules the poll and stuck-scan
    /// timers. Idempotent only in the sense that calling it twice spawns a
    /// second set of timers; callers should call it once at startup.
    pub async fn start(&self, processor: Arc<dyn Processor>) -> Result<()> {
        self.shared.store.recover_stuck(None)?;
        self.refill()?;
        *lock(&self.shared.processor) = Some(processor);

        let poll_shared = self.shared.clone();
        let poll = tokio::spawn(async move {
            let mut interval = tokio::time::interval(POLL_INTERVAL);
            loop {
                interval.tick().await;
                process_batch(&poll_shared).await;
            }
        });

        let stuck_shared = self.shared.clone();
        let stuck = tokio::spawn(async move {
            let mut interval = tokio::time::interval(STUCK_SCAN_INTERVAL);
            loop {
                interval.tick().await;
                scan_stuck(&stuck_shared);
            }
        });

        *self.handles.lock().unwrap_or_else(|p| p.into_inner()) = Some(Handles { poll, stuck });
        Ok(())
    }

    /// Cancels the poll and stuck-scan timers. In-flight processing tasks
    /// are left to complete (spec §4.5 `stop()`).
    pub fn stop(&self) {
        if let Some(handles) = self.handles.lock().unwrap_or_else(|p| p.into_inner()).take() {
            handles.poll.abort();
            handles.stuck.abort();
        }
    }

    /// Ensures the session exists, truncates `tool_result`, persists the
    /// queue row, appends it to the in-memory list, notifies subscribers,
    /// and — if the session is not currently locked — kicks off an
    /// immediate processing pass.
    pub fn enqueue(
        &self,
        session_key: &str,
        tool_name: &str,
        tool_input: &str,
        tool_result: &str,
        project: &str,
    ) -> Result<QueueItem> {
        let session = self.shared.store.create_session(session_key, project)?;
        if session.project.is_empty() && !project.is_empty() {
            self.shared
                .store
                .backfill_session_project(session.id, project)?;
        }

        let truncated = turnmem_scrubber::enforce_byte_limit(tool_result, TOOL_RESULT_LIMIT_BYTES);
        let payload = serde_json::json!({
            "tool_name": tool_name,
            "tool_input": tool_input,
            "tool_result": truncated,
        })
        .to_string();

        let item = self
            .shared
            .store
            .enqueue(session.id, QueueItemType::Observation, &payload)?;

        lock(&self.shared.pending).push_back(item.clone());
        self.shared
            .notifier
            .observation_created(session.id, item.id);

        let already_locked = lock(&self.shared.processing_by_session).contains_key(&session.id);
        if !already_locked {
            let shared = self.shared.clone();
            tokio::spawn(async move {
                process_batch(&shared).await;
            });
        }

        Ok(item)
    }

    /// Enqueues a session-summary request (`POST /api/sessions/summarize`).
    /// Mirrors `enqueue` but carries the session's last exchange instead of
    /// a tool call, and tags the row `QueueItemType::Summary` so the
    /// processor routes it to the Summarizer instead of the Compressor.
    pub fn enqueue_summary(
        &self,
        session_id: i64,
        last_user_message: Option<&str>,
        last_assistant_message: Option<&str>,
    ) -> Result<QueueItem> {
        let payload = serde_json::json!({
            "last_user_message": last_user_message,
            "last_assistant_message": last_assistant_message,
        })
        .to_string();

        let item = self
            .shared
            .store
            .enqueue(session_id, QueueItemType::Summary, &payload)?;

        lock(&self.shared.pending).push_back(item.clone());
        self.shared.notifier.observation_created(session_id, item.id);

        let already_locked = lock(&self.shared.processing_by_session).contains_key(&session_id);
        if !already_locked {
            let shared = self.shared.clone();
            tokio::spawn(async move {
                process_batch(&shared).await;
            });
        }

        Ok(item)
    }

    /// Moves stuck `processing` rows back to `pending` and refills the
    /// in-memory list (spec §4.5 `recoverStuck`).
    pub fn recover_stuck(&self) -> Result<()> {
        self.shared.store.recover_stuck(None)?;
        self.refill()
    }

    fn refill(&self) -> Result<()> {
        let items = self.shared.store.dequeue_pending(REFILL_CAP)?;
        let mut pending = lock(&self.shared.pending);
        for item in items {
            if !pending.iter().any(|existing| existing.id == item.id) {
                pending.push_back(item);
            }
        }
        Ok(())
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Drains every in-memory item whose session is currently unlocked,
/// processes them concurrently, and awaits the whole batch as a settled
/// set so one failure cannot cancel its siblings.
async fn process_batch(shared: &Arc<Shared>) {
    let processor_opt = lock(&shared.processor).clone();
    let processor = match processor_opt {
        Some(p) => p,
        None => return,
    };

    let mut batch = Vec::new();
    {
        let mut pending = lock(&shared.pending);
        let mut locked = lock(&shared.processing_by_session);
        let mut remaining = VecDeque::with_capacity(pending.len());
        while let Some(item) = pending.pop_front() {
            if locked.contains_key(&item.session_id) {
                remaining.push_back(item);
            } else {
                locked.insert(item.session_id, item.id);
                batch.push(item);
            }
        }
        *pending = remaining;
    }

    if batch.is_empty() {
        return;
    }

    let mut tasks = JoinSet::new();
    for item in batch {
        let shared = shared.clone();
        let processor = processor.clone();
        tasks.spawn(async move {
            process_one(&shared, &processor, item).await;
        });
    }
    while tasks.join_next().await.is_some() {}
}

async fn process_one(shared: &Arc<Shared>, processor: &Arc<dyn Processor>, item: QueueItem) {
    if let Err(err) = shared.store.mark_processing(item.id) {
        tracing::warn!(queue_id = item.id, %err, "failed to mark queue item processing");
        unlock(shared, item.session_id);
        return;
    }

    match processor.process(&item).await {
        Ok(()) => {
            if let Err(err) = shared.store.mark_processed(item.id) {
                tracing::warn!(queue_id = item.id, %err, "failed to mark queue item processed");
            }
            // The processor itself broadcasts the fully-informed
            // observation-processed / session-summary-created event: it has
            // the title, kind, and session/project context this layer
            // doesn't carry.
            unlock(shared, item.session_id);
        }
        Err(error_text) => {
            handle_failure(shared, item, error_text).await;
        }
    }
}

async fn handle_failure(shared: &Arc<Shared>, item: QueueItem, error_text: String) {
    let retry_count = match shared.store.requeue_after_failure(item.id, &error_text) {
        Ok(n) => n,
        Err(err) => {
            tracing::warn!(queue_id = item.id, %err, "failed to requeue after failure");
            unlock(shared, item.session_id);
            return;
        }
    };

    if retry_count >= shared.max_retries as i64 {
        if let Err(err) = shared.store.mark_failed(item.id, &error_text) {
            tracing::warn!(queue_id = item.id, %err, "failed to mark queue item failed");
        }
        shared
            .notifier
            .item_failed(item.session_id, item.id, &error_text);
        unlock(shared, item.session_id);
        return;
    }

    unlock(shared, item.session_id);

    let backoff = Duration::from_secs(2u64.saturating_pow(retry_count.max(1) as u32 - 1) * 2);
    let shared = shared.clone();
    tokio::spawn(async move {
        tokio::time::sleep(backoff).await;
        lock(&shared.pending).push_back(item);
        process_batch(&shared).await;
    });
}

fn unlock(shared: &Arc<Shared>, session_id: i64) {
    lock(&shared.processing_by_session).remove(&session_id);
}

/// Scans for `processing` rows stuck past the threshold, fails them, and
/// releases their in-memory locks (spec §4.5 "stuck detection").
fn scan_stuck(shared: &Arc<Shared>) {
    let stuck = match shared.store.list_stuck(shared.stuck_threshold_secs) {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!(%err, "failed to scan for stuck queue items");
            return;
        }
    };
    for item in stuck {
        if let Err(err) = shared
            .store
            .mark_failed(item.id, "Stuck: exceeded processing timeout")
        {
            tracing::warn!(queue_id = item.id, %err, "failed to mark stuck queue item failed");
        }
        unlock(shared, item.session_id);
        shared.notifier.item_stuck(item.session_id, item.id);
    }
}

#[cfg(test)]
#[path = "lib.test.rs"]
mod tests;
