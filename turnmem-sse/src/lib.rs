//! SSE Broker (spec §4.8, component C8): localhost-only subscriber
//! registration, event broadcast, keep-alive pings, dead-client reaping.

mod error;
mod frame;
mod locality;

pub use error::Result;
pub use error::SseError;
pub use locality::is_localhost;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use turnmem_store::Store;

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub type ClientId = u64;

struct Client {
    tx: mpsc::UnboundedSender<String>,
}

struct Shared {
    store: Arc<Store>,
    clients: Mutex<HashMap<ClientId, Client>>,
    next_client_id: AtomicU64,
    next_event_id: AtomicU64,
}

/// Cloning an `SseBroker` shares the same subscriber map and keep-alive
/// task; `stop()` on any clone tears down both for all of them.
#[derive(Clone)]
pub struct SseBroker {
    shared: Arc<Shared>,
    ping_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SseBroker {
    pub fn new(store: Arc<Store>) -> Self {
        let shared = Arc::new(Shared {
            store,
            clients: Mutex::new(HashMap::new()),
            next_client_id: AtomicU64::new(1),
            next_event_id: AtomicU64::new(1),
        });
        let broker = SseBroker {
            shared: Arc::clone(&shared),
            ping_task: Arc::new(Mutex::new(None)),
        };
        let task_shared = Arc::clone(&shared);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(PING_INTERVAL);
            loop {
                interval.tick().await;
                send_ping(&task_shared);
            }
        });
        *lock(&broker.ping_task) = Some(handle);
        broker
    }

    /// Admits a subscriber whose `remote` normalizes to localhost (spec
    /// §4.8). Returns the new client id and the receiving half of its
    /// frame channel; callers wire the channel into the HTTP response body.
    pub fn add_client(&self, remote: &str) -> Result<(ClientId, mpsc::UnboundedReceiver<String>)> {
        if !locality::is_localhost(remote) {
            return Err(SseError::NotLocalhost {
                remote: remote.to_string(),
            });
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.shared.next_client_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.shared.clients).insert(id, Client { tx });
        Ok((id, rx))
    }

    pub fn remove_client(&self, id: ClientId) {
        lock(&self.shared.clients).remove(&id);
    }

    pub fn client_count(&self) -> usize {
        lock(&self.shared.clients).len()
    }

    pub fn broadcast_observation_created(&self, queue_id: i64, session_id: i64, project: &str, tool_name: &str) {
        self.broadcast(
            "observation-created",
            serde_json::json!({
                "queueId": queue_id,
                "sessionId": session_id,
                "project": project,
                "toolName": tool_name,
            }),
        );
    }

    pub fn broadcast_observation_processed(
        &self,
        observation_id: i64,
        queue_id: i64,
        session_id: i64,
        project: &str,
        title: &str,
        kind: &str,
    ) {
        self.broadcast(
            "observation-processed",
            serde_json::json!({
                "observationId": observation_id,
                "queueId": queue_id,
                "sessionId": session_id,
                "project": project,
                "title": title,
                "kind": kind,
            }),
        );
    }

    pub fn broadcast_session_summary_created(&self, summary_id: i64, session_id: i64, project: &str, request: &str) {
        self.broadcast(
            "session-summary-created",
            serde_json::json!({
                "summaryId": summary_id,
                "sessionId": session_id,
                "project": project,
                "request": request,
            }),
        );
    }

    pub fn broadcast_user_prompt_created(&self, prompt_id: i64, session_id: i64, project: &str, prompt_number: i64) {
        self.broadcast(
            "user-prompt-created",
            serde_json::json!({
                "promptId": prompt_id,
                "sessionId": session_id,
                "project": project,
                "promptNumber": prompt_number,
            }),
        );
    }

    fn broadcast(&self, event: &str, data: serde_json::Value) {
        let id = self.shared.next_event_id.fetch_add(1, Ordering::SeqCst);
        let frame = frame::format_frame(Some(id), event, &data);
        send_frame_to_all(&self.shared, frame);
    }

    /// Aborts the keep-alive task and drops every subscriber channel,
    /// which ends their SSE response streams.
    pub fn stop(&self) {
        if let Some(handle) = lock(&self.ping_task).take() {
            handle.abort();
        }
        lock(&self.shared.clients).clear();
    }
}

fn send_ping(shared: &Arc<Shared>) {
    let ts = turnmem_store::now_epoch();
    let id = shared.next_event_id.fetch_add(1, Ordering::SeqCst);
    let frame = frame::format_frame(Some(id), "ping", &serde_json::json!({"ts": ts}));
    send_frame_to_all(shared, frame);
}

fn send_frame_to_all(shared: &Arc<Shared>, frame: String) {
    let mut dead = Vec::new();
    {
        let clients = lock(&shared.clients);
        for (client_id, client) in clients.iter() {
            if client.tx.send(frame.clone()).is_err() {
                dead.push(*client_id);
            }
        }
    }
    if !dead.is_empty() {
        let mut clients = lock(&shared.clients);
        for id in dead {
            clients.remove(&id);
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Wires the queue engine's generic lifecycle hook to the one SSE event
/// it can support with the data `Notifier` carries (session id, queue id).
/// `observation-created`'s `toolName` is not available at this call site,
/// so it is sent empty here; a handler with the full tool-call context
/// (e.g. the HTTP surface right after `POST /api/observations`) should
/// prefer calling `broadcast_observation_created` directly instead.
/// `observation-processed` needs the compressed title/kind, which only the
/// processor has, so it is broadcast directly from there
/// (`QueueProcessor::store_observation`), never through this trait.
/// `item_failed`/`item_stuck` have no corresponding event name in spec
/// §6.4 and are only logged.
impl turnmem_queue::Notifier for SseBroker {
    fn observation_created(&self, session_id: i64, queue_id: i64) {
        let project = self.project_for_session(session_id);
        self.broadcast_observation_created(queue_id, session_id, &project, "");
    }

    fn item_failed(&self, session_id: i64, queue_id: i64, error: &str) {
        tracing::warn!(session_id, queue_id, error, "queue item failed");
    }

    fn item_stuck(&self, session_id: i64, queue_id: i64) {
        tracing::warn!(session_id, queue_id, "queue item stuck");
    }
}

impl SseBroker {
    fn project_for_session(&self, session_id: i64) -> String {
        self.shared
            .store
            .get_session_by_id(session_id)
            .ok()
            .flatten()
            .map(|s| s.project)
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "lib.test.rs"]
mod tests;
