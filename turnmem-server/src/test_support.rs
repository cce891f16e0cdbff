//! Shared `AppState` builder for middleware and route unit tests.

use std::sync::Arc;
use std::time::Instant;

use turnmem_auth::Config;
use turnmem_queue::NoopNotifier;
use turnmem_queue::QueueEngine;
use turnmem_sse::SseBroker;
use turnmem_store::Store;

use crate::rate_limit::RateLimiter;
use crate::state::AppState;

pub fn test_state() -> AppState {
    let store = Arc::new(Store::open_in_memory(b"test-hmac-key".to_vec()).unwrap());
    let sse = SseBroker::new(store.clone());
    let queue = QueueEngine::new(store.clone(), Arc::new(NoopNotifier));
    let config = Config {
        port: 8765,
        bind_host: "127.0.0.1".to_string(),
        data_dir: std::env::temp_dir(),
        model: "claude-compress-small".to_string(),
        token_budget: 1800,
        max_observations: 40,
        max_sessions: 5,
        stuck_threshold_secs: 300,
        max_retries: 3,
    };

    AppState {
        store,
        queue,
        sse,
        config: Arc::new(config),
        auth_token: Arc::new("test-token".to_string()),
        rate_limiter: RateLimiter::spawn(),
        started_at: Instant::now(),
    }
}
