//! Shared application state handed to every handler and middleware layer.

use std::sync::Arc;
use std::time::Instant;

use turnmem_auth::Config;
use turnmem_queue::QueueEngine;
use turnmem_sse::SseBroker;
use turnmem_store::Store;

use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub queue: QueueEngine,
    pub sse: SseBroker,
    pub config: Arc<Config>,
    pub auth_token: Arc<String>,
    pub rate_limiter: Arc<RateLimiter>,
    pub started_at: Instant,
}
