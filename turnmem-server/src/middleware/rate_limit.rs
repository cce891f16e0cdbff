//! Middleware 3 (spec §4.9): token-bucket rate limiting keyed by remote
//! address, backed by `crate::rate_limit::RateLimiter`.

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ServerError;
use crate::state::AppState;

pub async fn guard(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ServerError> {
    if state.rate_limiter.allow(addr.ip()) {
        Ok(next.run(request).await)
    } else {
        Err(ServerError::RateLimited)
    }
}

#[cfg(test)]
#[path = "rate_limit.test.rs"]
mod tests;
