//! Middleware 2 (spec §4.9): when the worker is bound to a specific
//! interface (not `0.0.0.0`), reject any request whose remote address
//! doesn't itself normalize to localhost. A `bind_host` of `0.0.0.0` is
//! an explicit opt-in to wider exposure (see `turnmem-auth`'s loud warning
//! on that value) and skips this guard entirely.

use std::net::SocketAddr;

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
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ServerError> {
    if state.config.bind_host == "0.0.0.0" {
        return Ok(next.run(request).await);
    }
    if !turnmem_sse::is_localhost(&addr.ip().to_string()) {
        return Err(ServerError::Forbidden {
            message: format!("remote address {} is not localhost", addr.ip()),
        });
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
#[path = "remote_guard.test.rs"]
mod tests;
