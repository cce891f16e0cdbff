//! Middleware 5 (spec §4.9): bearer token auth on every route except
//! `GET /health`. Comparison is constant-time via `turnmem_auth::verify`.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ServerError;
use crate::state::AppState;

pub async fn guard(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ServerError> {
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if turnmem_auth::verify(token, &state.auth_token) => Ok(next.run(request).await),
        _ => Err(ServerError::Unauthorized),
    }
}

#[cfg(test)]
#[path = "auth.test.rs"]
mod tests;
