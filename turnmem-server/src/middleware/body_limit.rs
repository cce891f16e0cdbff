//! Middleware 4 (spec §4.9): 100 KB cap, enforced on both the declared
//! `Content-Length` and the bytes actually read from the body, so a
//! missing/understated header can't smuggle an oversize request past the
//! check.

use axum::body::Body;
use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::header::CONTENT_LENGTH;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ServerError;

pub const MAX_BODY_BYTES: usize = 100 * 1024;

pub async fn guard(request: Request, next: Next) -> Result<Response, ServerError> {
    let declared_len = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > MAX_BODY_BYTES) {
        return Err(ServerError::TooLarge { limit: MAX_BODY_BYTES });
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| ServerError::TooLarge { limit: MAX_BODY_BYTES })?;
    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}

#[cfg(test)]
#[path = "body_limit.test.rs"]
mod tests;
