//! Middleware 6 (spec §4.9): POST/PUT bodies must be declared as
//! `application/json`. GET/DELETE/OPTIONS carry no body and are exempt.

use axum::body::Body;
use axum::http::Method;
use axum::http::Request;
use axum::http::header::CONTENT_TYPE;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ServerError;

pub async fn guard(request: Request<Body>, next: Next) -> Result<Response, ServerError> {
    let needs_json = matches!(*request.method(), Method::POST | Method::PUT);
    if needs_json {
        let is_json = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));
        if !is_json {
            return Err(ServerError::UnsupportedMediaType);
        }
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
#[path = "content_type.test.rs"]
mod tests;
