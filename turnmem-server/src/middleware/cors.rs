//! Middleware 1 (spec §4.9): CORS allowlist, no wildcard.

use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::header;
use tower_http::cors::CorsLayer;

pub fn layer(port: u16) -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        format!("http://localhost:{port}"),
        format!("http://127.0.0.1:{port}"),
    ]
    .iter()
    .filter_map(|origin| HeaderValue::from_str(origin).ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

#[cfg(test)]
#[path = "cors.test.rs"]
mod tests;
