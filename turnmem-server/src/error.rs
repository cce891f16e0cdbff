//! Collects every crate's error type into one enum and maps it onto the
//! `{error: "<message>"}` envelope from spec §6.1/§7.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;
use snafu::Snafu;
use turnmem_error::Classify;
use turnmem_error::Kind;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Snafu)]
pub enum ServerError {
    #[snafu(display("{message}"))]
    Validation { message: String },

    #[snafu(display("missing or invalid bearer token"))]
    Unauthorized,

    #[snafu(display("{message}"))]
    Forbidden { message: String },

    #[snafu(display("not found"))]
    NotFound,

    #[snafu(display("request body exceeds {limit} bytes"))]
    TooLarge { limit: usize },

    #[snafu(display("Content-Type must be application/json"))]
    UnsupportedMediaType,

    #[snafu(display("rate limit exceeded"))]
    RateLimited,

    #[snafu(display("{source}"))]
    Store { source: turnmem_store::StoreErr },

    #[snafu(display("{source}"))]
    Queue { source: turnmem_queue::QueueError },

    #[snafu(display("{source}"))]
    Search { source: turnmem_search::SearchError },

    #[snafu(display("{source}"))]
    Context { source: turnmem_context::ContextError },

    #[snafu(display("{source}"))]
    Sse { source: turnmem_sse::SseError },

    #[snafu(display("{source}"))]
    Scrub { source: turnmem_scrubber::ScrubError },

    #[snafu(display("{source}"))]
    Auth { source: turnmem_auth::AuthError },
}

impl From<turnmem_store::StoreErr> for ServerError {
    fn from(source: turnmem_store::StoreErr) -> Self {
        ServerError::Store { source }
    }
}

impl From<turnmem_queue::QueueError> for ServerError {
    fn from(source: turnmem_queue::QueueError) -> Self {
        ServerError::Queue { source }
    }
}

impl From<turnmem_search::SearchError> for ServerError {
    fn from(source: turnmem_search::SearchError) -> Self {
        ServerError::Search { source }
    }
}

impl From<turnmem_context::ContextError> for ServerError {
    fn from(source: turnmem_context::ContextError) -> Self {
        ServerError::Context { source }
    }
}

impl From<turnmem_sse::SseError> for ServerError {
    fn from(source: turnmem_sse::SseError) -> Self {
        ServerError::Sse { source }
    }
}

impl From<turnmem_scrubber::ScrubError> for ServerError {
    fn from(source: turnmem_scrubber::ScrubError) -> Self {
        ServerError::Scrub { source }
    }
}

impl From<turnmem_auth::AuthError> for ServerError {
    fn from(source: turnmem_auth::AuthError) -> Self {
        ServerError::Auth { source }
    }
}

impl Classify for ServerError {
    fn kind(&self) -> Kind {
        match self {
            ServerError::Validation { .. } => Kind::Validation,
            ServerError::Unauthorized => Kind::Auth,
            ServerError::Forbidden { .. } => Kind::Forbidden,
            ServerError::NotFound => Kind::NotFound,
            ServerError::TooLarge { .. } => Kind::TooLarge,
            ServerError::UnsupportedMediaType => Kind::UnsupportedMediaType,
            ServerError::RateLimited => Kind::RateLimited,
            ServerError::Store { source } => source.kind(),
            ServerError::Queue { source } => source.kind(),
            ServerError::Search { source } => source.kind(),
            ServerError::Context { source } => source.kind(),
            ServerError::Sse { source } => source.kind(),
            ServerError::Scrub { source } => source.kind(),
            ServerError::Auth { source } => source.kind(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.kind().http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let error = self.to_string();
        (status, Json(ErrorBody { error })).into_response()
    }
}

#[cfg(test)]
#[path = "error.test.rs"]
mod tests;
