//! Shared error-classification types used across the turnmem crates.
//!
//! Every crate keeps its own `snafu`-derived error enum; this crate holds
//! only the cross-cutting [`Kind`] that `turnmem-server` uses to map any
//! crate's error into an HTTP status code (spec §6.1, §7).

use serde::Serialize;

/// Error classification, independent of which crate raised the error.
///
/// Maps 1:1 onto the envelope described in spec.md §6.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Kind {
    /// Bad input: missing field, malformed id, oversize body, wrong content type.
    Validation,
    /// Missing/invalid bearer token.
    Auth,
    /// Non-localhost origin or remote address.
    Forbidden,
    /// Resource does not exist.
    NotFound,
    /// Request body too large.
    TooLarge,
    /// Wrong `Content-Type`.
    UnsupportedMediaType,
    /// Rate limit exceeded.
    RateLimited,
    /// Anything else (store errors, LLM failures that were not retried away, bugs).
    Internal,
}

impl Kind {
    /// The numeric HTTP status code for this error kind.
    pub fn http_status(self) -> u16 {
        match self {
            Kind::Validation => 400,
            Kind::Auth => 401,
            Kind::Forbidden => 403,
            Kind::NotFound => 404,
            Kind::TooLarge => 413,
            Kind::UnsupportedMediaType => 415,
            Kind::RateLimited => 429,
            Kind::Internal => 500,
        }
    }
}

/// Implemented by every crate's error enum so `turnmem-server` can classify
/// it without matching on crate-specific variants.
pub trait Classify {
    fn kind(&self) -> Kind;
}

#[cfg(test)]
#[path = "lib.test.rs"]
mod tests;
