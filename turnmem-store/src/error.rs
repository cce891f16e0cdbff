//! Error type for the embedded store.

use std::path::PathBuf;

use snafu::Snafu;
use turnmem_error::Classify;
use turnmem_error::Kind;

pub type Result<T> = std::result::Result<T, StoreErr>;

#[derive(Debug, Snafu)]
pub enum StoreErr {
    #[snafu(display("failed to open database at {path:?}: {source}"))]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[snafu(display("migration {version} failed: {source}"))]
    Migration {
        version: i64,
        source: rusqlite::Error,
    },

    #[snafu(display("query failed: {source}"))]
    Query { source: rusqlite::Error },

    #[snafu(display("queue payload exceeds {limit} bytes ({actual} bytes)"))]
    PayloadTooLarge { limit: usize, actual: usize },

    #[snafu(display("queue payload is not valid JSON: {source}"))]
    InvalidPayload { source: serde_json::Error },

    #[snafu(display("no row found for id {id}"))]
    NotFound { id: i64 },

    #[snafu(display("filesystem error hardening {path:?}: {source}"))]
    Permissions {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Classify for StoreErr {
    fn kind(&self) -> Kind {
        match self {
            StoreErr::PayloadTooLarge { .. } | StoreErr::InvalidPayload { .. } => Kind::Validation,
            StoreErr::NotFound { .. } => Kind::NotFound,
            _ => Kind::Internal,
        }
    }
}

impl From<rusqlite::Error> for StoreErr {
    fn from(source: rusqlite::Error) -> Self {
        StoreErr::Query { source }
    }
}
