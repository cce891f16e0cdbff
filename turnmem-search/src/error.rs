use std::path::PathBuf;

use snafu::Snafu;
use turnmem_error::Classify;
use turnmem_error::Kind;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SearchError {
    #[snafu(display("store query failed: {source}"))]
    Store { source: turnmem_store::StoreErr },

    #[snafu(display("project name {name:?} is not a safe path component"))]
    UnsafeProjectName { name: String },

    #[snafu(display("failed to spawn qmd: {source}"))]
    QmdSpawn { source: std::io::Error },

    #[snafu(display("qmd exited with status {status}"))]
    QmdExitStatus { status: i32 },

    #[snafu(display("failed to write export file {path:?}: {source}"))]
    ExportWrite { path: PathBuf, source: std::io::Error },
}

impl From<turnmem_store::StoreErr> for SearchError {
    fn from(source: turnmem_store::StoreErr) -> Self {
        SearchError::Store { source }
    }
}

impl Classify for SearchError {
    fn kind(&self) -> Kind {
        match self {
            SearchError::Store { source } => source.kind(),
            SearchError::UnsafeProjectName { .. } => Kind::Validation,
            SearchError::QmdSpawn { .. }
            | SearchError::QmdExitStatus { .. }
            | SearchError::ExportWrite { .. } => Kind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
