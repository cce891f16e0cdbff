use snafu::Snafu;
use turnmem_error::Classify;
use turnmem_error::Kind;

#[derive(Debug, Snafu)]
pub enum ContextError {
    #[snafu(display("store query failed: {source}"))]
    Store { source: turnmem_store::StoreErr },
}

impl From<turnmem_store::StoreErr> for ContextError {
    fn from(source: turnmem_store::StoreErr) -> Self {
        ContextError::Store { source }
    }
}

impl Classify for ContextError {
    fn kind(&self) -> Kind {
        match self {
            ContextError::Store { source } => source.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ContextError>;
