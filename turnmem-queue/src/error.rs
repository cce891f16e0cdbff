use snafu::Snafu;
use turnmem_error::Classify;
use turnmem_error::Kind;

#[derive(Debug, Snafu)]
pub enum QueueError {
    #[snafu(display("store operation failed: {source}"))]
    Store { source: turnmem_store::StoreErr },
}

impl From<turnmem_store::StoreErr> for QueueError {
    fn from(source: turnmem_store::StoreErr) -> Self {
        QueueError::Store { source }
    }
}

impl Classify for QueueError {
    fn kind(&self) -> Kind {
        match self {
            QueueError::Store { source } => source.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QueueError>;
