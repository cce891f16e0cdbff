use std::path::PathBuf;

use snafu::Snafu;
use turnmem_error::Classify;
use turnmem_error::Kind;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Snafu)]
pub enum AuthError {
    #[snafu(display("failed to read or write token file {path:?}: {source}"))]
    TokenIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("config value invalid: {message}"))]
    InvalidConfig { message: String },
}

impl Classify for AuthError {
    fn kind(&self) -> Kind {
        match self {
            AuthError::TokenIo { .. } => Kind::Internal,
            AuthError::InvalidConfig { .. } => Kind::Validation,
        }
    }
}
