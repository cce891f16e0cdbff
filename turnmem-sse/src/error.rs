use snafu::Snafu;
use turnmem_error::Classify;
use turnmem_error::Kind;

pub type Result<T> = std::result::Result<T, SseError>;

#[derive(Debug, Snafu)]
pub enum SseError {
    #[snafu(display("remote address {remote:?} does not normalize to localhost"))]
    NotLocalhost { remote: String },
}

impl Classify for SseError {
    fn kind(&self) -> Kind {
        match self {
            SseError::NotLocalhost { .. } => Kind::Forbidden,
        }
    }
}
