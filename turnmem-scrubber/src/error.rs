//! Error type for the scrubber crate.

use snafu::Snafu;
use turnmem_error::Classify;
use turnmem_error::Kind;

pub type Result<T> = std::result::Result<T, ScrubError>;

#[derive(Debug, Snafu)]
pub enum ScrubError {
    /// Raw input carried one of the reserved `<c-mem-*>` control tags.
    #[snafu(display("content contains control tags"))]
    ControlTags,
}

impl Classify for ScrubError {
    fn kind(&self) -> Kind {
        match self {
            ScrubError::ControlTags => Kind::Validation,
        }
    }
}
