use snafu::Snafu;
use turnmem_error::Classify;
use turnmem_error::Kind;

/// Errors from a single compress/summarize attempt. Both variants are
/// retry triggers (spec §4.6); neither ever escapes `Compressor::compress`
/// or `Summarizer::summarize`, which always fall back instead of
/// propagating.
#[derive(Debug, Snafu)]
pub enum AttemptError {
    #[snafu(display("LLM call failed: {message}"))]
    Llm { message: String },

    #[snafu(display("LLM response did not parse into the expected schema"))]
    Parse,
}

/// Errors the HTTP LLM client itself can raise.
#[derive(Debug, Snafu)]
pub enum CompressError {
    #[snafu(display("failed to call LLM endpoint: {source}"))]
    Request { source: reqwest::Error },

    #[snafu(display("LLM endpoint returned status {status}"))]
    Status { status: u16 },

    #[snafu(display("LLM response body was not valid JSON: {source}"))]
    InvalidJson { source: reqwest::Error },

    #[snafu(display("LLM response carried no text content part"))]
    EmptyContent,
}

impl Classify for CompressError {
    fn kind(&self) -> Kind {
        Kind::Internal
    }
}

pub type Result<T> = std::result::Result<T, CompressError>;
