//! Compressor/Summarizer adapters (spec §4.6, component C6).

mod client;
mod compress;
mod error;
mod summarize;
pub mod xml;

pub use client::HttpLlmClient;
pub use client::LlmClient;
pub use compress::CompressedObservation;
pub use compress::Compressor;
pub use compress::ToolExecutionInput;
pub use compress::passthrough;
pub use error::AttemptError;
pub use error::CompressError;
pub use error::Result;
pub use summarize::PartialSummary;
pub use summarize::SummarizeInput;
pub use summarize::Summarizer;
