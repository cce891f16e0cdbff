//! The LLM call boundary. `Compressor`/`Summarizer` depend only on
//! [`LlmClient`]; [`HttpLlmClient`] is the real implementation, and tests
//! substitute an in-process fake.

use async_trait::async_trait;

use crate::error::CompressError;
use crate::error::Result;

/// A single text-completion call against an external LLM capability.
/// Implementations must not retry internally — retry is the caller's job
/// (spec §4.6), so a single failed call here should surface as an `Err`
/// immediately.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt_xml: &str, max_tokens: u32) -> Result<String>;
}

/// Calls a JSON chat-completion style endpoint: POSTs
/// `{model, max_tokens, messages: [{role: "user", content}]}` and reads
/// the first text part out of `{content: [{type: "text", text}]}`.
pub struct HttpLlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpLlmClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        HttpLlmClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    content: Vec<ContentPart>,
}

#[derive(serde::Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    part_type: String,
    text: Option<String>,
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt_xml: &str, max_tokens: u32) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens,
            messages: [ChatMessage {
                role: "user",
                content: prompt_xml,
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/complete", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|source| CompressError::Request { source })?;

        if !response.status().is_success() {
            return Err(CompressError::Status {
                status: response.status().as_u16(),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|source| CompressError::InvalidJson { source })?;

        parsed
            .content
            .into_iter()
            .find(|part| part.part_type == "text")
            .and_then(|part| part.text)
            .ok_or(CompressError::EmptyContent)
    }
}

#[cfg(test)]
#[path = "client.test.rs"]
mod tests;
