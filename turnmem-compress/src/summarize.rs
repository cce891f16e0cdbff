//! Summarizer (spec §4.6): session history → partial session summary.

use std::sync::Arc;
use std::time::Duration;

use crate::client::LlmClient;
use crate::error::AttemptError;
use crate::xml;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF: [Duration; 2] = [Duration::from_secs(1), Duration::from_secs(2)];
const NONE_PLACEHOLDER: &str = "None";

const INSTRUCTION: &str = "Summarize this coding session into a single structured summary. \
Respond with exactly one <session_summary> element.";

#[derive(Debug, Clone)]
pub struct SummarizeInput {
    pub session_db_id: i64,
    pub project: String,
    pub last_user_message: Option<String>,
    pub last_assistant_message: Option<String>,
    pub observation_count: i64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PartialSummary {
    pub request: String,
    pub investigated: String,
    pub learned: String,
    pub completed: String,
    pub next_steps: String,
}

pub struct Summarizer<C: LlmClient> {
    client: Arc<C>,
}

impl<C: LlmClient> Summarizer<C> {
    pub fn new(client: Arc<C>) -> Self {
        Summarizer { client }
    }

    /// Never raises: after three attempts it returns the fallback summary
    /// described in spec §4.6.
    pub async fn summarize(&self, input: &SummarizeInput) -> PartialSummary {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.try_once(input).await {
                Ok(summary) => return summary,
                Err(err) => {
                    tracing::warn!(
                        attempt,
                        session_db_id = input.session_db_id,
                        %err,
                        "summarize attempt failed"
                    );
                    if let Some(delay) = BACKOFF.get((attempt - 1) as usize) {
                        tokio::time::sleep(*delay).await;
                    }
                }
            }
        }
        fallback(input)
    }

    async fn try_once(&self, input: &SummarizeInput) -> std::result::Result<PartialSummary, AttemptError> {
        let request = build_request(input);
        let raw = self
            .client
            .complete(&request, 1024)
            .await
            .map_err(|e| AttemptError::Llm { message: e.to_string() })?;
        parse_response(&raw).ok_or(AttemptError::Parse)
    }
}

fn build_request(input: &SummarizeInput) -> String {
    format!(
        "<c-mem-summarize><instruction>{instruction}</instruction>\
<session><project>{project}</project><session_db_id>{id}</session_db_id>\
<last_user_message>{user}</last_user_message><last_assistant_message>{assistant}</last_assistant_message>\
<observation_count>{count}</observation_count></session></c-mem-summarize>",
        instruction = xml::xml_escape(INSTRUCTION),
        project = xml::xml_escape(&input.project),
        id = input.session_db_id,
        user = xml::xml_escape(input.last_user_message.as_deref().unwrap_or_default()),
        assistant = xml::xml_escape(input.last_assistant_message.as_deref().unwrap_or_default()),
        count = input.observation_count,
    )
}

fn parse_response(raw: &str) -> Option<PartialSummary> {
    let block = xml::extract_summary_block(raw)?;
    let request = xml::extract_first("request", &block)?;
    Some(PartialSummary {
        request,
        investigated: xml::extract_first("investigated", &block).unwrap_or_else(|| NONE_PLACEHOLDER.to_string()),
        learned: xml::extract_first("learned", &block).unwrap_or_else(|| NONE_PLACEHOLDER.to_string()),
        completed: xml::extract_first("completed", &block).unwrap_or_else(|| NONE_PLACEHOLDER.to_string()),
        next_steps: xml::extract_first("next_steps", &block).unwrap_or_else(|| NONE_PLACEHOLDER.to_string()),
    })
}

fn fallback(input: &SummarizeInput) -> PartialSummary {
    PartialSummary {
        request: input
            .last_user_message
            .clone()
            .unwrap_or_else(|| NONE_PLACEHOLDER.to_string()),
        investigated: NONE_PLACEHOLDER.to_string(),
        learned: NONE_PLACEHOLDER.to_string(),
        completed: format!("{} observations recorded this session", input.observation_count),
        next_steps: NONE_PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
#[path = "summarize.test.rs"]
mod tests;
