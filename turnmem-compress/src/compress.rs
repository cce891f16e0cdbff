//! Compressor (spec §4.6): tool events → structured observations.

use std::sync::Arc;
use std::time::Duration;

use crate::client::LlmClient;
use crate::error::AttemptError;
use crate::xml;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF: [Duration; 2] = [Duration::from_secs(1), Duration::from_secs(2)];

const INSTRUCTION: &str = "Summarize this tool execution into a single structured memory. \
Respond with exactly one <memory> element.";

/// What the compressor needs to build a request; mirrors spec §4.6's
/// input list.
#[derive(Debug, Clone)]
pub struct ToolExecutionInput {
    pub tool_name: String,
    pub tool_input: serde_json::Value,
    pub tool_output: String,
    pub project: String,
    pub prompt_number: i64,
    pub user_goal: String,
}

/// What the compressor produces. `tags`/`facts`/`read_files`/`modified_files`
/// are JSON-encoded by the caller into the observation's `compressed`
/// column; `title`/`narrative` are stored in their own columns.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompressedObservation {
    pub obs_type: turnmem_store::ObsType,
    pub title: String,
    pub narrative: String,
    pub tags: Vec<String>,
    pub facts: Vec<String>,
    pub read_files: Vec<String>,
    pub modified_files: Vec<String>,
}

pub struct Compressor<C: LlmClient> {
    client: Arc<C>,
}

impl<C: LlmClient> Compressor<C> {
    pub fn new(client: Arc<C>) -> Self {
        Compressor { client }
    }

    /// Never raises: after three attempts it returns the fallback record
    /// described in spec §4.6.
    pub async fn compress(&self, input: &ToolExecutionInput) -> CompressedObservation {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.try_once(input).await {
                Ok(obs) => return obs,
                Err(err) => {
                    tracing::warn!(attempt, tool_name = %input.tool_name, %err, "compress attempt failed");
                    if let Some(delay) = BACKOFF.get((attempt - 1) as usize) {
                        tokio::time::sleep(*delay).await;
                    }
                }
            }
        }
        fallback(input)
    }

    async fn try_once(&self, input: &ToolExecutionInput) -> std::result::Result<CompressedObservation, AttemptError> {
        let request = build_request(input);
        let raw = self
            .client
            .complete(&request, 1024)
            .await
            .map_err(|e| AttemptError::Llm { message: e.to_string() })?;
        parse_response(&raw).ok_or(AttemptError::Parse)
    }
}

fn build_request(input: &ToolExecutionInput) -> String {
    let tool_input = xml::stringify_json(&input.tool_input);
    let output = turnmem_scrubber::enforce_byte_limit(&input.tool_output, xml::TOOL_OUTPUT_LIMIT_BYTES);
    format!(
        "<c-mem-compress><instruction>{instruction}</instruction>\
<tool_execution><tool>{tool}</tool><input>{input}</input><output>{output}</output></tool_execution>\
<session><project>{project}</project><prompt_number>{prompt_number}</prompt_number><user_goal>{goal}</user_goal></session>\
</c-mem-compress>",
        instruction = xml::xml_escape(INSTRUCTION),
        tool = xml::xml_escape(&input.tool_name),
        input = xml::xml_escape(&tool_input),
        output = xml::xml_escape(&output),
        project = xml::xml_escape(&input.project),
        prompt_number = input.prompt_number,
        goal = xml::xml_escape(&input.user_goal),
    )
}

/// The compressor's own controlled vocabulary (spec §4.6) is narrower than
/// `ObsType`'s full set: `discovery`/`change` are context-builder/anomaly
/// concepts the LLM never emits, so an LLM response claiming either one
/// coerces to `other` here, same as any other unrecognized string.
fn parse_compressor_type(raw: &str) -> turnmem_store::ObsType {
    use turnmem_store::ObsType;
    match raw.to_lowercase().as_str() {
        "bugfix" => ObsType::Bugfix,
        "feature" => ObsType::Feature,
        "refactor" => ObsType::Refactor,
        "config" => ObsType::Config,
        "research" => ObsType::Research,
        "error" => ObsType::Error,
        "decision" => ObsType::Decision,
        _ => ObsType::Other,
    }
}

fn parse_response(raw: &str) -> Option<CompressedObservation> {
    let block = xml::extract_memory_block(raw)?;
    let title = xml::extract_first("title", &block)?;
    let narrative = xml::extract_first("narrative", &block)?;
    let type_str = xml::extract_first("type", &block).unwrap_or_default();
    Some(CompressedObservation {
        obs_type: parse_compressor_type(&type_str),
        title,
        narrative,
        tags: xml::extract_repeated("tag", &block),
        facts: xml::extract_repeated("fact", &block),
        read_files: xml::extract_repeated("read", &block),
        modified_files: xml::extract_repeated("modified", &block),
    })
}

fn fallback(input: &ToolExecutionInput) -> CompressedObservation {
    CompressedObservation {
        obs_type: turnmem_store::ObsType::Other,
        title: format!("{} — session prompt #{}", input.tool_name, input.prompt_number),
        narrative: format!(
            "Raw observation from {}. Compression failed after {MAX_ATTEMPTS} attempts.",
            input.tool_name
        ),
        tags: Vec::new(),
        facts: Vec::new(),
        read_files: Vec::new(),
        modified_files: Vec::new(),
    }
}

/// Skips the LLM entirely: used by the queue processor glue when no LLM
/// API key is configured (spec §4.6 "if the LLM API key is absent").
pub fn passthrough(input: &ToolExecutionInput) -> CompressedObservation {
    const PASSTHROUGH_LIMIT_BYTES: usize = 2 * 1024;
    CompressedObservation {
        obs_type: turnmem_store::ObsType::Other,
        title: format!("{} — session prompt #{}", input.tool_name, input.prompt_number),
        narrative: turnmem_scrubber::enforce_byte_limit(&input.tool_output, PASSTHROUGH_LIMIT_BYTES),
        tags: Vec::new(),
        facts: Vec::new(),
        read_files: Vec::new(),
        modified_files: Vec::new(),
    }
}

#[cfg(test)]
#[path = "compress.test.rs"]
mod tests;
