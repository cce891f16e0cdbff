use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::CompressError;

struct ScriptedClient {
    responses: Mutex<VecDeque<std::result::Result<String, CompressError>>>,
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, _prompt_xml: &str, _max_tokens: u32) -> crate::error::Result<String> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(CompressError::EmptyContent))
    }
}

fn sample_input() -> ToolExecutionInput {
    ToolExecutionInput {
        tool_name: "Edit".to_string(),
        tool_input: serde_json::json!({"file": "main.rs"}),
        tool_output: "ok".to_string(),
        project: "demo".to_string(),
        prompt_number: 3,
        user_goal: "fix the bug".to_string(),
    }
}

fn valid_memory_xml() -> String {
    "<memory><type>bugfix</type><title>Fixed off-by-one</title>\
<narrative>Corrected loop bound in pagination.</narrative>\
<tags><tag>pagination</tag></tags><facts><fact>loop bound was off by one</fact></facts>\
<files><read>main.rs</read><modified>main.rs</modified></files></memory>"
        .to_string()
}

#[tokio::test]
async fn successful_first_attempt_parses_directly() {
    let client = Arc::new(ScriptedClient {
        responses: Mutex::new(VecDeque::from([Ok(valid_memory_xml())])),
    });
    let compressor = Compressor::new(client);
    let result = compressor.compress(&sample_input()).await;
    assert_eq!(result.obs_type, turnmem_store::ObsType::Bugfix);
    assert_eq!(result.title, "Fixed off-by-one");
    assert_eq!(result.tags, vec!["pagination".to_string()]);
    assert_eq!(result.modified_files, vec!["main.rs".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn retries_on_parse_failure_then_succeeds() {
    let client = Arc::new(ScriptedClient {
        responses: Mutex::new(VecDeque::from([
            Ok("not xml at all".to_string()),
            Ok(valid_memory_xml()),
        ])),
    });
    let compressor = Compressor::new(client);
    let result = compressor.compress(&sample_input()).await;
    assert_eq!(result.title, "Fixed off-by-one");
}

#[tokio::test(start_paused = true)]
async fn exhausting_all_attempts_returns_fallback() {
    let client = Arc::new(ScriptedClient {
        responses: Mutex::new(VecDeque::from([
            Err(CompressError::EmptyContent),
            Err(CompressError::EmptyContent),
            Err(CompressError::EmptyContent),
        ])),
    });
    let compressor = Compressor::new(client);
    let result = compressor.compress(&sample_input()).await;
    assert_eq!(result.obs_type, turnmem_store::ObsType::Other);
    assert_eq!(result.title, "Edit — session prompt #3");
    assert!(result.narrative.contains("Compression failed after 3 attempts"));
    assert!(result.tags.is_empty());
}

#[tokio::test]
async fn unknown_type_in_response_coerces_to_other() {
    let xml = "<memory><type>something-weird</type><title>t</title><narrative>n</narrative></memory>";
    let client = Arc::new(ScriptedClient {
        responses: Mutex::new(VecDeque::from([Ok(xml.to_string())])),
    });
    let compressor = Compressor::new(client);
    let result = compressor.compress(&sample_input()).await;
    assert_eq!(result.obs_type, turnmem_store::ObsType::Other);
}

#[test]
fn passthrough_builds_other_type_with_truncated_narrative() {
    let mut input = sample_input();
    input.tool_output = "a".repeat(4000);
    let result = passthrough(&input);
    assert_eq!(result.obs_type, turnmem_store::ObsType::Other);
    assert!(result.narrative.len() < 4000);
}
