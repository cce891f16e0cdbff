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

fn sample_input() -> SummarizeInput {
    SummarizeInput {
        session_db_id: 42,
        project: "demo".to_string(),
        last_user_message: Some("please add pagination".to_string()),
        last_assistant_message: Some("done, added it".to_string()),
        observation_count: 6,
    }
}

fn full_summary_xml() -> String {
    "<session_summary><request>add pagination</request><investigated>existing list view</investigated>\
<learned>off-by-one in loop bound</learned><completed>pagination added and tested</completed>\
<next_steps>add tests for edge pages</next_steps></session_summary>"
        .to_string()
}

#[tokio::test]
async fn successful_attempt_fills_all_fields() {
    let client = Arc::new(ScriptedClient {
        responses: Mutex::new(VecDeque::from([Ok(full_summary_xml())])),
    });
    let summarizer = Summarizer::new(client);
    let summary = summarizer.summarize(&sample_input()).await;
    assert_eq!(summary.request, "add pagination");
    assert_eq!(summary.next_steps, "add tests for edge pages");
}

#[tokio::test]
async fn missing_optional_fields_default_to_none() {
    let xml = "<session_summary><request>add pagination</request></session_summary>";
    let client = Arc::new(ScriptedClient {
        responses: Mutex::new(VecDeque::from([Ok(xml.to_string())])),
    });
    let summarizer = Summarizer::new(client);
    let summary = summarizer.summarize(&sample_input()).await;
    assert_eq!(summary.request, "add pagination");
    assert_eq!(summary.investigated, "None");
    assert_eq!(summary.learned, "None");
    assert_eq!(summary.completed, "None");
    assert_eq!(summary.next_steps, "None");
}

#[tokio::test(start_paused = true)]
async fn missing_request_triggers_retry_then_fallback() {
    let client = Arc::new(ScriptedClient {
        responses: Mutex::new(VecDeque::from([
            Ok("<session_summary><investigated>x</investigated></session_summary>".to_string()),
            Err(CompressError::EmptyContent),
            Err(CompressError::EmptyContent),
        ])),
    });
    let summarizer = Summarizer::new(client);
    let summary = summarizer.summarize(&sample_input()).await;
    assert_eq!(summary.request, "please add pagination");
    assert_eq!(summary.completed, "6 observations recorded this session");
}
