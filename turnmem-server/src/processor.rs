//! Queue `Processor` glue (spec §4.5/§4.6): turns a queued observation or
//! summary request into compressed/summarized content, runs the anomaly
//! filter on the result, and persists it. Session status transitions are
//! the HTTP handlers' job (spec §3 "status advanced by explicit transition
//! endpoints"); this processor only ever reads a session, never advances it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use turnmem_compress::Compressor;
use turnmem_compress::LlmClient;
use turnmem_compress::Summarizer;
use turnmem_compress::SummarizeInput;
use turnmem_compress::ToolExecutionInput;
use turnmem_queue::Processor;
use turnmem_sse::SseBroker;
use turnmem_store::NewObservation;
use turnmem_store::QueueItem;
use turnmem_store::QueueItemType;
use turnmem_store::Session;
use turnmem_store::Store;

#[derive(Debug, Deserialize)]
struct ObservationPayload {
    tool_name: String,
    tool_input: String,
    tool_result: String,
}

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    last_user_message: Option<String>,
    last_assistant_message: Option<String>,
}

/// Binds the Compressor/Summarizer to a shared LLM client and the Store/SSE
/// handles the rest of the pipeline needs. `llm_configured` is false when no
/// LLM API key was available at startup: observations then skip the
/// Compressor entirely and go through `turnmem_compress::passthrough`
/// instead (spec §4.6). Summaries have no such bypass — see `process_summary`.
pub struct QueueProcessor<C: LlmClient> {
    store: Arc<Store>,
    sse: SseBroker,
    compressor: Compressor<C>,
    summarizer: Summarizer<C>,
    llm_configured: bool,
}

impl<C: LlmClient> QueueProcessor<C> {
    pub fn new(store: Arc<Store>, sse: SseBroker, client: Arc<C>, llm_configured: bool) -> Self {
        QueueProcessor {
            store,
            sse,
            compressor: Compressor::new(client.clone()),
            summarizer: Summarizer::new(client),
            llm_configured,
        }
    }

    fn session(&self, session_id: i64) -> Result<Session, String> {
        self.store
            .get_session_by_id(session_id)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("session {session_id} not found"))
    }

    async fn process_observation(&self, item: &QueueItem) -> Result<(), String> {
        let payload: ObservationPayload =
            serde_json::from_str(&item.payload).map_err(|e| format!("bad observation payload: {e}"))?;
        let session = self.session(item.session_id)?;
        let latest_prompt = self
            .store
            .get_latest_user_prompt(session.id)
            .map_err(|e| e.to_string())?;
        let prompt_number = latest_prompt.as_ref().map(|p| p.prompt_number).unwrap_or(session.prompt_count);
        let user_goal = latest_prompt.map(|p| p.text).unwrap_or_default();

        let tool_input: serde_json::Value = serde_json::from_str(&payload.tool_input)
            .unwrap_or_else(|_| serde_json::Value::String(payload.tool_input.clone()));

        let input = ToolExecutionInput {
            tool_name: payload.tool_name.clone(),
            tool_input,
            tool_output: payload.tool_result,
            project: session.project.clone(),
            prompt_number,
            user_goal,
        };

        let compressed = if self.llm_configured {
            self.compressor.compress(&input).await
        } else {
            turnmem_compress::passthrough(&input)
        };
        self.store_observation(item, &session, prompt_number, &payload.tool_name, compressed)
    }

    fn store_observation(
        &self,
        item: &QueueItem,
        session: &Session,
        prompt_number: i64,
        tool_name: &str,
        compressed: turnmem_compress::CompressedObservation,
    ) -> Result<(), String> {
        let compressed_json = serde_json::to_string(&compressed).map_err(|e| e.to_string())?;

        let candidate = turnmem_anomaly::Candidate {
            obs_type: compressed.obs_type.as_str(),
            title: &compressed.title,
            narrative: &compressed.narrative,
            compressed: &compressed_json,
            hmac: None,
        };
        let detection = turnmem_anomaly::detect_anomalies(candidate);
        for flag in &detection.flags {
            tracing::warn!(kind = %flag.kind, severity = ?flag.severity, detail = %flag.detail, "anomaly flag raised");
        }
        if !detection.clean {
            return Err(format!("observation blocked by anomaly filter: {:?}", detection.flags));
        }

        let new = NewObservation {
            session_id: session.id,
            prompt_number,
            tool_name: tool_name.to_string(),
            raw_input: None,
            compressed: compressed_json,
            obs_type: compressed.obs_type,
            title: compressed.title.clone(),
            narrative: compressed.narrative.clone(),
        };
        let observation = self.store.insert_observation(new).map_err(|e| e.to_string())?;
        self.sse.broadcast_observation_processed(
            observation.id,
            item.id,
            session.id,
            &session.project,
            &observation.title,
            observation.obs_type.as_str(),
        );
        Ok(())
    }

    async fn process_summary(&self, item: &QueueItem) -> Result<(), String> {
        let payload: SummaryPayload =
            serde_json::from_str(&item.payload).map_err(|e| format!("bad summary payload: {e}"))?;
        let session = self.session(item.session_id)?;
        let observations = self
            .store
            .observations_for_session(session.id)
            .map_err(|e| e.to_string())?;

        let input = SummarizeInput {
            session_db_id: session.id,
            project: session.project.clone(),
            last_user_message: payload.last_user_message,
            last_assistant_message: payload.last_assistant_message,
            observation_count: observations.len() as i64,
        };
        let summary = self.summarizer.summarize(&input).await;

        let record = self
            .store
            .insert_summary(
                session.id,
                Some(summary.request.clone()),
                Some(summary.investigated),
                Some(summary.learned),
                Some(summary.completed),
                Some(summary.next_steps),
            )
            .map_err(|e| e.to_string())?;
        self.sse
            .broadcast_session_summary_created(record.id, session.id, &session.project, &summary.request);
        Ok(())
    }
}

#[async_trait]
impl<C: LlmClient> Processor for QueueProcessor<C> {
    async fn process(&self, item: &QueueItem) -> Result<(), String> {
        match item.item_type {
            QueueItemType::Observation => self.process_observation(item).await,
            QueueItemType::Summary => self.process_summary(item).await,
        }
    }
}

#[cfg(test)]
#[path = "processor.test.rs"]
mod tests;
