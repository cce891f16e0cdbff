//! Row types for every entity in the data model (spec §3).

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Summarizing,
    Completed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Summarizing => "summarizing",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "summarizing" => SessionStatus::Summarizing,
            "completed" => SessionStatus::Completed,
            _ => SessionStatus::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub external_key: String,
    pub project: String,
    pub first_prompt: Option<String>,
    pub prompt_count: i64,
    pub status: SessionStatus,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPrompt {
    pub id: i64,
    pub session_id: i64,
    pub prompt_number: i64,
    pub text: String,
    pub created_at: i64,
}

/// Observation kind. The base controlled vocabulary (spec §3) is
/// `{bugfix, feature, refactor, config, research, error, decision, other}`;
/// the anomaly filter (§4.4) and context builder's priority table (§4.7)
/// both treat `discovery` and `change` as additional first-class members,
/// so the type is modeled here as all ten rather than coercing those two
/// down to `other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObsType {
    Bugfix,
    Feature,
    Refactor,
    Config,
    Research,
    Error,
    Decision,
    Discovery,
    Change,
    Other,
}

impl ObsType {
    pub fn as_str(self) -> &'static str {
        match self {
            ObsType::Bugfix => "bugfix",
            ObsType::Feature => "feature",
            ObsType::Refactor => "refactor",
            ObsType::Config => "config",
            ObsType::Research => "research",
            ObsType::Error => "error",
            ObsType::Decision => "decision",
            ObsType::Discovery => "discovery",
            ObsType::Change => "change",
            ObsType::Other => "other",
        }
    }

    /// Parses the vocabulary, coercing anything unrecognized to `Other`.
    /// See spec §9 "tag-based variant for observations".
    pub fn parse(s: &str) -> Self {
        match s {
            "bugfix" => ObsType::Bugfix,
            "feature" => ObsType::Feature,
            "refactor" => ObsType::Refactor,
            "config" => ObsType::Config,
            "research" => ObsType::Research,
            "error" => ObsType::Error,
            "decision" => ObsType::Decision,
            "discovery" => ObsType::Discovery,
            "change" => ObsType::Change,
            _ => ObsType::Other,
        }
    }

    /// Descending context-builder priority (spec §4.7).
    pub fn priority(self) -> u8 {
        match self {
            ObsType::Error => 9,
            ObsType::Bugfix => 8,
            ObsType::Decision => 7,
            ObsType::Discovery => 6,
            ObsType::Change => 5,
            ObsType::Feature => 4,
            ObsType::Refactor => 3,
            ObsType::Config => 2,
            ObsType::Research => 1,
            ObsType::Other => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: i64,
    pub session_id: i64,
    pub prompt_number: i64,
    pub tool_name: String,
    pub raw_input: Option<String>,
    pub compressed: String,
    pub obs_type: ObsType,
    pub title: String,
    pub narrative: String,
    pub hmac: Option<String>,
    pub created_at: i64,
    /// Set by the store on read; `false` means the recomputed HMAC did not
    /// match the stored tag. The row is still returned (spec §4.2).
    #[serde(default = "default_true")]
    pub hmac_valid: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default)]
pub struct NewObservation {
    pub session_id: i64,
    pub prompt_number: i64,
    pub tool_name: String,
    pub raw_input: Option<String>,
    pub compressed: String,
    pub obs_type: ObsType,
    pub title: String,
    pub narrative: String,
}

impl Default for ObsType {
    fn default() -> Self {
        ObsType::Other
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub id: i64,
    pub session_id: i64,
    pub request: Option<String>,
    pub investigated: Option<String>,
    pub learned: Option<String>,
    pub completed: Option<String>,
    pub next_steps: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueItemType {
    Observation,
    Summary,
}

impl QueueItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            QueueItemType::Observation => "observation",
            QueueItemType::Summary => "summary",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "summary" => QueueItemType::Summary,
            _ => QueueItemType::Observation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Processing,
    Processed,
    Failed,
}

impl QueueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Processing => "processing",
            QueueStatus::Processed => "processed",
            QueueStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "processing" => QueueStatus::Processing,
            "processed" => QueueStatus::Processed,
            "failed" => QueueStatus::Failed,
            _ => QueueStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: i64,
    pub session_id: i64,
    pub item_type: QueueItemType,
    pub payload: String,
    pub status: QueueStatus,
    pub retry_count: i64,
    pub error: Option<String>,
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: i64,
    pub processing: i64,
    pub processed: i64,
    pub failed: i64,
    pub stuck: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProjectStats {
    pub observations: i64,
    pub summaries: i64,
    pub sessions: i64,
}
