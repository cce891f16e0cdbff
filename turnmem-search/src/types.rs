use serde::Deserialize;
use serde::Serialize;

/// Layer-1 compact row: enough to let a caller decide whether to hydrate
/// the full observation, sized to land around 50-100 tokens (spec §4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRow {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub obs_type: String,
    pub created_at: i64,
    pub session_id: i64,
}

impl From<&turnmem_store::Observation> for IndexRow {
    fn from(obs: &turnmem_store::Observation) -> Self {
        IndexRow {
            id: obs.id,
            title: obs.title.clone(),
            obs_type: obs.obs_type.as_str().to_string(),
            created_at: obs.created_at,
            session_id: obs.session_id,
        }
    }
}
