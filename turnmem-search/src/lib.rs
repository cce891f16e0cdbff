//! Search (spec §4.3, component C3): three layers of progressive
//! disclosure over the store, plus an optional `qmd` semantic-search
//! collaborator.

mod error;
mod qmd;
mod types;

pub use error::Result;
pub use error::SearchError;
pub use qmd::semantic_search;
pub use types::IndexRow;

use turnmem_store::ObsType;
use turnmem_store::Observation;
use turnmem_store::Store;

const LAYER1_CAP: i64 = 50;
const DEFAULT_TIMELINE_WINDOW: usize = 5;
const DEFAULT_KEYWORD_LIMIT: i64 = 20;

/// Layer 1: compact rows a caller can scan before deciding what to
/// hydrate. Empty or whitespace-only queries return an empty list rather
/// than matching everything.
pub fn search_index(store: &Store, query: &str, project: Option<&str>) -> Result<Vec<IndexRow>> {
    let Some(fts_query) = turnmem_store::escape_fts_query(query) else {
        return Ok(Vec::new());
    };
    let rows = store.search_index(&fts_query, project, LAYER1_CAP)?;
    Ok(rows.iter().map(|(obs, _rank)| IndexRow::from(obs)).collect())
}

/// Layer 2: a chronological window of `window` observations on either
/// side of `anchor_id`, within the anchor's own session, plus the anchor
/// itself if it still exists.
pub fn get_timeline(store: &Store, anchor_id: i64, window: usize) -> Result<Vec<Observation>> {
    let Some(anchor) = store.get_observation(anchor_id)? else {
        return Ok(Vec::new());
    };
    let session_obs = store.observations_for_session(anchor.session_id)?;
    let Some(idx) = session_obs.iter().position(|o| o.id == anchor_id) else {
        return Ok(vec![anchor]);
    };
    let start = idx.saturating_sub(window);
    let end = (idx + window + 1).min(session_obs.len());
    Ok(session_obs[start..end].to_vec())
}

pub fn get_timeline_default(store: &Store, anchor_id: i64) -> Result<Vec<Observation>> {
    get_timeline(store, anchor_id, DEFAULT_TIMELINE_WINDOW)
}

/// Layer 3: full rows for an explicit id list, ascending by `created_at`.
pub fn get_by_ids(store: &Store, ids: &[i64]) -> Result<Vec<Observation>> {
    Ok(store.get_observations_by_ids(ids)?)
}

/// Full observations ranked by BM25 (lower rank is better; the store
/// already orders ascending by rank).
pub fn search_keyword(
    store: &Store,
    query: &str,
    project: Option<&str>,
    limit: i64,
) -> Result<Vec<Observation>> {
    let Some(fts_query) = turnmem_store::escape_fts_query(query) else {
        return Ok(Vec::new());
    };
    let rows = store.search_index(&fts_query, project, limit)?;
    Ok(rows.into_iter().map(|(obs, _rank)| obs).collect())
}

pub fn search_keyword_default(
    store: &Store,
    query: &str,
    project: Option<&str>,
) -> Result<Vec<Observation>> {
    search_keyword(store, query, project, DEFAULT_KEYWORD_LIMIT)
}

pub fn search_by_type(
    store: &Store,
    obs_type: &str,
    project: Option<&str>,
    limit: i64,
) -> Result<Vec<Observation>> {
    Ok(store.search_by_type(ObsType::parse(obs_type), project, limit)?)
}

pub fn search_by_date_range(
    store: &Store,
    from: i64,
    to: i64,
    project: Option<&str>,
) -> Result<Vec<Observation>> {
    Ok(store.search_by_date_range(from, to, project)?)
}

#[cfg(test)]
#[path = "lib.test.rs"]
mod tests;
