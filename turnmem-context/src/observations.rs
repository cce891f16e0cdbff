//! Observations section of the context block (spec §4.7): the anomaly
//! filter's survivors, ranked by `ObsType::priority()` then recency, and
//! greedily packed into the remaining character budget.

use turnmem_store::Observation;

use crate::payload;

const MAX_FACTS_PER_OBSERVATION: usize = 2;
const MAX_MODIFIED_FILES_PER_OBSERVATION: usize = 3;

pub struct ObservationsSection {
    pub markdown: String,
    pub included: usize,
    pub truncated: bool,
}

/// `drop_other` is set once the summaries section already carries at
/// least one entry: an `other`-typed observation rarely adds anything a
/// session summary hasn't already said, so it is dropped in favor of
/// higher-signal rows (spec §4.7).
pub fn render(
    observations: Vec<Observation>,
    drop_other: bool,
    max_observations: usize,
    char_budget: usize,
) -> ObservationsSection {
    let mut candidates = turnmem_anomaly::filter_observations(observations);
    if drop_other {
        candidates.retain(|o| o.obs_type != turnmem_store::ObsType::Other);
    }
    candidates.sort_by(|a, b| {
        b.obs_type
            .priority()
            .cmp(&a.obs_type.priority())
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    let total_candidates = candidates.len();
    let mut markdown = String::new();
    let mut included = 0;
    let mut truncated = false;

    for obs in candidates.into_iter().take(max_observations) {
        let block = render_one(&obs);
        let separator_len = if markdown.is_empty() { 0 } else { 1 };
        if markdown.len() + separator_len + block.len() > char_budget {
            truncated = true;
            break;
        }
        if !markdown.is_empty() {
            markdown.push('\n');
        }
        markdown.push_str(&block);
        included += 1;
    }
    if total_candidates > max_observations {
        truncated = true;
    }

    ObservationsSection {
        markdown,
        included,
        truncated,
    }
}

fn render_one(obs: &Observation) -> String {
    let date = format_date(obs.created_at);
    let payload = payload::parse(&obs.compressed);
    let mut block = format!(
        "### [{type}] {title} ({date})\n{summary}",
        type = obs.obs_type.as_str(),
        title = obs.title,
        summary = payload::first_sentence(&obs.narrative),
    );
    if !payload.modified_files.is_empty() {
        let files: Vec<&str> = payload
            .modified_files
            .iter()
            .take(MAX_MODIFIED_FILES_PER_OBSERVATION)
            .map(String::as_str)
            .collect();
        block.push_str(&format!("\n- Files: {}", files.join(", ")));
    }
    if !payload.facts.is_empty() {
        for fact in payload.facts.iter().take(MAX_FACTS_PER_OBSERVATION) {
            block.push_str(&format!("\n- {fact}"));
        }
    }
    block
}

fn format_date(epoch: i64) -> String {
    chrono::DateTime::from_timestamp(epoch, 0)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
#[path = "observations.test.rs"]
mod tests;
