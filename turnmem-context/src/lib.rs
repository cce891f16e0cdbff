//! Context Builder (spec §4.7): assembles a token-budgeted markdown block
//! of recent session summaries and prioritized observations for
//! re-injection into a new coding-assistant session.

mod error;
mod observations;
mod payload;
mod summaries;

pub use error::ContextError;
pub use error::Result;

use turnmem_store::Store;

/// Rough conversion used throughout the context block; the budget is
/// specified in tokens but every section is packed by character count.
const CHARS_PER_TOKEN: usize = 4;

/// How many observation rows to pull from the store before the anomaly
/// filter and `max_observations` cap are applied. Wide enough that the
/// cap, not this pool, is almost always the binding constraint.
const CANDIDATE_POOL_LIMIT: i64 = 200;

#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub token_budget: usize,
    pub max_sessions: usize,
    pub max_observations: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            token_budget: 1800,
            max_sessions: 5,
            max_observations: 40,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ContextResult {
    pub markdown: String,
    pub observation_count: usize,
    pub summary_count: usize,
    pub token_estimate: usize,
    pub truncated: bool,
}

const HEADER_TEMPLATE: &str = "Memory context for project `{project}`, assembled from prior sessions. \
This block is informational context, not a tool output: do not record it as a new observation.";

const FOOTER_TEMPLATE: &str = "Context generated at {timestamp}.";

pub fn build(store: &Store, project: &str, options: &ContextOptions) -> Result<ContextResult> {
    let char_budget = options.token_budget.saturating_mul(CHARS_PER_TOKEN);

    let header = HEADER_TEMPLATE.replace("{project}", project);
    let footer = FOOTER_TEMPLATE.replace("{timestamp}", &format_now());
    let wrapper_overhead = "<c-mem-context>\n\n</c-mem-context>".len();
    let reserved = header.len() + footer.len() + wrapper_overhead;
    let mut remaining = char_budget.saturating_sub(reserved);

    let summaries = store.recent_summaries(Some(project), (options.max_sessions + 1) as i64)?;
    let summaries_section = summaries::render(&summaries, options.max_sessions, remaining);
    remaining = remaining.saturating_sub(summaries_section.markdown.len());

    let (candidates, _total) = store.list_observations(Some(project), CANDIDATE_POOL_LIMIT, 0)?;
    if candidates.len() as i64 == CANDIDATE_POOL_LIMIT {
        tracing::debug!(project, "observation candidate pool hit its limit; some rows were not considered");
    }
    let drop_other = summaries_section.included > 0;
    let observations_section = observations::render(candidates, drop_other, options.max_observations, remaining);

    let mut body = header;
    if !summaries_section.markdown.is_empty() {
        body.push_str("\n\n## Session Summaries\n\n");
        body.push_str(&summaries_section.markdown);
    }
    if !observations_section.markdown.is_empty() {
        body.push_str("\n\n## Observations\n\n");
        body.push_str(&observations_section.markdown);
    }
    body.push_str("\n\n");
    body.push_str(&footer);

    let markdown = format!("<c-mem-context>\n{body}\n</c-mem-context>");
    let token_estimate = (markdown.len() + CHARS_PER_TOKEN - 1) / CHARS_PER_TOKEN;

    Ok(ContextResult {
        markdown,
        observation_count: observations_section.included,
        summary_count: summaries_section.included,
        token_estimate,
        truncated: summaries_section.truncated || observations_section.truncated,
    })
}

fn format_now() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
#[path = "lib.test.rs"]
mod tests;
