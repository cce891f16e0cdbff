//! Summaries section of the context block (spec §4.7): the most recent
//! per-session summaries, each rendered as a dated block of labelled
//! fields, greedily packed until the remaining character budget runs out.

use turnmem_store::Summary;

/// Summary fields carry spec §4.6's internal names (`request`,
/// `investigated`, `learned`, `completed`, `next_steps`); the context
/// block renders them under the display labels an assistant actually
/// reads from: Request, Done, Discovered, Remaining, Notes.
const NONE_PLACEHOLDER: &str = "None";

pub struct SummariesSection {
    pub markdown: String,
    pub included: usize,
    pub truncated: bool,
}

pub fn render(summaries: &[Summary], max_sessions: usize, char_budget: usize) -> SummariesSection {
    let mut markdown = String::new();
    let mut included = 0;
    let mut truncated = false;

    for summary in summaries.iter().take(max_sessions) {
        let block = render_one(summary);
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
    if summaries.len() > max_sessions {
        truncated = true;
    }

    SummariesSection {
        markdown,
        included,
        truncated,
    }
}

fn render_one(summary: &Summary) -> String {
    let date = format_date(summary.created_at);
    let field = |value: &Option<String>| -> String {
        value
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(NONE_PLACEHOLDER)
            .to_string()
    };
    format!(
        "### Session {date}\n- Request: {request}\n- Done: {done}\n- Discovered: {discovered}\n- Remaining: {remaining}\n- Notes: {notes}",
        request = field(&summary.request),
        done = field(&summary.completed),
        discovered = field(&summary.learned),
        remaining = field(&summary.next_steps),
        notes = field(&summary.investigated),
    )
}

fn format_date(epoch: i64) -> String {
    chrono::DateTime::from_timestamp(epoch, 0)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
#[path = "summaries.test.rs"]
mod tests;
