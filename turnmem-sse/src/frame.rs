//! SSE wire framing (spec §6.4): optional `id:` line, `event:` line,
//! `data:` line with JSON, terminating blank line.

pub fn format_frame(id: Option<u64>, event: &str, data: &serde_json::Value) -> String {
    let mut frame = String::new();
    if let Some(id) = id {
        frame.push_str("id: ");
        frame.push_str(&id.to_string());
        frame.push('\n');
    }
    frame.push_str("event: ");
    frame.push_str(event);
    frame.push('\n');
    frame.push_str("data: ");
    frame.push_str(&data.to_string());
    frame.push_str("\n\n");
    frame
}

#[cfg(test)]
#[path = "frame.test.rs"]
mod tests;
