use super::*;
use serde_json::json;

#[test]
fn frame_with_id_has_three_lines_then_a_blank_line() {
    let frame = format_frame(Some(7), "ping", &json!({"ts": 123}));
    assert_eq!(frame, "id: 7\nevent: ping\ndata: {\"ts\":123}\n\n");
}

#[test]
fn frame_without_id_omits_the_id_line() {
    let frame = format_frame(None, "ping", &json!({"ts": 123}));
    assert_eq!(frame, "event: ping\ndata: {\"ts\":123}\n\n");
}
