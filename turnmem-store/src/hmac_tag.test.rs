use super::*;

#[test]
fn verifies_own_tag() {
    let key = b"test-key";
    let tag = compute(key, "compressed body", "a narrative");
    assert!(verify(key, "compressed body", "a narrative", Some(&tag)));
}

#[test]
fn detects_tampering() {
    let key = b"test-key";
    let tag = compute(key, "compressed body", "a narrative");
    assert!(!verify(key, "compressed body", "a DIFFERENT narrative", Some(&tag)));
}

#[test]
fn missing_tag_verifies_ok() {
    assert!(verify(b"key", "x", "y", None));
}

#[test]
fn malformed_tag_fails_closed() {
    assert!(!verify(b"key", "x", "y", Some("not-hex!!")));
}
