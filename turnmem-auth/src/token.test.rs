use super::*;
use tempfile::TempDir;

#[test]
fn ensure_token_creates_and_reuses() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("auth.token");
    let first = ensure_token(&path).unwrap();
    assert_eq!(first.len(), 64); // 32 bytes hex-encoded
    let second = ensure_token(&path).unwrap();
    assert_eq!(first, second);
}

#[test]
fn verify_matches_and_rejects() {
    assert!(verify("abc123", "abc123"));
    assert!(!verify("abc123", "abc124"));
    assert!(!verify("short", "muchlonger"));
}

#[test]
fn derive_hmac_key_falls_back_when_absent() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("no-such-token");
    assert_eq!(derive_hmac_key(&missing), FALLBACK_HMAC_SEED.to_vec());
}

#[test]
fn derive_hmac_key_uses_token_when_present() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("auth.token");
    let token = ensure_token(&path).unwrap();
    assert_eq!(derive_hmac_key(&path), token.as_bytes().to_vec());
}
