//! Tamper-evidence: HMAC-SHA-256 over `compressed + "\n" + narrative`
//! (spec §3, §4.2). Signed at insert, verified at read; a mismatch is
//! logged, never fatal.

use hmac::Hmac;
use hmac::Mac;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Build the signed material for an observation's HMAC tag.
fn signed_material(compressed: &str, narrative: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(compressed.len() + narrative.len() + 1);
    buf.extend_from_slice(compressed.as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(narrative.as_bytes());
    buf
}

/// Compute the hex-encoded HMAC tag for an observation about to be inserted.
pub fn compute(key: &[u8], compressed: &str, narrative: &str) -> String {
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(&signed_material(compressed, narrative));
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a stored hex-encoded tag in constant time. Missing tags (legacy
/// rows, per spec §4.2) verify as `true`; malformed hex verifies as
/// `false` rather than panicking.
pub fn verify(key: &[u8], compressed: &str, narrative: &str, stored: Option<&str>) -> bool {
    let Some(stored_hex) = stored else {
        return true;
    };
    let Ok(stored_bytes) = hex::decode(stored_hex) else {
        return false;
    };
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(&signed_material(compressed, narrative));
    mac.verify_slice(&stored_bytes).is_ok()
}

#[cfg(test)]
#[path = "hmac_tag.test.rs"]
mod tests;
