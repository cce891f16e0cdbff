//! First-run token generation and timing-safe verification (spec §4.10).

use std::path::Path;

use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::error::AuthError;
use crate::error::Result;

/// Build-time fallback used to derive the HMAC key before a token file
/// exists. See DESIGN.md for why this stays a permanent degraded mode
/// rather than a transitional one (spec §9 open question).
pub const FALLBACK_HMAC_SEED: &[u8] = b"turnmem-default-hmac-seed-v1";

/// Ensure a 32-byte random hex token exists at `path`, creating the parent
/// directory (mode 0700) and the token file (mode 0600) if needed.
/// Returns the token string either way.
pub fn ensure_token(path: &Path) -> Result<String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| AuthError::TokenIo {
            path: parent.to_path_buf(),
            source,
        })?;
        harden_dir(parent)?;
    }

    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim().to_string();
        if !trimmed.is_empty() {
            return Ok(trimmed);
        }
    }

    let token = generate_token();
    std::fs::write(path, &token).map_err(|source| AuthError::TokenIo {
        path: path.to_path_buf(),
        source,
    })?;
    harden_file(path)?;
    tracing::info!(path = %path.display(), "generated new auth token");
    Ok(token)
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Constant-time comparison of a presented bearer token against the stored
/// token value.
pub fn verify(presented: &str, stored: &str) -> bool {
    let presented = presented.as_bytes();
    let stored = stored.as_bytes();
    if presented.len() != stored.len() {
        return false;
    }
    presented.ct_eq(stored).into()
}

/// Derive the HMAC key for observation tamper-evidence: the on-disk token
/// if present, else the fallback constant (spec §4.2, §9).
pub fn derive_hmac_key(token_path: &Path) -> Vec<u8> {
    match std::fs::read_to_string(token_path) {
        Ok(contents) if !contents.trim().is_empty() => contents.trim().as_bytes().to_vec(),
        _ => FALLBACK_HMAC_SEED.to_vec(),
    }
}

#[cfg(unix)]
fn harden_dir(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700)).map_err(|source| {
        AuthError::TokenIo {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn harden_dir(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn harden_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(|source| {
        AuthError::TokenIo {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn harden_file(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "token.test.rs"]
mod tests;
