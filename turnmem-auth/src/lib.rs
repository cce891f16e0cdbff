//! Auth & config (spec §4.10, component C10).

mod config;
mod error;
mod token;

pub use config::Config;
pub use error::AuthError;
pub use error::Result;
pub use token::FALLBACK_HMAC_SEED;
pub use token::derive_hmac_key;
pub use token::ensure_token;
pub use token::verify;
