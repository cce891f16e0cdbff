//! Validated configuration: environment > settings file > defaults
//! (spec §4.10).

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::AuthError;
use crate::error::Result;

const MODEL_ALLOWLIST: &[&str] = &[
    "claude-compress-small",
    "claude-compress-large",
    "local-compress-v1",
];

/// A frozen, validated configuration. Once built it is only ever cloned,
/// never mutated (spec §4.10 "emit a frozen configuration").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    pub bind_host: String,
    pub data_dir: PathBuf,
    pub model: String,
    pub token_budget: u32,
    pub max_observations: u32,
    pub max_sessions: u32,
    pub stuck_threshold_secs: i64,
    pub max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8765,
            bind_host: "127.0.0.1".to_string(),
            data_dir: default_data_dir(),
            model: "claude-compress-small".to_string(),
            token_budget: 1800,
            max_observations: 40,
            max_sessions: 5,
            stuck_threshold_secs: 300,
            max_retries: 3,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".turnmem")
}

/// Partial overrides as read from `settings.json`; every field optional so
/// an absent key falls through to the default (or, below it in priority,
/// nothing — file sits between env and defaults).
#[derive(Debug, Default, Deserialize)]
struct FileOverrides {
    port: Option<u16>,
    bind_host: Option<String>,
    data_dir: Option<PathBuf>,
    model: Option<String>,
    token_budget: Option<u32>,
    max_observations: Option<u32>,
    max_sessions: Option<u32>,
    stuck_threshold_secs: Option<i64>,
    max_retries: Option<u32>,
}

impl Config {
    /// Load configuration with priority env > file > defaults, then
    /// validate and freeze it.
    pub fn load() -> Result<Self> {
        let mut cfg = Config::default();

        // The data dir itself must be resolved first (env > default) since
        // settings.json lives inside it.
        if let Ok(dir) = std::env::var("TURNMEM_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }

        let settings_path = cfg.data_dir.join("settings.json");
        if let Some(overrides) = read_file_overrides(&settings_path) {
            apply_file_overrides(&mut cfg, overrides);
        }

        apply_env_overrides(&mut cfg)?;
        cfg.validate()?;
        write_settings_if_absent(&cfg, &settings_path)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1024..=65535).contains(&self.port) {
            return Err(AuthError::InvalidConfig {
                message: format!("port {} out of range 1024-65535", self.port),
            });
        }
        if self.bind_host == "0.0.0.0" {
            tracing::warn!(
                "binding to 0.0.0.0 exposes the worker beyond localhost; this is strongly discouraged"
            );
        }
        if !MODEL_ALLOWLIST.contains(&self.model.as_str()) {
            return Err(AuthError::InvalidConfig {
                message: format!("model {:?} not in allowlist {MODEL_ALLOWLIST:?}", self.model),
            });
        }
        if self.token_budget == 0 {
            return Err(AuthError::InvalidConfig {
                message: "token_budget must be greater than zero".to_string(),
            });
        }
        if self.stuck_threshold_secs <= 0 {
            return Err(AuthError::InvalidConfig {
                message: "stuck_threshold_secs must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn token_path(&self) -> PathBuf {
        self.data_dir.join("auth.token")
    }

    pub fn db_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }
}

fn read_file_overrides(path: &Path) -> Option<FileOverrides> {
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

fn apply_file_overrides(cfg: &mut Config, overrides: FileOverrides) {
    if let Some(v) = overrides.port {
        cfg.port = v;
    }
    if let Some(v) = overrides.bind_host {
        cfg.bind_host = v;
    }
    if let Some(v) = overrides.data_dir {
        cfg.data_dir = v;
    }
    if let Some(v) = overrides.model {
        cfg.model = v;
    }
    if let Some(v) = overrides.token_budget {
        cfg.token_budget = v;
    }
    if let Some(v) = overrides.max_observations {
        cfg.max_observations = v;
    }
    if let Some(v) = overrides.max_sessions {
        cfg.max_sessions = v;
    }
    if let Some(v) = overrides.stuck_threshold_secs {
        cfg.stuck_threshold_secs = v;
    }
    if let Some(v) = overrides.max_retries {
        cfg.max_retries = v;
    }
}

fn apply_env_overrides(cfg: &mut Config) -> Result<()> {
    if let Ok(v) = std::env::var("TURNMEM_PORT") {
        cfg.port = v.parse().map_err(|_| AuthError::InvalidConfig {
            message: format!("TURNMEM_PORT {v:?} is not a valid port number"),
        })?;
    }
    if let Ok(v) = std::env::var("TURNMEM_HOST") {
        cfg.bind_host = v;
    }
    if let Ok(v) = std::env::var("TURNMEM_MODEL") {
        cfg.model = v;
    }
    if let Ok(v) = std::env::var("TURNMEM_DB_PATH") {
        // Callers that set an explicit db path override the directory we
        // derive the database filename from.
        if let Some(parent) = Path::new(&v).parent() {
            cfg.data_dir = parent.to_path_buf();
        }
    }
    Ok(())
}

fn write_settings_if_absent(cfg: &Config, path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(&cfg.data_dir).map_err(|source| AuthError::TokenIo {
        path: cfg.data_dir.clone(),
        source,
    })?;
    let json = serde_json::to_string_pretty(cfg).unwrap_or_default();
    std::fs::write(path, json).map_err(|source| AuthError::TokenIo {
        path: path.to_path_buf(),
        source,
    })?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config.test.rs"]
mod tests;
