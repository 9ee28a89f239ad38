//! Gate configuration
//!
//! Loaded from a TOML file. Timeouts follow the original client
//! defaults: 10 s per request, 15 s for renewal — renewal is allowed
//! more time since it may involve extra server-side round trips, and
//! the loader rejects a renewal budget that isn't strictly longer.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Invalid(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Root gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Base URL all request paths are joined to.
    pub base_url: String,
    /// Per-request timeout for ordinary calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Timeout for the renewal call; must exceed `request_timeout_secs`.
    #[serde(default = "default_renewal_timeout")]
    pub renewal_timeout_secs: u64,
    /// Path of the renewal endpoint, excluded from refresh triggering.
    #[serde(default = "default_renewal_path")]
    pub renewal_path: String,
    /// Session marker key cleared on irrecoverable renewal failure.
    #[serde(default = "default_session_key")]
    pub session_key: String,
    /// Where the session store persists its markers.
    pub session_file: PathBuf,
    /// Replay timeout policy: true gives a replayed request a fresh full
    /// timeout, false gives it the original request's remaining budget.
    #[serde(default = "default_fresh_replay_timeout")]
    pub fresh_replay_timeout: bool,
}

fn default_request_timeout() -> u64 {
    10
}

fn default_renewal_timeout() -> u64 {
    15
}

fn default_renewal_path() -> String {
    "/auth/refresh".into()
}

fn default_session_key() -> String {
    "user".into()
}

fn default_fresh_replay_timeout() -> bool {
    true
}

impl GateConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: GateConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.renewal_timeout_secs <= self.request_timeout_secs {
            return Err(ConfigError::Invalid(format!(
                "renewal_timeout_secs ({}) must be greater than request_timeout_secs ({})",
                self.renewal_timeout_secs, self.request_timeout_secs
            )));
        }
        if !self.renewal_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "renewal_path must start with '/', got: {}",
                self.renewal_path
            )));
        }
        Ok(())
    }
}
