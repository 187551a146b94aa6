// src/utils/config.rs
//! SDK configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `tokebi.toml` (or the file named by `TOKEBI_CONFIG`), then `TOKEBI_*`
//! environment variables.

use crate::utils::errors::{Result, TokebiError};
use config::{Config, Environment as EnvSource, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default collector endpoint
pub const DEFAULT_BASE_URL: &str = "https://tokebi-api.vercel.app";

/// File holding the persisted player identifier
pub const PLAYER_ID_FILE: &str = "tokebi_player_id";

const DEFAULT_CONFIG_FILE: &str = "tokebi.toml";

/// Deployment environment stamped on every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Static client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Collector credential, sent verbatim in the `Authorization` header
    pub api_key: String,

    /// Collector base URL (no trailing slash needed)
    pub base_url: String,

    /// Game name sent at registration
    pub game_name: String,

    /// Platform identifier for registration and events
    pub platform: String,

    /// Environment tag for events
    pub environment: Environment,

    /// Recurring flush timer period (seconds)
    pub flush_interval_secs: u64,

    /// Events per batch; reaching it triggers an immediate flush
    pub max_batch_size: usize,

    /// Queue bound
    pub max_queue_size: usize,

    /// Oldest events discarded when the queue overflows
    pub eviction_chunk: usize,

    /// Directory holding the player id file
    pub data_dir: Option<PathBuf>,

    /// Extra registration attempts after a failure
    pub registration_max_retries: u32,

    /// Initial registration backoff (milliseconds), doubled per attempt
    pub registration_backoff_ms: u64,

    /// HTTP request timeout (seconds, 0 = transport default)
    pub request_timeout_secs: u64,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            game_name: default_game_name(),
            platform: "rust".to_string(),
            environment: Environment::Production,
            flush_interval_secs: 60,
            max_batch_size: 100,
            max_queue_size: 1000,
            eviction_chunk: 100,
            data_dir: None,
            registration_max_retries: 0,
            registration_backoff_ms: 1000,
            request_timeout_secs: 30,
        }
    }
}

impl SdkConfig {
    /// Create a config with defaults and the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Load from `TOKEBI_CONFIG` (or `tokebi.toml`) and `TOKEBI_*` env vars
    pub fn load() -> Result<Self> {
        let path = std::env::var("TOKEBI_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    /// Load from a specific file (optional) layered under `TOKEBI_*` env vars
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: SdkConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(EnvSource::with_prefix("TOKEBI").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check sizing invariants
    pub fn validate(&self) -> Result<()> {
        if self.flush_interval_secs == 0 {
            return Err(TokebiError::ConfigError(
                "flush_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_batch_size == 0 || self.max_queue_size == 0 || self.eviction_chunk == 0 {
            return Err(TokebiError::ConfigError(
                "batch size, queue size and eviction chunk must be greater than zero".to_string(),
            ));
        }
        if self.max_batch_size > self.max_queue_size {
            return Err(TokebiError::ConfigError(format!(
                "max_batch_size ({}) exceeds max_queue_size ({})",
                self.max_batch_size, self.max_queue_size
            )));
        }
        if self.base_url.trim().is_empty() {
            return Err(TokebiError::ConfigError("base_url is empty".to_string()));
        }
        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn registration_backoff(&self) -> Duration {
        Duration::from_millis(self.registration_backoff_ms)
    }

    /// Where the player identifier is persisted
    pub fn player_id_path(&self) -> PathBuf {
        let dir = self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|d| d.join("tokebi"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        dir.join(PLAYER_ID_FILE)
    }
}

/// Executable name, the closest thing to a product name a library can see
fn default_game_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "tokebi-game".to_string())
}
