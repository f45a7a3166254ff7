//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default backend base URL (local development server).
const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the advisory backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    /// Build a validated config. The base URL is normalized so route paths
    /// can always be appended verbatim.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "base_url".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "base_url".to_string(),
                message: format!("expected an http(s) URL, got {base_url}"),
            });
        }
        Ok(Self { base_url, timeout })
    }

    /// Read configuration from `FIN_ONBOARD_API_URL` / `FIN_ONBOARD_TIMEOUT_SECS`,
    /// falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            std::env::var("FIN_ONBOARD_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = match std::env::var("FIN_ONBOARD_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "FIN_ONBOARD_TIMEOUT_SECS".to_string(),
                message: format!("expected an integer number of seconds, got {raw}"),
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        Self::new(&base_url, Duration::from_secs(timeout_secs))
    }
}

/// Where wizard sessions are persisted between runs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory for session JSON files.
    pub data_dir: PathBuf,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("FIN_ONBOARD_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".fin-onboard"));
        Self { data_dir }
    }
}
