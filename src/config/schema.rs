//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Backend used when neither the config file nor the environment names one
pub const DEFAULT_API_BASE_URL: &str = "https://shaziatariq-todo-app-backend.hf.space";

/// Environment variable overriding the default backend URL
pub const API_BASE_URL_ENV: &str = "TASKFLOW_API_BASE_URL";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Remote task API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout. Unset leaves the transport default in place.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    std::env::var(API_BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

impl ApiConfig {
    /// Per-request timeout, if configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Client-side session checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Window before `exp` in which a token counts as expiring soon
    #[serde(default = "default_expiring_soon_secs")]
    pub expiring_soon_secs: i64,

    /// Reject tokens that carry no `exp` claim
    #[serde(default)]
    pub require_expiry: bool,
}

fn default_expiring_soon_secs() -> i64 {
    300
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiring_soon_secs: default_expiring_soon_secs(),
            require_expiry: false,
        }
    }
}

/// Where the bearer token is persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".taskflow")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}
