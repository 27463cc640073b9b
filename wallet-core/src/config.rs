//! Configuration management
//!
//! Settings live in `<wallet_dir>/settings.json`:
//! ```json
//! {
//!   "api": { "baseUrl": "http://localhost:5000", "pollIntervalSecs": 5, "requestTimeoutSecs": 30 }
//! }
//! ```
//! Environment variables override the file. Keys this crate does not manage
//! are preserved on save. Credentials are never stored here.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::result::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "WALLET_API_URL";
pub const ENV_POLL_INTERVAL: &str = "WALLET_POLL_INTERVAL_SECS";
pub const ENV_REQUEST_TIMEOUT: &str = "WALLET_REQUEST_TIMEOUT_SECS";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    api: ApiSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    poll_interval_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

impl SettingsFile {
    fn read(wallet_dir: &Path) -> Result<Self> {
        let settings_path = wallet_dir.join("settings.json");
        if !settings_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&settings_path)?;
        serde_json::from_str(&content).map_err(|e| {
            Error::config(format!("{} is not valid settings JSON: {}", settings_path.display(), e)).into()
        })
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load settings.json from `wallet_dir`, then apply environment overrides
    pub fn load(wallet_dir: &Path) -> Result<Self> {
        Self::load_with(wallet_dir, |key| std::env::var(key).ok())
    }

    /// Like `load`, reading overrides through `env` instead of the process
    /// environment
    pub fn load_with(wallet_dir: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw = SettingsFile::read(wallet_dir)?;
        let defaults = Self::default();

        let api_url = env(ENV_API_URL)
            .filter(|v| !v.trim().is_empty())
            .or(raw.api.base_url)
            .unwrap_or(defaults.api_url);

        let poll_secs = match env(ENV_POLL_INTERVAL) {
            Some(v) => parse_secs(ENV_POLL_INTERVAL, &v)?,
            None => raw.api.poll_interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        };
        if poll_secs == 0 {
            return Err(Error::config("poll interval must be at least 1 second").into());
        }

        let timeout_secs = match env(ENV_REQUEST_TIMEOUT) {
            Some(v) => parse_secs(ENV_REQUEST_TIMEOUT, &v)?,
            None => raw.api.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(Error::config("request timeout must be at least 1 second").into());
        }

        Ok(Self {
            api_url,
            poll_interval: Duration::from_secs(poll_secs),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Save to settings.json, preserving settings this crate doesn't manage
    pub fn save(&self, wallet_dir: &Path) -> Result<()> {
        let mut settings = SettingsFile::read(wallet_dir)?;

        settings.api.base_url = Some(self.api_url.clone());
        settings.api.poll_interval_secs = Some(self.poll_interval.as_secs());
        settings.api.request_timeout_secs = Some(self.request_timeout.as_secs());

        std::fs::create_dir_all(wallet_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(wallet_dir.join("settings.json"), content)?;
        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::config(format!("{} must be a whole number of seconds, got '{}'", key, value)).into())
}
