//! CLI configuration (~/.config/obsws/config.json)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub const DEFAULT_ADDRESS: &str = "ws://127.0.0.1:4444";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

const KNOWN_KEYS: &[&str] = &["address", "password", "requestTimeoutMs"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            password: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Default config file location, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "obsws").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load config from file, returning defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        warn_unknown_fields(&content, &path.display().to_string());
        serde_json::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Warn about top-level keys the config does not understand.
fn warn_unknown_fields(content: &str, config_name: &str) {
    for key in unknown_keys(content) {
        warn!("Unknown config field in {config_name}: {key}");
    }
}

fn unknown_keys(content: &str) -> Vec<String> {
    let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(content) else {
        return Vec::new();
    };
    obj.keys()
        .filter(|key| !KNOWN_KEYS.contains(&key.as_str()))
        .cloned()
        .collect()
}
