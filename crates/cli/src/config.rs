// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration management.
//!
//! Configuration is stored in `<state_dir>/config.toml`. Every key has a
//! default, so a missing file is the same as an empty one:
//!
//! ```toml
//! [remote]
//! url = "https://dispatch.example.com/api"
//! timeout_secs = 15
//!
//! [sync]
//! debounce_ms = 2000
//! probe_interval_secs = 10
//! rejected_retry_limit = 5
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};

const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "courier.db";
const LOG_FILE_NAME: &str = "courier.log";
const LOCK_FILE_NAME: &str = "watch.lock";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Backend API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL every endpoint path is appended to.
    #[serde(default = "default_url")]
    pub url: String,
    /// Upper bound for one remote call, in seconds. Exceeding it is a
    /// transient failure.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Replay and connectivity settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How long the reachability signal must stay stable before a
    /// transition is published.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Reachability polling interval for `courier watch`.
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
    /// Rejected (4xx) attempts before an item is quarantined.
    #[serde(default = "default_rejected_retry_limit")]
    pub rejected_retry_limit: u32,
}

fn default_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_debounce_ms() -> u64 {
    2_000
}

fn default_probe_interval_secs() -> u64 {
    10
}

fn default_rejected_retry_limit() -> u32 {
    5
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            debounce_ms: default_debounce_ms(),
            probe_interval_secs: default_probe_interval_secs(),
            rejected_retry_limit: default_rejected_retry_limit(),
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Validates the base URL. Returns an error message if it is invalid.
    pub fn validate_url(&self) -> Option<String> {
        let url = self.url.trim();
        if url.starts_with("http://") || url.starts_with("https://") {
            return None;
        }
        Some(format!(
            "invalid remote URL '{}': must start with http:// or https://",
            self.url
        ))
    }
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }
}

impl Config {
    /// Loads configuration from the given state directory.
    ///
    /// A missing file yields the defaults.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let config_path = state_dir.join(CONFIG_FILE_NAME);
        let content = match fs::read_to_string(&config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(Error::Config(format!("failed to read config: {}", e))),
        };
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        if let Some(msg) = config.remote.validate_url() {
            return Err(Error::Config(msg));
        }
        Ok(config)
    }

    /// Applies environment overrides (`COURIER_API_URL`).
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(url) = env::api_url() {
            self.remote.url = url;
            if let Some(msg) = self.remote.validate_url() {
                return Err(Error::Config(msg));
            }
        }
        Ok(self)
    }
}

/// Directory holding the database, config, log, and lock file.
///
/// `COURIER_STATE_DIR`, then `$XDG_STATE_HOME/courier`, then
/// `~/.local/state/courier`.
pub fn state_dir() -> PathBuf {
    if let Some(dir) = env::state_dir() {
        return dir;
    }
    if let Some(dir) = env::xdg_state_home() {
        return dir.join("courier");
    }
    dirs::home_dir()
        .map(|h| h.join(".local/state/courier"))
        .unwrap_or_else(|| PathBuf::from(".local/state/courier"))
}

pub fn db_path(state_dir: &Path) -> PathBuf {
    state_dir.join(DB_FILE_NAME)
}

pub fn log_path(state_dir: &Path) -> PathBuf {
    state_dir.join(LOG_FILE_NAME)
}

pub fn lock_path(state_dir: &Path) -> PathBuf {
    state_dir.join(LOCK_FILE_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
