//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend URL, how the session token is persisted,
//! and the last used username.
//!
//! Configuration is stored at `~/.config/filebox/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::TokenPersistence;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "filebox";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend the original deployment listens on
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

/// Environment variable overriding `api_url`
pub const ENV_API_URL: &str = "FILEBOX_API_URL";

/// Environment variable overriding `last_username`
pub const ENV_USERNAME: &str = "FILEBOX_USERNAME";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub token_persistence: TokenPersistence,
    /// Seconds before a request is abandoned; absent means wait indefinitely
    pub request_timeout_secs: Option<u64>,
    pub last_username: Option<String>,
    /// Where downloads are written; the working directory when absent
    pub download_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_persistence: TokenPersistence::default(),
            request_timeout_secs: None,
            last_username: None,
            download_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply explicit overrides. Blank values are ignored.
    pub fn apply_overrides(&mut self, api_url: Option<String>, username: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(name) = username.filter(|u| !u.trim().is_empty()) {
            self.last_username = Some(name.trim().to_string());
        }
    }

    /// Apply `FILEBOX_API_URL` and `FILEBOX_USERNAME` from the environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_USERNAME).ok(),
        );
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
