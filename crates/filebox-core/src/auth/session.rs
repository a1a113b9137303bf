use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Token as persisted on disk. `stored_at` is informational only;
/// expiry is decided by the backend, never locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub stored_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(token: String) -> Self {
        Self {
            token,
            stored_at: Utc::now(),
        }
    }
}

/// Durable token storage in the cache directory.
pub struct SessionFile {
    cache_dir: PathBuf,
}

impl SessionFile {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// Load the persisted session, if any
    pub fn load(&self) -> Result<Option<SessionData>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let data: SessionData =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(data))
    }

    /// Save session to disk
    pub fn save(&self, data: &SessionData) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(path, contents).context("Failed to write session file")?;
        Ok(())
    }

    /// Remove the session file if present
    pub fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}
