use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// `GET /files` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct FileListResponse {
    pub files: Vec<String>,
}

/// `{message}` body used by mutation responses and most failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

impl MessageResponse {
    /// Decode a body, treating anything that is not a JSON object with a
    /// non-empty string `message` as having no message.
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<MessageResponse>(body)
            .ok()
            .and_then(|m| m.message)
            .filter(|m| !m.trim().is_empty())
    }
}

/// `POST /rename/{name}` body.
#[derive(Debug, Clone, Serialize)]
pub struct RenameRequest<'a> {
    pub new_name: &'a str,
}

/// File content to send with upload or modify. The backend stores uploads
/// under `file_name`; modify ignores it and overwrites the named target.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub contents: Vec<u8>,
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("len", &self.contents.len())
            .finish()
    }
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }

    /// Read a local file, naming the upload after its final path component.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| anyhow::anyhow!("{} has no usable file name", path.display()))?
            .to_string();
        let contents = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self { file_name, contents })
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}
