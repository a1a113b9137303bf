use reqwest::StatusCode;
use thiserror::Error;

use crate::models::MessageResponse;

/// Shown for failures that carry nothing the user can act on.
pub const UNREACHABLE_MESSAGE: &str = "Unable to connect to server. Check your network connection.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized ({status}): {}", describe(.message))]
    Unauthorized {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Request failed ({status}): {}", describe(.message))]
    Remote {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

fn describe(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or("no details")
}

/// Maximum length for error response bodies in log output
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Classify a non-success response, keeping the backend's `{message}`
    /// when the body decodes to one.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = MessageResponse::message_from(body);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ApiError::Unauthorized { status, message }
            }
            _ => ApiError::Remote { status, message },
        }
    }

    /// HTTP status when the backend answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { status, .. } | ApiError::Remote { status, .. } => {
                Some(*status)
            }
            ApiError::Transport(e) => e.status(),
            ApiError::InvalidResponse(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Text to show the user: the backend's message when it sent one,
    /// otherwise `fallback` (or a connectivity hint for transport failures).
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Unauthorized {
                message: Some(message),
                ..
            }
            | ApiError::Remote {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Transport(e) if e.is_connect() || e.is_timeout() => {
                UNREACHABLE_MESSAGE.to_string()
            }
            _ => fallback.to_string(),
        }
    }
}
