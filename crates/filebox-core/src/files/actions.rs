use std::fmt;

use thiserror::Error;

use crate::models::UploadFile;

/// The per-row operations every file entry exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Download,
    Modify,
    Rename,
    Delete,
}

impl ActionKind {
    /// Row order used by every front-end.
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Download,
        ActionKind::Modify,
        ActionKind::Rename,
        ActionKind::Delete,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Download => "Download",
            ActionKind::Modify => "Modify",
            ActionKind::Rename => "Rename",
            ActionKind::Delete => "Delete",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An action bound by value to the name of the row that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowAction {
    pub kind: ActionKind,
    pub file_name: String,
}

impl RowAction {
    pub fn new(kind: ActionKind, file_name: impl Into<String>) -> Self {
        Self {
            kind,
            file_name: file_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

/// What the user supplied alongside a row action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionInput {
    None,
    NewName(String),
    Replacement(UploadFile),
    Confirmation(Confirmation),
}

/// Input rejected locally. No remote call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("New name cannot be empty")]
    EmptyName,

    #[error("New name is the same as the current name")]
    UnchangedName,

    #[error("Deletion was not confirmed")]
    NotConfirmed,

    #[error("{kind} does not accept this input")]
    InputMismatch { kind: ActionKind },

    #[error("Username and password are required")]
    MissingCredentials,
}

/// Trim a proposed name and check it against the current one.
pub fn validate_new_name(current: &str, proposed: &str) -> Result<String, ValidationError> {
    let proposed = proposed.trim();
    if proposed.is_empty() {
        Err(ValidationError::EmptyName)
    } else if proposed == current {
        Err(ValidationError::UnchangedName)
    } else {
        Ok(proposed.to_string())
    }
}

/// Both login fields must be filled in. The username counts as empty when
/// it is only whitespace; neither value is altered.
pub fn validate_credentials(username: &str, password: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() || password.is_empty() {
        Err(ValidationError::MissingCredentials)
    } else {
        Ok(())
    }
}

/// Result of running one action, after the user has been notified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The backend accepted a write; the list has been refreshed.
    Completed { message: String },
    Downloaded { file_name: String, contents: Vec<u8> },
    Failed { message: String },
    /// Rejected locally without contacting the backend.
    Skipped(ValidationError),
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ActionOutcome::Completed { .. } | ActionOutcome::Downloaded { .. }
        )
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ActionOutcome::Completed { message } | ActionOutcome::Failed { message } => {
                Some(message)
            }
            _ => None,
        }
    }
}
