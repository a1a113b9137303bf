//! Write operations against the remote store.
//!
//! Each mutation is one gateway call followed, on success, by exactly one
//! list refresh. Results are reported through the notifier; nothing is
//! retried.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{ApiResult, FileStoreApi};
use crate::models::UploadFile;
use crate::notify::Notifier;

use super::actions::{
    validate_new_name, ActionInput, ActionKind, ActionOutcome, Confirmation, RowAction,
    ValidationError,
};
use super::view::FileListView;

// Fallbacks when a failure carries no backend message
const UPLOAD_FAILED: &str = "Error uploading file.";
const MODIFY_FAILED: &str = "Error modifying file.";
const RENAME_FAILED: &str = "Error renaming file.";
const DELETE_FAILED: &str = "Error deleting file.";
const DOWNLOAD_FAILED: &str = "Error downloading file.";

#[derive(Clone)]
pub struct MutationCoordinator {
    api: Arc<dyn FileStoreApi>,
    view: FileListView,
    notifier: Notifier,
}

impl MutationCoordinator {
    pub fn new(api: Arc<dyn FileStoreApi>, view: FileListView, notifier: Notifier) -> Self {
        Self {
            api,
            view,
            notifier,
        }
    }

    pub async fn upload(&self, file: &UploadFile) -> ActionOutcome {
        debug!(file = %file.file_name, "Uploading");
        let result = self.api.upload(file).await;
        self.finish("upload", result, UPLOAD_FAILED).await
    }

    /// Rename `old_name`. Empty or unchanged names are skipped without a call.
    pub async fn rename(&self, old_name: &str, proposed: &str) -> ActionOutcome {
        let new_name = match validate_new_name(old_name, proposed) {
            Ok(name) => name,
            Err(e) => return Self::skip(ActionKind::Rename, e),
        };
        let result = self.api.rename_file(old_name, &new_name).await;
        self.finish("rename", result, RENAME_FAILED).await
    }

    /// Overwrite `name` with `file`'s content.
    pub async fn modify(&self, name: &str, file: &UploadFile) -> ActionOutcome {
        let result = self.api.modify_file(name, file).await;
        self.finish("modify", result, MODIFY_FAILED).await
    }

    /// Delete `name` once the user has confirmed.
    pub async fn delete(&self, name: &str, confirmation: Confirmation) -> ActionOutcome {
        if confirmation != Confirmation::Confirmed {
            return Self::skip(ActionKind::Delete, ValidationError::NotConfirmed);
        }
        let result = self.api.delete_file(name).await;
        self.finish("delete", result, DELETE_FAILED).await
    }

    /// Fetch `name`. Never refreshes the list.
    pub async fn download(&self, name: &str) -> ActionOutcome {
        match self.api.download(name).await {
            Ok(contents) => {
                info!(file = name, bytes = contents.len(), "Downloaded");
                ActionOutcome::Downloaded {
                    file_name: name.to_string(),
                    contents,
                }
            }
            Err(e) => {
                warn!(file = name, error = %e, "Download failed");
                let message = e.user_message(DOWNLOAD_FAILED);
                self.notifier.error(message.clone());
                ActionOutcome::Failed { message }
            }
        }
    }

    /// Run a row action with the input the user supplied for it.
    pub async fn dispatch(&self, action: &RowAction, input: ActionInput) -> ActionOutcome {
        let name = action.file_name.as_str();
        match (action.kind, input) {
            (ActionKind::Download, ActionInput::None) => self.download(name).await,
            (ActionKind::Modify, ActionInput::Replacement(file)) => self.modify(name, &file).await,
            (ActionKind::Rename, ActionInput::NewName(proposed)) => {
                self.rename(name, &proposed).await
            }
            (ActionKind::Delete, ActionInput::Confirmation(confirmation)) => {
                self.delete(name, confirmation).await
            }
            (kind, _) => Self::skip(kind, ValidationError::InputMismatch { kind }),
        }
    }

    fn skip(kind: ActionKind, reason: ValidationError) -> ActionOutcome {
        debug!(action = %kind, %reason, "Skipping action");
        ActionOutcome::Skipped(reason)
    }

    async fn finish(
        &self,
        op: &'static str,
        result: ApiResult<String>,
        fallback: &str,
    ) -> ActionOutcome {
        match result {
            Ok(message) => {
                info!(op, "Mutation succeeded, refreshing list");
                self.notifier.success(message.clone());
                self.view.refresh().await;
                ActionOutcome::Completed { message }
            }
            Err(e) => {
                warn!(op, error = %e, "Mutation failed");
                let message = e.user_message(fallback);
                self.notifier.error(message.clone());
                ActionOutcome::Failed { message }
            }
        }
    }
}
