use async_trait::async_trait;

use crate::models::{Registration, UploadFile};

use super::error::ApiResult;

/// One method per remote operation of the file store backend.
///
/// Implementations attach the current session token to every authorized
/// call and normalise responses into `ApiResult`. The session controller,
/// file list view and mutation coordinator only ever talk to this trait,
/// so tests can substitute an in-process backend.
#[async_trait]
pub trait FileStoreApi: Send + Sync {
    /// Create an account. Never authenticates.
    async fn register(&self, registration: &Registration) -> ApiResult<()>;

    /// Exchange credentials for a bearer token.
    async fn login(&self, username: &str, password: &str) -> ApiResult<String>;

    /// Names in the user's store, in backend order.
    async fn list_files(&self) -> ApiResult<Vec<String>>;

    /// Store a new file. Returns the backend's confirmation message.
    async fn upload(&self, file: &UploadFile) -> ApiResult<String>;

    /// Raw file content.
    async fn download(&self, name: &str) -> ApiResult<Vec<u8>>;

    async fn rename_file(&self, old_name: &str, new_name: &str) -> ApiResult<String>;

    /// Overwrite `name` entirely with `file`'s content.
    async fn modify_file(&self, name: &str, file: &UploadFile) -> ApiResult<String>;

    async fn delete_file(&self, name: &str) -> ApiResult<String>;
}
