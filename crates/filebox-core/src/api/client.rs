//! HTTP implementation of the file store gateway.
//!
//! This module provides the `ApiClient` struct, which translates each
//! gateway operation into exactly one request against the backend.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

use crate::auth::CredentialStore;
use crate::models::{
    FileListResponse, LoginRequest, LoginResponse, MessageResponse, Registration, RenameRequest,
    UploadFile,
};

use super::error::{ApiError, ApiResult};
use super::gateway::FileStoreApi;

// ============================================================================
// Constants
// ============================================================================

/// Multipart field the backend reads uploads from
const UPLOAD_FIELD: &str = "file";

/// Messages used when a successful response has no `{message}`
const UPLOADED: &str = "File uploaded successfully";
const MODIFIED: &str = "File modified successfully";
const RENAMED: &str = "File renamed successfully";
const DELETED: &str = "File deleted successfully";

/// API client for the file store backend.
/// Clone is cheap - reqwest::Client and CredentialStore are both Arc inside.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: CredentialStore,
}

impl ApiClient {
    /// Create a client with no request timeout
    pub fn new(base_url: &str, credentials: CredentialStore) -> Result<Self> {
        Self::with_timeout(base_url, credentials, None)
    }

    /// Create a client, optionally bounding every request by `timeout`
    pub fn with_timeout(
        base_url: &str,
        credentials: CredentialStore,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL for a per-file route, with the name percent-encoded as one segment
    fn file_url(&self, route: &str, name: &str) -> String {
        format!("{}/{}/{}", self.base_url, route, urlencoding::encode(name))
    }

    /// Attach the bearer token as it is right now. The store is read per
    /// request; a missing token still sends the request without the header.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.token() {
            Some(token) => request.bearer_auth(token),
            None => {
                debug!("No session token, sending request without authorization");
                request
            }
        }
    }

    /// Check if response is successful, returning a classified error if not.
    async fn check_response(response: Response) -> ApiResult<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(%status, body = %ApiError::truncate_body(&body), "Backend rejected request");
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send, check the status, and read the `{message}` confirmation.
    async fn send_for_message(request: RequestBuilder, default: &str) -> ApiResult<String> {
        let response = Self::check_response(request.send().await?).await?;
        let body = response.text().await?;
        Ok(MessageResponse::message_from(&body).unwrap_or_else(|| default.to_string()))
    }

    fn file_form(file: &UploadFile) -> Form {
        let part = Part::bytes(file.contents.clone()).file_name(file.file_name.clone());
        Form::new().part(UPLOAD_FIELD, part)
    }
}

#[async_trait]
impl FileStoreApi for ApiClient {
    async fn register(&self, registration: &Registration) -> ApiResult<()> {
        debug!(username = %registration.username, "POST /register");
        let response = self
            .client
            .post(self.url("/register"))
            .json(registration)
            .send()
            .await?;
        Self::check_response(response).await?;
        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> ApiResult<String> {
        debug!(username, "POST /login");
        let response = self
            .client
            .post(self.url("/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await?;
        let response = Self::check_response(response).await?;

        let body = response.text().await?;
        let parsed: LoginResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("login response: {}", e)))?;
        parsed
            .into_token()
            .ok_or_else(|| ApiError::InvalidResponse("login response carried no token".to_string()))
    }

    async fn list_files(&self) -> ApiResult<Vec<String>> {
        debug!("GET /files");
        let request = self.authorized(self.client.get(self.url("/files")));
        let response = Self::check_response(request.send().await?).await?;

        let body = response.text().await?;
        let parsed: FileListResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("file list: {}", e)))?;
        Ok(parsed.files)
    }

    async fn upload(&self, file: &UploadFile) -> ApiResult<String> {
        debug!(file = %file.file_name, bytes = file.len(), "POST /upload");
        let request = self
            .authorized(self.client.post(self.url("/upload")))
            .multipart(Self::file_form(file));
        Self::send_for_message(request, UPLOADED).await
    }

    async fn download(&self, name: &str) -> ApiResult<Vec<u8>> {
        debug!(file = name, "GET /download");
        let request = self.authorized(self.client.get(self.file_url("download", name)));
        let response = Self::check_response(request.send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn rename_file(&self, old_name: &str, new_name: &str) -> ApiResult<String> {
        debug!(file = old_name, new_name, "POST /rename");
        let request = self
            .authorized(self.client.post(self.file_url("rename", old_name)))
            .json(&RenameRequest { new_name });
        Self::send_for_message(request, RENAMED).await
    }

    async fn modify_file(&self, name: &str, file: &UploadFile) -> ApiResult<String> {
        debug!(file = name, bytes = file.len(), "PUT /modify");
        let request = self
            .authorized(self.client.put(self.file_url("modify", name)))
            .multipart(Self::file_form(file));
        Self::send_for_message(request, MODIFIED).await
    }

    async fn delete_file(&self, name: &str) -> ApiResult<String> {
        debug!(file = name, "DELETE /delete");
        let request = self.authorized(self.client.delete(self.file_url("delete", name)));
        Self::send_for_message(request, DELETED).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::{header, HeaderMap, HeaderName, Method, StatusCode, Uri};
    use axum::response::{IntoResponse, Response as StubResponse};
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    use super::*;
    use crate::files::{Confirmation, FileListView, MutationCoordinator};
    use crate::notify;
    use crate::session::{SessionController, ViewState};

    const ALICE_TOKEN: &str = "h.eyJwcmVmZXJyZWRfdXNlcm5hbWUiOiJhbGljZSJ9.s";

    /// One request as the stub backend saw it
    #[derive(Debug, Clone)]
    struct Seen {
        method: Method,
        path: String,
        authorization: Option<String>,
        content_type: Option<String>,
        body: Vec<u8>,
    }

    #[derive(Default)]
    struct Stub {
        seen: Mutex<Vec<Seen>>,
        files: Mutex<Vec<String>>,
    }

    impl Stub {
        fn seen(&self) -> Vec<Seen> {
            self.seen.lock().clone()
        }

        fn requests(&self) -> Vec<(Method, String)> {
            self.seen()
                .into_iter()
                .map(|s| (s.method, s.path))
                .collect()
        }
    }

    fn message(status: StatusCode, text: &str) -> StubResponse {
        (status, Json(json!({ "message": text }))).into_response()
    }

    /// Minimal stand-in for the backend, routing on method and raw path.
    async fn handle(
        State(stub): State<Arc<Stub>>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> StubResponse {
        let header_value = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let authorization = header_value(header::AUTHORIZATION);
        stub.seen.lock().push(Seen {
            method: method.clone(),
            path: uri.path().to_string(),
            authorization: authorization.clone(),
            content_type: header_value(header::CONTENT_TYPE),
            body: body.to_vec(),
        });

        let path = uri.path().to_string();
        let json_body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        let bearer = authorization.as_deref().and_then(|v| v.strip_prefix("Bearer "));

        match (method.as_str(), path.as_str()) {
            ("POST", "/register") => {
                if json_body["username"] == "taken" {
                    message(StatusCode::CONFLICT, "User exists with same username")
                } else {
                    StatusCode::CREATED.into_response()
                }
            }
            ("POST", "/login") => match (json_body["username"].as_str(), json_body["password"].as_str()) {
                (Some("alice"), Some("p")) => Json(json!({ "access_token": ALICE_TOKEN })).into_response(),
                (Some("legacy"), Some("p")) => Json(json!({ "token": "l.e.g" })).into_response(),
                (Some("empty"), Some("p")) => Json(json!({})).into_response(),
                _ => (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "message": "Invalid credentials", "error": "invalid_grant" })),
                )
                    .into_response(),
            },
            (_, _) if bearer.is_none() => {
                message(StatusCode::UNAUTHORIZED, "Token is missing or invalid!")
            }
            ("GET", "/files") => {
                if bearer == Some("garbled") {
                    "definitely not json".into_response()
                } else {
                    Json(json!({ "files": stub.files.lock().clone() })).into_response()
                }
            }
            ("POST", "/upload") => message(StatusCode::OK, "File upload.txt uploaded successfully"),
            ("PUT", p) if p.starts_with("/modify/") => {
                message(StatusCode::OK, "File modified successfully")
            }
            ("POST", p) if p.starts_with("/rename/") => {
                let old = p.trim_start_matches("/rename/").to_string();
                let new_name = json_body["new_name"].as_str().unwrap_or_default().to_string();
                let mut files = stub.files.lock();
                for f in files.iter_mut() {
                    if *f == old {
                        *f = new_name.clone();
                    }
                }
                message(StatusCode::OK, &format!("File {} renamed to {} successfully", old, new_name))
            }
            ("DELETE", "/delete/locked.txt") => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "boom" }))).into_response()
            }
            ("DELETE", p) if p.starts_with("/delete/") => {
                // Success without a message body
                StatusCode::OK.into_response()
            }
            ("GET", p) if p.starts_with("/download/") => {
                format!("contents of {}", p.trim_start_matches("/download/")).into_response()
            }
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn spawn_stub(files: &[&str]) -> (String, Arc<Stub>) {
        let stub = Arc::new(Stub::default());
        *stub.files.lock() = files.iter().map(|f| f.to_string()).collect();

        let app = Router::new().fallback(handle).with_state(Arc::clone(&stub));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), stub)
    }

    fn client(base_url: &str, token: Option<&str>) -> (ApiClient, CredentialStore) {
        let store = CredentialStore::in_memory();
        if let Some(token) = token {
            store.set_token(token).unwrap();
        }
        let api = ApiClient::new(base_url, store.clone()).unwrap();
        (api, store)
    }

    #[test]
    fn test_file_url_encodes_name() {
        let (api, _) = client("http://localhost:5000/", None);
        assert_eq!(api.base_url(), "http://localhost:5000");
        assert_eq!(
            api.file_url("download", "my report.pdf"),
            "http://localhost:5000/download/my%20report.pdf"
        );
        assert_eq!(
            api.file_url("delete", "a/b?.txt"),
            "http://localhost:5000/delete/a%2Fb%3F.txt"
        );
    }

    #[tokio::test]
    async fn test_list_files_sends_bearer_token() {
        let (url, stub) = spawn_stub(&["a.txt", "b.txt"]).await;
        let (api, _) = client(&url, Some(ALICE_TOKEN));

        let files = api.list_files().await.unwrap();
        assert_eq!(files, vec!["a.txt", "b.txt"]);

        let seen = stub.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::GET);
        assert_eq!(seen[0].path, "/files");
        assert_eq!(
            seen[0].authorization.as_deref(),
            Some(format!("Bearer {}", ALICE_TOKEN).as_str())
        );
    }

    #[tokio::test]
    async fn test_token_is_read_per_request() {
        let (url, stub) = spawn_stub(&[]).await;
        let (api, store) = client(&url, Some("first.t.s"));

        api.list_files().await.unwrap();
        store.set_token("second.t.s").unwrap();
        api.list_files().await.unwrap();
        store.clear().unwrap();
        let err = api.list_files().await.unwrap_err();

        let auth: Vec<Option<String>> = stub.seen().into_iter().map(|s| s.authorization).collect();
        assert_eq!(
            auth,
            vec![
                Some("Bearer first.t.s".to_string()),
                Some("Bearer second.t.s".to_string()),
                None,
            ]
        );
        // Attempted without a token; the backend is the one that rejects it
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message("Error fetching files."), "Token is missing or invalid!");
    }

    #[tokio::test]
    async fn test_login_returns_access_token() {
        let (url, stub) = spawn_stub(&[]).await;
        let (api, _) = client(&url, None);

        let token = api.login("alice", "p").await.unwrap();
        assert_eq!(token, ALICE_TOKEN);

        let seen = stub.seen();
        assert_eq!(seen[0].path, "/login");
        assert_eq!(seen[0].authorization, None);
        let body: Value = serde_json::from_slice(&seen[0].body).unwrap();
        assert_eq!(body, json!({ "username": "alice", "password": "p" }));
    }

    #[tokio::test]
    async fn test_login_accepts_legacy_token_field() {
        let (url, _) = spawn_stub(&[]).await;
        let (api, _) = client(&url, None);
        assert_eq!(api.login("legacy", "p").await.unwrap(), "l.e.g");
    }

    #[tokio::test]
    async fn test_login_without_token_is_invalid_response() {
        let (url, _) = spawn_stub(&[]).await;
        let (api, _) = client(&url, None);
        let err = api.login("empty", "p").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_login_rejected_carries_backend_message() {
        let (url, _) = spawn_stub(&[]).await;
        let (api, _) = client(&url, None);
        let err = api.login("alice", "wrong").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message("Login failed"), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_register_success_and_conflict() {
        let (url, stub) = spawn_stub(&[]).await;
        let (api, _) = client(&url, None);

        let mut registration = Registration {
            username: "bob".to_string(),
            password: "pw".to_string(),
            email: "bob@example.com".to_string(),
            first_name: "Bob".to_string(),
            last_name: "Builder".to_string(),
        };
        api.register(&registration).await.unwrap();

        registration.username = "taken".to_string();
        let err = api.register(&registration).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(err.user_message("Registration failed"), "User exists with same username");

        let body: Value = serde_json::from_slice(&stub.seen()[0].body).unwrap();
        assert_eq!(body["first_name"], "Bob");
        assert_eq!(body["last_name"], "Builder");
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_file() {
        let (url, stub) = spawn_stub(&[]).await;
        let (api, _) = client(&url, Some(ALICE_TOKEN));

        let message = api
            .upload(&UploadFile::new("upload.txt", b"payload bytes".to_vec()))
            .await
            .unwrap();
        assert_eq!(message, "File upload.txt uploaded successfully");

        let seen = &stub.seen()[0];
        assert_eq!(seen.method, Method::POST);
        assert_eq!(seen.path, "/upload");
        assert!(seen
            .content_type
            .as_deref()
            .unwrap_or_default()
            .starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&seen.body);
        assert!(body.contains("name=\"file\""));
        assert!(body.contains("filename=\"upload.txt\""));
        assert!(body.contains("payload bytes"));
    }

    #[tokio::test]
    async fn test_modify_puts_to_named_file() {
        let (url, stub) = spawn_stub(&[]).await;
        let (api, _) = client(&url, Some(ALICE_TOKEN));

        let message = api
            .modify_file("report v2.txt", &UploadFile::new("local.txt", b"new".to_vec()))
            .await
            .unwrap();
        assert_eq!(message, "File modified successfully");

        let seen = &stub.seen()[0];
        assert_eq!(seen.method, Method::PUT);
        assert_eq!(seen.path, "/modify/report%20v2.txt");
    }

    #[tokio::test]
    async fn test_download_returns_bytes() {
        let (url, stub) = spawn_stub(&[]).await;
        let (api, _) = client(&url, Some(ALICE_TOKEN));

        let bytes = api.download("a.txt").await.unwrap();
        assert_eq!(bytes, b"contents of a.txt");
        assert_eq!(stub.requests(), vec![(Method::GET, "/download/a.txt".to_string())]);
    }

    #[tokio::test]
    async fn test_delete_without_message_uses_default() {
        let (url, _) = spawn_stub(&[]).await;
        let (api, _) = client(&url, Some(ALICE_TOKEN));
        assert_eq!(api.delete_file("a.txt").await.unwrap(), DELETED);
    }

    #[tokio::test]
    async fn test_delete_failure_without_message_uses_fallback() {
        let (url, _) = spawn_stub(&[]).await;
        let (api, _) = client(&url, Some(ALICE_TOKEN));
        let err = api.delete_file("locked.txt").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.user_message("Error deleting file."), "Error deleting file.");
    }

    #[tokio::test]
    async fn test_garbled_file_list_is_invalid_response() {
        let (url, _) = spawn_stub(&[]).await;
        let (api, _) = client(&url, Some("garbled"));
        let err = api.list_files().await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let (api, _) = client("http://127.0.0.1:1", Some(ALICE_TOKEN));
        let err = api.list_files().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[tokio::test]
    async fn test_rename_then_single_refresh_over_http() {
        let (url, stub) = spawn_stub(&["a.txt", "b.txt"]).await;
        let store = CredentialStore::in_memory();
        let api: Arc<dyn FileStoreApi> = Arc::new(ApiClient::new(&url, store.clone()).unwrap());
        let (notifier, mut rx) = notify::channel();
        let view = FileListView::new(Arc::clone(&api), notifier.clone());
        let coordinator = MutationCoordinator::new(Arc::clone(&api), view.clone(), notifier.clone());
        let session = SessionController::new(Arc::clone(&api), store.clone(), view.clone(), notifier);

        session.login("alice", "p").await.unwrap();
        assert_eq!(session.state(), ViewState::Authenticated);
        assert_eq!(session.display_name().as_deref(), Some("alice"));
        assert_eq!(view.names(), vec!["a.txt", "b.txt"]);

        let before = stub.seen().len();
        coordinator.rename("a.txt", "c.txt").await;
        let after: Vec<(Method, String)> = stub.requests().into_iter().skip(before).collect();
        assert_eq!(
            after,
            vec![
                (Method::POST, "/rename/a.txt".to_string()),
                (Method::GET, "/files".to_string()),
            ]
        );
        assert_eq!(view.names(), vec!["c.txt", "b.txt"]);

        let rename_body: Value = serde_json::from_slice(&stub.seen()[before].body).unwrap();
        assert_eq!(rename_body, json!({ "new_name": "c.txt" }));

        // Declined delete never reaches the backend
        coordinator.delete("b.txt", Confirmation::Declined).await;
        assert_eq!(stub.seen().len(), before + 2);

        session.logout();
        assert_eq!(session.state(), ViewState::Anonymous);
        assert_eq!(stub.seen().len(), before + 2);
        assert!(!store.has_token());

        let messages: Vec<String> = notify::drain(&mut rx).into_iter().map(|n| n.message).collect();
        assert!(messages.contains(&"File a.txt renamed to c.txt successfully".to_string()));
    }
}
