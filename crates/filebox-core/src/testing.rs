//! In-process backend and wiring helpers shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use tokio::sync::oneshot;

use crate::api::{ApiError, ApiResult, FileStoreApi};
use crate::auth::CredentialStore;
use crate::files::{FileListView, MutationCoordinator};
use crate::models::{Registration, UploadFile};
use crate::notify::{self, Notice, NoticeReceiver, Notifier};
use crate::session::SessionController;

/// Three-segment token whose claims carry `preferred_username: alice`.
pub(crate) const ALICE_TOKEN: &str = "h.eyJwcmVmZXJyZWRfdXNlcm5hbWUiOiJhbGljZSJ9.s";

/// One gateway operation, used to address failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    Register,
    Login,
    List,
    Upload,
    Download,
    Rename,
    Modify,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Register(String),
    Login(String),
    List,
    Upload(String),
    Download(String),
    Rename { old: String, new: String },
    Modify(String),
    Delete(String),
}

impl Call {
    pub(crate) fn op(&self) -> Op {
        match self {
            Call::Register(_) => Op::Register,
            Call::Login(_) => Op::Login,
            Call::List => Op::List,
            Call::Upload(_) => Op::Upload,
            Call::Download(_) => Op::Download,
            Call::Rename { .. } => Op::Rename,
            Call::Modify(_) => Op::Modify,
            Call::Delete(_) => Op::Delete,
        }
    }
}

/// A call together with the token the store held when it was made.
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub call: Call,
    pub token: Option<String>,
}

/// How a scripted operation fails.
#[derive(Debug, Clone)]
pub(crate) enum Failure {
    Status(StatusCode, Option<&'static str>),
    Garbled,
}

impl Failure {
    fn into_error(self) -> ApiError {
        match self {
            Failure::Status(status, message) => match message {
                Some(m) => ApiError::from_status(status, &format!(r#"{{"message": "{}"}}"#, m)),
                None => ApiError::from_status(status, ""),
            },
            Failure::Garbled => ApiError::InvalidResponse("garbled body".to_string()),
        }
    }
}

struct User {
    username: String,
    password: String,
    token: String,
}

#[derive(Default)]
struct FakeState {
    files: Vec<String>,
    users: Vec<User>,
    calls: Vec<Recorded>,
    failures: HashMap<Op, Failure>,
    gated_lists: VecDeque<(oneshot::Receiver<()>, Vec<String>)>,
}

/// Stand-in for the remote store. Mutations apply to an in-memory file
/// list, authorized calls are rejected when the store holds no token, and
/// every call is recorded with the token seen at that moment.
pub(crate) struct FakeBackend {
    credentials: CredentialStore,
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub(crate) fn new(credentials: CredentialStore) -> Self {
        Self {
            credentials,
            state: Mutex::new(FakeState::default()),
        }
    }

    pub(crate) fn with_files(self, files: &[&str]) -> Self {
        self.set_files(files);
        self
    }

    pub(crate) fn with_user(self, username: &str, password: &str, token: &str) -> Self {
        self.add_user(username, password, token);
        self
    }

    pub(crate) fn add_user(&self, username: &str, password: &str, token: &str) {
        self.state.lock().users.push(User {
            username: username.to_string(),
            password: password.to_string(),
            token: token.to_string(),
        });
    }

    pub(crate) fn set_files(&self, files: &[&str]) {
        self.state.lock().files = files.iter().map(|f| f.to_string()).collect();
    }

    pub(crate) fn files(&self) -> Vec<String> {
        self.state.lock().files.clone()
    }

    /// Make `op` fail until `recover` is called.
    pub(crate) fn fail(&self, op: Op, failure: Failure) {
        self.state.lock().failures.insert(op, failure);
    }

    pub(crate) fn recover(&self, op: Op) {
        self.state.lock().failures.remove(&op);
    }

    /// Queue a list response that is held back until the returned sender
    /// fires. Queued responses are consumed in call order.
    pub(crate) fn gate_list(&self, files: &[&str]) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        let files = files.iter().map(|f| f.to_string()).collect();
        self.state.lock().gated_lists.push_back((rx, files));
        tx
    }

    pub(crate) fn recorded(&self) -> Vec<Recorded> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.recorded().into_iter().map(|r| r.call).collect()
    }

    pub(crate) fn count(&self, op: Op) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|r| r.call.op() == op)
            .count()
    }

    pub(crate) fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Record the call, then apply any scripted failure.
    fn begin(&self, call: Call) -> ApiResult<()> {
        let op = call.op();
        let token = self.credentials.token();
        let mut state = self.state.lock();
        state.calls.push(Recorded { call, token });
        match state.failures.get(&op) {
            Some(failure) => Err(failure.clone().into_error()),
            None => Ok(()),
        }
    }

    /// `begin` plus the backend's bearer check.
    fn begin_authorized(&self, call: Call) -> ApiResult<()> {
        self.begin(call)?;
        if self.credentials.token().is_none() {
            return Err(Failure::Status(
                StatusCode::UNAUTHORIZED,
                Some("Token is missing or invalid!"),
            )
            .into_error());
        }
        Ok(())
    }

    fn not_found() -> ApiError {
        Failure::Status(StatusCode::NOT_FOUND, Some("File not found")).into_error()
    }
}

#[async_trait]
impl FileStoreApi for FakeBackend {
    async fn register(&self, registration: &Registration) -> ApiResult<()> {
        self.begin(Call::Register(registration.username.clone()))?;
        let mut state = self.state.lock();
        if state.users.iter().any(|u| u.username == registration.username) {
            return Err(Failure::Status(
                StatusCode::CONFLICT,
                Some("User exists with same username"),
            )
            .into_error());
        }
        state.users.push(User {
            username: registration.username.clone(),
            password: registration.password.clone(),
            token: format!("h.{}.s", registration.username),
        });
        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> ApiResult<String> {
        self.begin(Call::Login(username.to_string()))?;
        self.state
            .lock()
            .users
            .iter()
            .find(|u| u.username == username && u.password == password)
            .map(|u| u.token.clone())
            .ok_or_else(|| {
                Failure::Status(StatusCode::UNAUTHORIZED, Some("Invalid credentials")).into_error()
            })
    }

    async fn list_files(&self) -> ApiResult<Vec<String>> {
        self.begin_authorized(Call::List)?;
        let gated = self.state.lock().gated_lists.pop_front();
        match gated {
            Some((gate, files)) => {
                let _ = gate.await;
                Ok(files)
            }
            None => Ok(self.files()),
        }
    }

    async fn upload(&self, file: &UploadFile) -> ApiResult<String> {
        self.begin_authorized(Call::Upload(file.file_name.clone()))?;
        let mut state = self.state.lock();
        if !state.files.contains(&file.file_name) {
            state.files.push(file.file_name.clone());
        }
        Ok(format!("File {} uploaded successfully", file.file_name))
    }

    async fn download(&self, name: &str) -> ApiResult<Vec<u8>> {
        self.begin_authorized(Call::Download(name.to_string()))?;
        if self.state.lock().files.iter().any(|f| f == name) {
            Ok(format!("contents of {}", name).into_bytes())
        } else {
            Err(Self::not_found())
        }
    }

    async fn rename_file(&self, old_name: &str, new_name: &str) -> ApiResult<String> {
        self.begin_authorized(Call::Rename {
            old: old_name.to_string(),
            new: new_name.to_string(),
        })?;
        let mut state = self.state.lock();
        let entry = state
            .files
            .iter_mut()
            .find(|f| f.as_str() == old_name)
            .ok_or_else(Self::not_found)?;
        *entry = new_name.to_string();
        Ok(format!(
            "File {} renamed to {} successfully",
            old_name, new_name
        ))
    }

    async fn modify_file(&self, name: &str, _file: &UploadFile) -> ApiResult<String> {
        self.begin_authorized(Call::Modify(name.to_string()))?;
        if self.state.lock().files.iter().any(|f| f == name) {
            Ok(format!("File {} modified successfully", name))
        } else {
            Err(Self::not_found())
        }
    }

    async fn delete_file(&self, name: &str) -> ApiResult<String> {
        self.begin_authorized(Call::Delete(name.to_string()))?;
        let mut state = self.state.lock();
        let before = state.files.len();
        state.files.retain(|f| f != name);
        if state.files.len() == before {
            return Err(Self::not_found());
        }
        Ok(format!("File {} deleted successfully", name))
    }
}

/// Every core component wired to one `FakeBackend`, the way a front-end
/// wires them at startup.
pub(crate) struct Harness {
    pub fake: Arc<FakeBackend>,
    pub store: CredentialStore,
    pub notifier: Notifier,
    pub notices: NoticeReceiver,
    pub view: FileListView,
    pub coordinator: MutationCoordinator,
}

impl Harness {
    /// Logged-in harness: the store holds `ALICE_TOKEN`.
    pub(crate) fn authenticated(files: &[&str]) -> Self {
        let harness = Self::anonymous(files);
        harness.store.set_token(ALICE_TOKEN).unwrap();
        harness
    }

    /// Empty store; `alice` / `p` is a valid account.
    pub(crate) fn anonymous(files: &[&str]) -> Self {
        let store = CredentialStore::in_memory();
        let fake = Arc::new(
            FakeBackend::new(store.clone())
                .with_files(files)
                .with_user("alice", "p", ALICE_TOKEN),
        );
        let api: Arc<dyn FileStoreApi> = fake.clone();
        let (notifier, notices) = notify::channel();
        let view = FileListView::new(Arc::clone(&api), notifier.clone());
        let coordinator = MutationCoordinator::new(api, view.clone(), notifier.clone());

        Self {
            fake,
            store,
            notifier,
            notices,
            view,
            coordinator,
        }
    }

    pub(crate) fn controller(&self) -> SessionController {
        let api: Arc<dyn FileStoreApi> = self.fake.clone();
        SessionController::new(
            api,
            self.store.clone(),
            self.view.clone(),
            self.notifier.clone(),
        )
    }

    pub(crate) fn drain(&mut self) -> Vec<Notice> {
        notify::drain(&mut self.notices)
    }

    pub(crate) fn messages(&mut self) -> Vec<String> {
        self.drain().into_iter().map(|n| n.message).collect()
    }
}
