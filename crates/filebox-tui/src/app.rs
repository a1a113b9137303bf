//! Application state management for filebox.
//!
//! This module contains the `App` struct that wires the core components
//! together and holds all UI state: the anonymous-region forms, the prompt
//! overlays for row actions, and the channel background tasks report on.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use filebox_core::files::{
    validate_credentials, ActionInput, ActionKind, ActionOutcome, Confirmation, FileListView,
    MutationCoordinator, RowAction,
};
use filebox_core::models::{Registration, UploadFile};
use filebox_core::notify::{self, Notice, NoticeReceiver, Notifier};
use filebox_core::session::{SessionController, SessionError};
use filebox_core::{ApiClient, Config, CredentialStore, FileStoreApi};

use crate::utils::{download_target, expand_path, format_size};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for email and name fields.
const MAX_FIELD_LENGTH: usize = 100;

/// Maximum length for file names and local paths typed into a prompt.
const MAX_PROMPT_LENGTH: usize = 1024;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    Prompting,
    ConfirmingQuit,
    Quitting,
}

/// Which form the anonymous region shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnonymousForm {
    Login,
    Register,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

/// Register form focus state, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterField {
    #[default]
    Username,
    Password,
    Email,
    FirstName,
    LastName,
    Button,
}

impl RegisterField {
    pub const INPUTS: [RegisterField; 5] = [
        RegisterField::Username,
        RegisterField::Password,
        RegisterField::Email,
        RegisterField::FirstName,
        RegisterField::LastName,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RegisterField::Username => "Username",
            RegisterField::Password => "Password",
            RegisterField::Email => "Email",
            RegisterField::FirstName => "First name",
            RegisterField::LastName => "Last name",
            RegisterField::Button => "Register",
        }
    }

    /// Get the next field (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            RegisterField::Username => RegisterField::Password,
            RegisterField::Password => RegisterField::Email,
            RegisterField::Email => RegisterField::FirstName,
            RegisterField::FirstName => RegisterField::LastName,
            RegisterField::LastName => RegisterField::Button,
            RegisterField::Button => RegisterField::Username,
        }
    }

    /// Get the previous field (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            RegisterField::Username => RegisterField::Button,
            RegisterField::Password => RegisterField::Username,
            RegisterField::Email => RegisterField::Password,
            RegisterField::FirstName => RegisterField::Email,
            RegisterField::LastName => RegisterField::FirstName,
            RegisterField::Button => RegisterField::LastName,
        }
    }

    pub fn max_length(&self) -> usize {
        match self {
            RegisterField::Username => MAX_USERNAME_LENGTH,
            RegisterField::Password => MAX_PASSWORD_LENGTH,
            _ => MAX_FIELD_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub values: Registration,
    pub focus: RegisterField,
    pub error: Option<String>,
}

impl RegisterForm {
    pub fn value(&self, field: RegisterField) -> &str {
        match field {
            RegisterField::Username => &self.values.username,
            RegisterField::Password => &self.values.password,
            RegisterField::Email => &self.values.email,
            RegisterField::FirstName => &self.values.first_name,
            RegisterField::LastName => &self.values.last_name,
            RegisterField::Button => "",
        }
    }

    fn value_mut(&mut self, field: RegisterField) -> Option<&mut String> {
        match field {
            RegisterField::Username => Some(&mut self.values.username),
            RegisterField::Password => Some(&mut self.values.password),
            RegisterField::Email => Some(&mut self.values.email),
            RegisterField::FirstName => Some(&mut self.values.first_name),
            RegisterField::LastName => Some(&mut self.values.last_name),
            RegisterField::Button => None,
        }
    }

    /// Append to the focused field, respecting its length limit.
    pub fn push_char(&mut self, c: char) {
        let field = self.focus;
        if let Some(value) = self.value_mut(field) {
            if can_add_char(value.chars().count(), field.max_length(), c) {
                value.push(c);
            }
        }
    }

    pub fn pop_char(&mut self) {
        let field = self.focus;
        if let Some(value) = self.value_mut(field) {
            value.pop();
        }
    }
}

/// A row action (or upload) waiting on input from an overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    ConfirmDelete(RowAction),
    NewName(RowAction),
    ReplacementPath(RowAction),
    UploadPath,
}

impl Prompt {
    pub fn title(&self) -> String {
        match self {
            Prompt::ConfirmDelete(action) => format!("Delete {}?", action.file_name),
            Prompt::NewName(action) => format!("Rename {}", action.file_name),
            Prompt::ReplacementPath(action) => format!("Replace {} with", action.file_name),
            Prompt::UploadPath => "Upload file".to_string(),
        }
    }

    /// Whether the overlay collects typed text rather than y/n.
    pub fn takes_text(&self) -> bool {
        !matches!(self, Prompt::ConfirmDelete(_))
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Sent by spawned tasks when they finish. Outcomes have already been
/// reported to the user through the notifier.
enum TaskResult {
    Refreshed(bool),
    Finished { label: &'static str, success: bool },
    LoggedIn { username: String },
    LoginFailed(String),
    Registered { username: String },
    RegisterFailed(String),
}

/// Form-facing text for a failed login or registration.
fn session_error_text(error: SessionError, fallback: &str) -> String {
    match error {
        SessionError::Validation(e) => e.to_string(),
        SessionError::Api(e) => e.user_message(fallback),
    }
}

// ============================================================================
// App
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub session: SessionController,
    pub files: FileListView,
    coordinator: MutationCoordinator,
    notifier: Notifier,
    notices: NoticeReceiver,

    // UI State
    pub state: AppState,
    pub form: AnonymousForm,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    pub login_pending: bool,

    pub register: RegisterForm,
    pub register_pending: bool,

    // Prompt overlay
    pub prompt: Option<Prompt>,
    pub prompt_input: String,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,
    pub tasks_in_flight: usize,

    // Latest notice, shown in the status bar
    pub status: Option<Notice>,
}

impl App {
    /// Create a new application instance from the saved configuration
    pub fn new() -> Result<Self> {
        let mut config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        config.apply_env();
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        debug!(api_url = %config.api_url, persistence = %config.token_persistence, "Config loaded");

        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        let credentials = CredentialStore::open(config.token_persistence, &cache_dir);

        let client =
            ApiClient::with_timeout(&config.api_url, credentials.clone(), config.request_timeout())?;
        let api: Arc<dyn FileStoreApi> = Arc::new(client);

        let (notifier, notices) = notify::channel();
        let files = FileListView::new(Arc::clone(&api), notifier.clone());
        let coordinator = MutationCoordinator::new(Arc::clone(&api), files.clone(), notifier.clone());
        let session = SessionController::new(api, credentials, files.clone(), notifier.clone());

        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let login_username = config.last_username.clone().unwrap_or_default();
        let login_focus = if login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };

        Ok(Self {
            config,
            session,
            files,
            coordinator,
            notifier,
            notices,

            state: AppState::Normal,
            form: AnonymousForm::Login,

            login_username,
            login_password: String::new(),
            login_focus,
            login_error: None,
            login_pending: false,

            register: RegisterForm::default(),
            register_pending: false,

            prompt: None,
            prompt_input: String::new(),

            task_rx,
            task_tx,
            tasks_in_flight: 0,

            status: None,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    // =========================================================================
    // Anonymous region
    // =========================================================================

    pub fn toggle_form(&mut self) {
        self.form = match self.form {
            AnonymousForm::Login => AnonymousForm::Register,
            AnonymousForm::Register => AnonymousForm::Login,
        };
        self.login_error = None;
        self.register.error = None;
    }

    /// Start a login with the credentials from the login form.
    ///
    /// Empty fields are rejected here; otherwise the request runs on a
    /// spawned task and `check_background_tasks` applies the result.
    pub fn attempt_login(&mut self) {
        if self.login_pending {
            return;
        }
        self.login_error = None;
        if let Err(e) = validate_credentials(&self.login_username, &self.login_password) {
            self.login_error = Some(e.to_string());
            return;
        }

        let session = self.session.clone();
        let username = self.login_username.clone();
        let password = self.login_password.clone();
        let tx = self.task_tx.clone();
        self.login_pending = true;
        self.tasks_in_flight += 1;

        tokio::spawn(async move {
            // On success the session loads the file list itself
            let result = match session.login(&username, &password).await {
                Ok(()) => TaskResult::LoggedIn { username },
                Err(e) => TaskResult::LoginFailed(session_error_text(e, "Login failed")),
            };
            Self::send_result(&tx, result).await;
        });
    }

    /// Submit the register form in the background. On success the login
    /// form is shown with the new username filled in.
    pub fn attempt_register(&mut self) {
        if self.register_pending {
            return;
        }
        self.register.error = None;
        let values = self.register.values.clone();
        if let Err(e) = validate_credentials(&values.username, &values.password) {
            self.register.error = Some(e.to_string());
            return;
        }

        let session = self.session.clone();
        let tx = self.task_tx.clone();
        self.register_pending = true;
        self.tasks_in_flight += 1;

        tokio::spawn(async move {
            let result = match session.register(&values).await {
                Ok(()) => TaskResult::Registered {
                    username: values.username,
                },
                Err(e) => TaskResult::RegisterFailed(session_error_text(e, "Registration failed")),
            };
            Self::send_result(&tx, result).await;
        });
    }

    fn finish_login(&mut self, username: String) {
        self.login_password.clear();
        self.state = AppState::Normal;
        self.config.last_username = Some(username);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    fn finish_register(&mut self, username: String) {
        self.login_username = username;
        self.login_password.clear();
        self.login_focus = LoginFocus::Password;
        self.login_error = None;
        self.register = RegisterForm::default();
        self.form = AnonymousForm::Login;
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.prompt = None;
        self.prompt_input.clear();
        self.state = AppState::Normal;
        self.form = AnonymousForm::Login;
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
    }

    // =========================================================================
    // Prompts
    // =========================================================================

    /// Open the overlay that collects input for `kind` on the selected row.
    /// Download needs no input and runs immediately.
    pub fn start_action(&mut self, kind: ActionKind) {
        let Some(row) = self.files.selected() else {
            return;
        };
        let Some(action) = row.action(kind).cloned() else {
            return;
        };

        match kind {
            ActionKind::Download => self.dispatch_background(action, ActionInput::None),
            ActionKind::Delete => self.open_prompt(Prompt::ConfirmDelete(action), String::new()),
            ActionKind::Rename => {
                let current = action.file_name.clone();
                self.open_prompt(Prompt::NewName(action), current);
            }
            ActionKind::Modify => self.open_prompt(Prompt::ReplacementPath(action), String::new()),
        }
    }

    pub fn start_upload(&mut self) {
        self.open_prompt(Prompt::UploadPath, String::new());
    }

    fn open_prompt(&mut self, prompt: Prompt, initial: String) {
        self.prompt = Some(prompt);
        self.prompt_input = initial;
        self.state = AppState::Prompting;
    }

    pub fn push_prompt_char(&mut self, c: char) {
        if can_add_char(self.prompt_input.chars().count(), MAX_PROMPT_LENGTH, c) {
            self.prompt_input.push(c);
        }
    }

    /// Close the overlay without running anything.
    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
        self.prompt_input.clear();
        self.state = AppState::Normal;
    }

    /// Close the overlay and run its action with the collected input.
    pub fn submit_prompt(&mut self, confirmed: bool) {
        let Some(prompt) = self.prompt.take() else {
            self.state = AppState::Normal;
            return;
        };
        let input = std::mem::take(&mut self.prompt_input);
        self.state = AppState::Normal;

        match prompt {
            Prompt::ConfirmDelete(action) => {
                let confirmation = Confirmation::from(confirmed);
                self.dispatch_background(action, ActionInput::Confirmation(confirmation));
            }
            Prompt::NewName(action) => {
                self.dispatch_background(action, ActionInput::NewName(input));
            }
            Prompt::ReplacementPath(action) => self.modify_background(action, input),
            Prompt::UploadPath => self.upload_background(input),
        }
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Reload the file list in the background
    pub fn refresh_background(&mut self) {
        let files = self.files.clone();
        let tx = self.task_tx.clone();
        self.tasks_in_flight += 1;

        tokio::spawn(async move {
            let ok = files.refresh().await;
            Self::send_result(&tx, TaskResult::Refreshed(ok)).await;
        });
    }

    fn dispatch_background(&mut self, action: RowAction, input: ActionInput) {
        let coordinator = self.coordinator.clone();
        let notifier = self.notifier.clone();
        let download_dir = self.config.download_dir();
        let tx = self.task_tx.clone();
        self.tasks_in_flight += 1;

        tokio::spawn(async move {
            let label = action.kind.label();
            let outcome = coordinator.dispatch(&action, input).await;
            let success = match outcome {
                ActionOutcome::Downloaded {
                    file_name,
                    contents,
                } => Self::save_download(&notifier, download_dir, &file_name, contents).await,
                other => other.is_success(),
            };
            Self::send_result(&tx, TaskResult::Finished { label, success }).await;
        });
    }

    fn upload_background(&mut self, path_input: String) {
        let coordinator = self.coordinator.clone();
        let notifier = self.notifier.clone();
        let tx = self.task_tx.clone();
        self.tasks_in_flight += 1;

        tokio::spawn(async move {
            let success = match Self::read_local(&notifier, &path_input).await {
                Some(file) => coordinator.upload(&file).await.is_success(),
                None => false,
            };
            Self::send_result(&tx, TaskResult::Finished { label: "Upload", success }).await;
        });
    }

    fn modify_background(&mut self, action: RowAction, path_input: String) {
        let coordinator = self.coordinator.clone();
        let notifier = self.notifier.clone();
        let tx = self.task_tx.clone();
        self.tasks_in_flight += 1;

        tokio::spawn(async move {
            let label = action.kind.label();
            let success = match Self::read_local(&notifier, &path_input).await {
                Some(file) => coordinator
                    .dispatch(&action, ActionInput::Replacement(file))
                    .await
                    .is_success(),
                None => false,
            };
            Self::send_result(&tx, TaskResult::Finished { label, success }).await;
        });
    }

    async fn read_local(notifier: &Notifier, path_input: &str) -> Option<UploadFile> {
        let trimmed = path_input.trim();
        if trimmed.is_empty() {
            debug!("Empty path, nothing to send");
            return None;
        }
        let path = expand_path(trimmed);
        match UploadFile::from_path(&path).await {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read local file");
                notifier.error(format!("Could not read {}", path.display()));
                None
            }
        }
    }

    async fn save_download(
        notifier: &Notifier,
        dir: PathBuf,
        file_name: &str,
        contents: Vec<u8>,
    ) -> bool {
        let target = download_target(&dir, file_name);
        match tokio::fs::write(&target, &contents).await {
            Ok(()) => {
                info!(path = %target.display(), bytes = contents.len(), "Download saved");
                notifier.success(format!(
                    "Saved {} ({})",
                    target.display(),
                    format_size(contents.len() as u64)
                ));
                true
            }
            Err(e) => {
                warn!(path = %target.display(), error = %e, "Failed to save download");
                notifier.error(format!("Could not save {}", target.display()));
                false
            }
        }
    }

    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if tx.send(result).await.is_err() {
            debug!("Task result dropped - app is shutting down");
        }
    }

    /// Check for completed background tasks and new notices
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.tasks_in_flight = self.tasks_in_flight.saturating_sub(1);
            match result {
                TaskResult::Refreshed(ok) => debug!(ok, "Refresh task finished"),
                TaskResult::Finished { label, success } => {
                    debug!(action = label, success, "Action task finished")
                }
                TaskResult::LoggedIn { username } => {
                    self.login_pending = false;
                    self.finish_login(username);
                }
                TaskResult::LoginFailed(message) => {
                    self.login_pending = false;
                    self.login_error = Some(message);
                }
                TaskResult::Registered { username } => {
                    self.register_pending = false;
                    self.finish_register(username);
                }
                TaskResult::RegisterFailed(message) => {
                    self.register_pending = false;
                    self.register.error = Some(message);
                }
            }
        }

        if let Some(latest) = notify::drain(&mut self.notices).pop() {
            self.status = Some(latest);
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

fn can_add_char(current_len: usize, max_len: usize, c: char) -> bool {
    current_len < max_len && is_valid_input_char(c)
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    can_add_char(current_len, MAX_USERNAME_LENGTH, c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    can_add_char(current_len, MAX_PASSWORD_LENGTH, c)
}

// ============================================================================
// Tests
// ============================================================================
