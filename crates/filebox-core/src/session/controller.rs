use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, FileStoreApi};
use crate::auth::{display_name, CredentialStore};
use crate::files::{validate_credentials, FileListView, ValidationError};
use crate::models::Registration;
use crate::notify::Notifier;

const LOGIN_SUCCEEDED: &str = "Login successful!";
const LOGIN_FALLBACK: &str = "Unable to log in";
const REGISTERED: &str = "Registration successful! Please log in.";
const REGISTER_FALLBACK: &str = "An error occurred. Please try again later.";
const LOGGED_OUT: &str = "Logged out.";

/// Which top-level region the front-end shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    /// Register and login forms.
    #[default]
    Anonymous,
    /// File list and actions.
    Authenticated,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Default)]
struct SessionState {
    view: ViewState,
    display_name: Option<String>,
}

/// Owns the anonymous/authenticated transition.
///
/// Starts `Anonymous` regardless of any token a previous run persisted.
/// Only a successful `login` enters `Authenticated` and only `logout`
/// leaves it; a token the backend later rejects shows up as failing
/// operations, not as a state change.
///
/// Clone is cheap and every clone shares the state, so a login can run on
/// a spawned task while the front-end keeps reading `state()`.
#[derive(Clone)]
pub struct SessionController {
    api: Arc<dyn FileStoreApi>,
    credentials: CredentialStore,
    files: FileListView,
    notifier: Notifier,
    state: Arc<Mutex<SessionState>>,
}

impl SessionController {
    pub fn new(
        api: Arc<dyn FileStoreApi>,
        credentials: CredentialStore,
        files: FileListView,
        notifier: Notifier,
    ) -> Self {
        Self {
            api,
            credentials,
            files,
            notifier,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    pub fn state(&self) -> ViewState {
        self.state.lock().view
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == ViewState::Authenticated
    }

    /// `preferred_username` from the login token, when it could be decoded.
    pub fn display_name(&self) -> Option<String> {
        self.state.lock().display_name.clone()
    }

    /// Create an account. The state never changes; the user logs in
    /// separately afterwards.
    pub async fn register(&self, registration: &Registration) -> Result<(), SessionError> {
        validate_credentials(&registration.username, &registration.password)?;

        match self.api.register(registration).await {
            Ok(()) => {
                info!(username = %registration.username, "Registered");
                self.notifier.success(REGISTERED);
                Ok(())
            }
            Err(e) => {
                warn!(username = %registration.username, error = %e, "Registration failed");
                let message = match &e {
                    ApiError::Unauthorized { message: Some(m), .. }
                    | ApiError::Remote { message: Some(m), .. } => {
                        format!("Registration failed: {}", m)
                    }
                    _ => e.user_message(REGISTER_FALLBACK),
                };
                self.notifier.error(message);
                Err(e.into())
            }
        }
    }

    /// Exchange credentials for a token and enter `Authenticated`.
    ///
    /// On success the token is stored, the display name is read from its
    /// claims, the state switches and the file list is loaded, in that
    /// order. On failure the store and state are left as they were.
    /// The username is sent exactly as given.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), SessionError> {
        validate_credentials(username, password)?;

        let token = match self.api.login(username, password).await {
            Ok(token) => token,
            Err(e) => {
                warn!(username, error = %e, "Login failed");
                self.notifier
                    .error(format!("Login failed: {}", e.user_message(LOGIN_FALLBACK)));
                return Err(e.into());
            }
        };

        if let Err(e) = self.credentials.set_token(token.as_str()) {
            warn!(
                error = %e,
                persistence = %self.credentials.persistence(),
                "Failed to persist session token, keeping it for this run only"
            );
        }

        let name = match display_name(&token) {
            Ok(name) => Some(name),
            Err(e) => {
                debug!(error = %e, "Token claims carry no usable display name");
                None
            }
        };

        {
            let mut state = self.state.lock();
            state.display_name = name;
            state.view = ViewState::Authenticated;
        }
        info!(username, "Logged in");
        self.notifier.success(LOGIN_SUCCEEDED);

        self.files.refresh().await;
        Ok(())
    }

    /// Forget the token and return to `Anonymous`. Purely local.
    pub fn logout(&self) {
        if let Err(e) = self.credentials.clear() {
            warn!(error = %e, "Failed to remove persisted session token");
        }
        *self.state.lock() = SessionState::default();
        info!("Logged out");
        self.notifier.info(LOGGED_OUT);
    }
}
