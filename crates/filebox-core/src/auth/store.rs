//! The credential store: sole owner of the session token.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::credentials::KeychainToken;
use super::session::{SessionData, SessionFile};

/// Where the session token lives between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPersistence {
    /// Transient; lost when the process exits.
    Memory,
    /// `session.json` in the cache directory. Survives restarts.
    #[default]
    File,
    /// OS keychain entry. Survives restarts.
    Keychain,
}

impl fmt::Display for TokenPersistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenPersistence::Memory => write!(f, "memory"),
            TokenPersistence::File => write!(f, "file"),
            TokenPersistence::Keychain => write!(f, "keychain"),
        }
    }
}

enum Backing {
    Memory,
    File(SessionFile),
    Keychain,
}

struct Inner {
    token: RwLock<Option<String>>,
    backing: Backing,
}

/// Owned handle to the current session token.
///
/// Clone is cheap and every clone sees the same token. The API gateway
/// reads the token on each request, so a logout is visible to calls that
/// are built after it even if they were triggered earlier.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<Inner>,
}

impl CredentialStore {
    /// A store with transient scope and no token.
    pub fn in_memory() -> Self {
        Self::with_backing(Backing::Memory, None)
    }

    /// Open a store with the given persistence scope, loading any token a
    /// previous run left behind. Load failures are logged and leave the
    /// store empty.
    pub fn open(persistence: TokenPersistence, cache_dir: &Path) -> Self {
        let (backing, loaded) = match persistence {
            TokenPersistence::Memory => (Backing::Memory, Ok(None)),
            TokenPersistence::File => {
                let file = SessionFile::new(cache_dir);
                let loaded = file.load().map(|data| data.map(|d| d.token));
                (Backing::File(file), loaded)
            }
            TokenPersistence::Keychain => (Backing::Keychain, KeychainToken::load()),
        };

        let token = match loaded {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, %persistence, "Failed to load persisted token, starting empty");
                None
            }
        };
        debug!(%persistence, has_token = token.is_some(), "Credential store opened");
        Self::with_backing(backing, token)
    }

    fn with_backing(backing: Backing, token: Option<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                token: RwLock::new(token),
                backing,
            }),
        }
    }

    pub fn persistence(&self) -> TokenPersistence {
        match self.inner.backing {
            Backing::Memory => TokenPersistence::Memory,
            Backing::File(_) => TokenPersistence::File,
            Backing::Keychain => TokenPersistence::Keychain,
        }
    }

    /// Current token, read fresh on every call.
    pub fn token(&self) -> Option<String> {
        self.inner.token.read().clone()
    }

    pub fn has_token(&self) -> bool {
        self.inner.token.read().is_some()
    }

    /// Replace the token. The in-memory value is always updated; the error
    /// only reports a failure to persist it.
    pub fn set_token(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        *self.inner.token.write() = Some(token.clone());

        match &self.inner.backing {
            Backing::Memory => Ok(()),
            Backing::File(file) => file.save(&SessionData::new(token)),
            Backing::Keychain => KeychainToken::store(&token),
        }
    }

    /// Drop the token. Like `set_token`, memory is cleared even when the
    /// persisted copy cannot be removed.
    pub fn clear(&self) -> Result<()> {
        *self.inner.token.write() = None;

        match &self.inner.backing {
            Backing::Memory => Ok(()),
            Backing::File(file) => file.clear(),
            Backing::Keychain => KeychainToken::delete(),
        }
    }
}
