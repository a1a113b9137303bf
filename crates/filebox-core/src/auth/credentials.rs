use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "filebox";

/// Keychain account under which the session token is kept
const TOKEN_ACCOUNT: &str = "session-token";

/// Session token storage in the OS keychain.
pub struct KeychainToken;

impl KeychainToken {
    /// Store the token in the OS keychain
    pub fn store(token: &str) -> Result<()> {
        let entry = Self::entry()?;
        entry
            .set_password(token)
            .context("Failed to store token in keychain")?;
        Ok(())
    }

    /// Retrieve the stored token, `None` when the keychain has no entry
    pub fn load() -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    /// Delete the stored token. A missing entry is not an error.
    pub fn delete() -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }

    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, TOKEN_ACCOUNT).context("Failed to create keyring entry")
    }
}
