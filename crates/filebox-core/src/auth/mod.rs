//! Authentication module for the session token.
//!
//! This module provides:
//! - `CredentialStore`: the single owner of the bearer token, with an
//!   explicit persistence scope (`TokenPersistence`)
//! - `claims`: best-effort display-name extraction from the token
//!
//! Durable scopes keep the token in `session.json` under the cache directory
//! or in the OS keychain. No expiry is tracked locally.

pub mod claims;
pub mod credentials;
pub mod session;
pub mod store;

pub use claims::{display_name, ClaimsError};
pub use store::{CredentialStore, TokenPersistence};
