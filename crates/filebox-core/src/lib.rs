//! Core library for filebox.
//!
//! This crate holds the session-and-operation orchestration layer for a
//! per-user remote file store:
//!
//! - `auth`: the `CredentialStore` owning the bearer token, plus best-effort
//!   claim decoding for the display name
//! - `api`: the `FileStoreApi` gateway trait and its HTTP `ApiClient`
//! - `files`: the `FileListView` (authoritative file list, row actions) and
//!   the `MutationCoordinator` (write operations followed by a full refresh)
//! - `session`: the `SessionController` anonymous/authenticated state machine
//! - `notify`: user-facing notices raised by every operation
//! - `config`: persisted client configuration
//!
//! Front-ends wire these together once at startup and drive them from user
//! input; every remote failure is converted into a `Notice` at its call site.

pub mod api;
pub mod auth;
pub mod config;
pub mod files;
pub mod models;
pub mod notify;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, FileStoreApi};
pub use auth::{CredentialStore, TokenPersistence};
pub use config::Config;
pub use files::{FileListView, MutationCoordinator};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use session::{SessionController, ViewState};
