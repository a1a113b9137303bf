//! API gateway for the file store backend.
//!
//! `FileStoreApi` is the seam every other component calls through;
//! `ApiClient` implements it over HTTP with reqwest.
//!
//! Authorized calls carry the session token as a bearer credential, read
//! from the `CredentialStore` at the moment each request is built.

pub mod client;
pub mod error;
pub mod gateway;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use gateway::FileStoreApi;
