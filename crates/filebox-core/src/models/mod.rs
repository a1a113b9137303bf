//! Data models exchanged with the file store backend.
//!
//! - `Registration`, `LoginRequest`, `LoginResponse`: account flows
//! - `FileListResponse`, `MessageResponse`, `RenameRequest`: file operations
//! - `UploadFile`: local content sent by upload and modify

pub mod account;
pub mod file;

pub use account::{LoginRequest, LoginResponse, Registration};
pub use file::{FileListResponse, MessageResponse, RenameRequest, UploadFile};
