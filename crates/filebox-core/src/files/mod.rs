//! The file list and the write operations that keep it current.
//!
//! `FileListView` holds the rows rendered from the last `list_files`
//! response; `MutationCoordinator` runs uploads, renames, modifications and
//! deletions and refreshes the view after each success.

pub mod actions;
pub mod coordinator;
pub mod view;

pub use actions::{
    validate_credentials, validate_new_name, ActionInput, ActionKind, ActionOutcome,
    Confirmation, RowAction, ValidationError,
};
pub use coordinator::MutationCoordinator;
pub use view::{FileListView, FileRow};
