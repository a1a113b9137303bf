//! Utility functions for formatting and local paths.

pub mod format;
pub mod path;

pub use format::{format_notice_time, format_size, truncate_string};
pub use path::{download_target, expand_path};
