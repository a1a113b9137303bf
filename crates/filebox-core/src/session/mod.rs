//! Anonymous/authenticated session state.

pub mod controller;

pub use controller::{SessionController, SessionError, ViewState};
