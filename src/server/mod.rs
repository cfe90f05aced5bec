//! Server setup: configuration, state, and initialization.

pub mod config;
pub mod init;
pub mod state;

pub use init::{create_app, create_app_with_pool};
pub use state::AppState;
