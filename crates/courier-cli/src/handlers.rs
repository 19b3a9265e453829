//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod auth;
mod completions;
mod config;
mod request;
mod upload;
mod utils;

pub use auth::{handle_login, handle_logout, handle_status};
pub use completions::handle_completions;
pub use config::handle_config;
pub use request::handle_request;
pub use upload::handle_upload;
