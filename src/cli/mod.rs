//! CLI commands
//!
//! Command implementations for the `oscal-gateway` binary.

mod auth;
mod serve;
mod style;

pub use auth::{run_auth_setup, run_auth_test};
pub use serve::run_serve;
