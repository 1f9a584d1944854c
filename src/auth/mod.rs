//! Authentication for the data repository and for API callers
//!
//! The gateway needs a GitHub token with contents and pull-request write
//! access to the data repository. Callers of write routes authenticate with a
//! shared API key.

mod api_key;
mod github;

pub use api_key::{check_api_key, API_KEY_HEADER};
pub use github::{get_github_auth, test_github_auth, GitHubAuthConfig};

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from CLI tool (gh)
    Cli,
    /// Token from environment variable
    EnvVar,
}
