//! GitHub authentication

use crate::auth::AuthSource;
use crate::error::{Error, Result};
use std::env;
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
const TOKEN_VARS: [&str; 3] = ["GH_TOKEN_DATA", "GITHUB_TOKEN", "GH_TOKEN"];

/// GitHub authentication configuration
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token was obtained from
    pub source: AuthSource,
}

/// Get GitHub authentication for the data repository
///
/// Priority:
/// 1. `GH_TOKEN_DATA` environment variable
/// 2. `GITHUB_TOKEN` environment variable
/// 3. `GH_TOKEN` environment variable
/// 4. gh CLI (`gh auth token`)
pub async fn get_github_auth() -> Result<GitHubAuthConfig> {
    for var in TOKEN_VARS {
        if let Ok(token) = env::var(var) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                debug!(var, "using GitHub token from environment");
                return Ok(GitHubAuthConfig {
                    token,
                    source: AuthSource::EnvVar,
                });
            }
        }
    }

    if let Some(token) = get_gh_cli_token().await {
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::Cli,
        });
    }

    Err(Error::Auth(
        "No GitHub token found. Set GH_TOKEN_DATA or run `gh auth login`".to_string(),
    ))
}

async fn get_gh_cli_token() -> Option<String> {
    // Check authenticated
    let status = Command::new("gh")
        .args(["auth", "status"])
        .output()
        .await
        .ok()?;

    if !status.status.success() {
        return None;
    }

    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() { None } else { Some(token) }
}

/// Test GitHub authentication against the given API root
///
/// Returns the login of the token's user.
pub async fn test_github_auth(config: &GitHubAuthConfig, api_url: &str) -> Result<String> {
    let octocrab = octocrab::Octocrab::builder()
        .personal_token(config.token.clone())
        .base_uri(api_url)
        .map_err(|e| Error::GitHubApi(e.to_string()))?
        .build()
        .map_err(|e| Error::GitHubApi(e.to_string()))?;

    let user = octocrab
        .current()
        .user()
        .await
        .map_err(|e| Error::Auth(format!("Invalid token: {e}")))?;

    Ok(user.login)
}
