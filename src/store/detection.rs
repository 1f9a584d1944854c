//! Data repository coordinates from configuration strings

use crate::error::{Error, Result};
use regex::Regex;

/// Repository coordinates parsed from a `DATA_REPO` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    /// Owner, if the value carried one
    pub owner: Option<String>,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

impl RepoSpec {
    /// REST API root for this repository's host
    pub fn api_url(&self) -> Option<String> {
        self.host.as_ref().map(|h| format!("https://{h}/api/v3"))
    }

    /// Raw content root for this repository's host
    pub fn raw_url(&self) -> Option<String> {
        self.host.as_ref().map(|h| format!("https://{h}/raw"))
    }
}

/// Parse `repo`, `owner/repo`, an HTTPS URL or an SSH remote into a [`RepoSpec`]
pub fn parse_repo_spec(value: &str) -> Result<RepoSpec> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Config("data repository is empty".to_string()));
    }

    // SSH format: git@host:owner/repo.git
    let re_ssh = Regex::new(r"^git@([^:]+):(.+?)(?:\.git)?/?$").expect("valid regex");

    let (hostname, path) = if let Some(c) = re_ssh.captures(value) {
        (Some(c[1].to_string()), c[2].to_string())
    } else if value.starts_with("https://") || value.starts_with("http://") {
        let url = url::Url::parse(value)
            .map_err(|e| Error::Parse(format!("invalid repository URL {value}: {e}")))?;
        let path = url.path().trim_matches('/').trim_end_matches(".git");
        (url.host_str().map(ToString::to_string), path.to_string())
    } else {
        (None, value.trim_end_matches(".git").to_string())
    };

    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    let (owner, repo) = match parts.as_slice() {
        [repo] if hostname.is_none() => (None, (*repo).to_string()),
        [owner, repo] => (Some((*owner).to_string()), (*repo).to_string()),
        _ => return Err(Error::Parse(format!("invalid repository: {value}"))),
    };

    let host = hostname.filter(|h| h != "github.com");

    Ok(RepoSpec { owner, repo, host })
}
