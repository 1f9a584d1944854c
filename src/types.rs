//! Core types for oscal-gateway

use serde::{Deserialize, Serialize};

/// A pull request (the review thread for a change branch)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// PR title
    pub title: String,
}

/// A file as currently stored on a branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    /// Repository-relative path
    pub path: String,
    /// Blob sha, used for compare-and-swap writes
    pub sha: String,
    /// Decoded file content
    pub content: String,
}

/// Request to create or update one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutFile {
    /// Target branch
    pub branch: String,
    /// Repository-relative path
    pub path: String,
    /// Raw file content (encoded for transport by the store)
    pub content: String,
    /// Commit message
    pub message: String,
    /// Expected current blob sha; `None` creates a new file
    pub sha: Option<String>,
}

/// Result of a successful file write or delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteHandle {
    /// Repository-relative path
    pub path: String,
    /// New blob sha (`None` when the file was deleted)
    pub blob_sha: Option<String>,
    /// Sha of the commit that carries the change
    pub commit_sha: String,
}

/// Outcome of asking the store to create a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateBranch {
    /// Branch was created
    Created,
    /// A branch with this name already existed
    AlreadyExists,
}

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Dir,
    /// Anything else (symlink, submodule)
    #[serde(other)]
    Other,
}

/// An entry of a repository directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (last path component)
    pub name: String,
    /// Entry kind
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Outcome of a merge request against the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// Whether this call produced a new merge
    pub merged: bool,
    /// Merge commit sha, when one was created
    pub commit_sha: Option<String>,
}

/// Content store coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Base branch all changes are proposed against
    pub base_branch: String,
    /// REST API root, e.g. `https://api.github.com`
    pub api_url: String,
    /// Raw content root, e.g. `https://raw.githubusercontent.com`
    pub raw_url: String,
}

impl StoreConfig {
    /// Raw URL of a file on a branch
    ///
    /// Uses the `refs/heads/` form so branch names containing `/` stay
    /// unambiguous.
    pub fn raw_file_url(&self, branch: &str, path: &str) -> String {
        format!(
            "{}/{}/{}/refs/heads/{branch}/{path}",
            self.raw_url.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}
