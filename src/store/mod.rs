//! Content store services
//!
//! The gateway persists documents in a Git-hosted repository. This module
//! abstracts the REST operations the change pipeline and the read routes need.

mod detection;
mod factory;
mod github;

pub use detection::{parse_repo_spec, RepoSpec};
pub use factory::create_content_store;
pub use github::GitHubStore;

use crate::error::Result;
use crate::types::{
    CreateBranch, DirEntry, MergeOutcome, PullRequest, PutFile, RepoFile, StoreConfig,
    WriteHandle,
};
use async_trait::async_trait;
use serde_json::Value;

/// Content store trait for branch, file and pull request operations
///
/// Every method makes a single attempt. Non-success responses come back as
/// [`crate::error::Error::Remote`] with status and body intact, so callers can
/// wrap them into the stage-specific error kinds.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Resolve a branch to its head commit sha (`None` if the branch is missing)
    async fn branch_head(&self, branch: &str) -> Result<Option<String>>;

    /// Create `branch` pointing at `sha`
    async fn create_branch(&self, branch: &str, sha: &str) -> Result<CreateBranch>;

    /// Fetch a file on a branch (`None` if it does not exist)
    async fn get_file(&self, branch: &str, path: &str) -> Result<Option<RepoFile>>;

    /// Create or update a file; `request.sha` turns the write into a compare-and-swap
    async fn put_file(&self, request: &PutFile) -> Result<WriteHandle>;

    /// Delete a file whose current blob sha is `sha`
    async fn delete_file(&self, branch: &str, path: &str, sha: &str, message: &str)
    -> Result<String>;

    /// List a directory on a branch (empty if it does not exist)
    async fn list_dir(&self, branch: &str, path: &str) -> Result<Vec<DirEntry>>;

    /// Find an existing open PR whose head is `owner:head_branch`
    async fn find_open_pr(&self, head_branch: &str) -> Result<Option<PullRequest>>;

    /// Create a new PR
    async fn create_pr(&self, head: &str, base: &str, title: &str, body: &str)
    -> Result<PullRequest>;

    /// Merge an open PR
    async fn merge_pr(&self, pr_number: u64) -> Result<MergeOutcome>;

    /// Merge `head` into `base` without a PR
    async fn merge_branch(&self, base: &str, head: &str, message: &str) -> Result<MergeOutcome>;

    /// Read a JSON document through the raw content endpoint (`None` if missing)
    async fn read_raw(&self, branch: &str, path: &str) -> Result<Option<Value>>;

    /// Get the store configuration
    fn config(&self) -> &StoreConfig;
}
