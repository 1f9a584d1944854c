//! Content store factory
//!
//! Creates the content store from configuration.

use crate::auth::get_github_auth;
use crate::error::Result;
use crate::store::{ContentStore, GitHubStore};
use crate::types::StoreConfig;
use std::sync::Arc;
use tracing::info;

/// Create a content store from configuration
///
/// Resolves the GitHub token and builds the REST client.
pub async fn create_content_store(config: &StoreConfig) -> Result<Arc<dyn ContentStore>> {
    let auth = get_github_auth().await?;
    info!(
        owner = %config.owner,
        repo = %config.repo,
        base = %config.base_branch,
        source = ?auth.source,
        "content store configured"
    );
    Ok(Arc::new(GitHubStore::new(auth.token, config.clone())))
}
