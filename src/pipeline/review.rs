//! Pull request step: open or reuse, and merge

use crate::error::{Error, Result};
use crate::store::ContentStore;
use crate::types::{MergeOutcome, PullRequest};
use serde::Serialize;
use tracing::{debug, info};

/// Pull request attached to a change branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRequest {
    /// The pull request
    pub pull_request: PullRequest,
    /// Whether an already open PR was reused
    pub reused: bool,
}

/// Return the open PR for `branch`, creating one against `base` if none exists
///
/// At most one PR is open per branch: repeating the call reuses it.
pub async fn open_or_reuse_review_request(
    store: &dyn ContentStore,
    branch: &str,
    base: &str,
    title: &str,
    body: &str,
) -> Result<ReviewRequest> {
    let existing = store
        .find_open_pr(branch)
        .await
        .map_err(Error::review_request_failed)?;

    if let Some(pull_request) = existing {
        debug!(branch, number = pull_request.number, "reusing open pull request");
        return Ok(ReviewRequest {
            pull_request,
            reused: true,
        });
    }

    let pull_request = store
        .create_pr(branch, base, title, body)
        .await
        .map_err(Error::review_request_failed)?;

    info!(branch, base, number = pull_request.number, "opened pull request");
    Ok(ReviewRequest {
        pull_request,
        reused: false,
    })
}

/// Merge `branch` into `base`
///
/// An open PR for the branch is merged through the PR; a PR the store refuses
/// to merge (405, e.g. already merged) reports `merged = false`. Without an
/// open PR the branch head is merged directly. Merging the base into itself
/// is refused before any store call.
pub async fn merge_review_request(
    store: &dyn ContentStore,
    branch: &str,
    base: &str,
) -> Result<MergeOutcome> {
    if branch == base {
        return Err(Error::ValidationFailed(format!(
            "cannot merge {branch:?} into itself"
        )));
    }

    let open = store
        .find_open_pr(branch)
        .await
        .map_err(Error::merge_failed)?;

    let outcome = match open {
        Some(pr) if pr.base_ref == base => match store.merge_pr(pr.number).await {
            Ok(outcome) => outcome,
            Err(e) if e.remote_status() == Some(405) => {
                debug!(branch, number = pr.number, "pull request not mergeable");
                MergeOutcome {
                    merged: false,
                    commit_sha: None,
                }
            }
            Err(e) => return Err(Error::merge_failed(e)),
        },
        _ => {
            let message = format!("Merge {branch} into {base}");
            store
                .merge_branch(base, branch, &message)
                .await
                .map_err(Error::merge_failed)?
        }
    };

    info!(branch, base, merged = outcome.merged, "merge finished");
    Ok(outcome)
}
