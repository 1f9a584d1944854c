//! Change execution
//!
//! Runs a [`ChangePlan`]: provision the branch, write the files, open or reuse
//! the pull request.

use crate::error::Error;
use crate::pipeline::branch::ensure_branch;
use crate::pipeline::plan::ChangePlan;
use crate::pipeline::progress::{Phase, ProgressCallback};
use crate::pipeline::publish::put_documents;
use crate::pipeline::review::{open_or_reuse_review_request, ReviewRequest};
use crate::store::ContentStore;
use crate::types::WriteHandle;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Pipeline stage a change failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Caller input rejected before any remote call
    Validate,
    /// Branch provisioning
    Branch,
    /// File writes
    Write,
    /// Pull request step
    Review,
}

impl Stage {
    /// Lowercase name used in responses
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Branch => "branch",
            Self::Write => "write",
            Self::Review => "review",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change that stopped before anything reviewable existed
#[derive(Debug, Error)]
#[error("{stage} stage failed: {error}")]
pub struct Failure {
    /// Stage that failed
    pub stage: Stage,
    /// Underlying error
    #[source]
    pub error: Error,
}

impl Failure {
    /// Failure in `stage`
    pub const fn new(stage: Stage, error: Error) -> Self {
        Self { stage, error }
    }

    /// Input rejected before any remote call
    pub const fn validation(error: Error) -> Self {
        Self::new(Stage::Validate, error)
    }
}

/// Result of a change that got at least its files committed
#[derive(Debug)]
pub enum ChangeOutcome {
    /// Files committed and a pull request is open
    Proposed {
        /// Branch carrying the change
        branch: String,
        /// Files written
        files: Vec<WriteHandle>,
        /// Pull request (created or reused)
        review: ReviewRequest,
    },
    /// Files committed but the pull request step failed
    Persisted {
        /// Branch carrying the change
        branch: String,
        /// Files written
        files: Vec<WriteHandle>,
        /// Why no pull request is attached
        advisory: Error,
    },
}

impl ChangeOutcome {
    /// Branch carrying the change
    pub fn branch(&self) -> &str {
        match self {
            Self::Proposed { branch, .. } | Self::Persisted { branch, .. } => branch,
        }
    }

    /// Files written
    pub fn files(&self) -> &[WriteHandle] {
        match self {
            Self::Proposed { files, .. } | Self::Persisted { files, .. } => files,
        }
    }

    /// Pull request, when the change got one
    pub const fn review(&self) -> Option<&ReviewRequest> {
        match self {
            Self::Proposed { review, .. } => Some(review),
            Self::Persisted { .. } => None,
        }
    }
}

/// Execute a change plan
///
/// 1. Ensure the branch exists at the base head
/// 2. Write every file in order, stopping at the first failure
/// 3. Open or reuse the pull request; a failure here still reports the
///    committed files
pub async fn execute_change(
    store: &dyn ContentStore,
    plan: &ChangePlan,
    progress: &dyn ProgressCallback,
) -> Result<ChangeOutcome, Failure> {
    if plan.changes.is_empty() {
        return Err(Failure::validation(Error::ValidationFailed(
            "change has no files".to_string(),
        )));
    }

    progress.on_phase(Phase::ProvisioningBranch).await;
    let branch = ensure_branch(store, &plan.base, &plan.branch)
        .await
        .map_err(|e| match e {
            Error::ValidationFailed(_) => Failure::validation(e),
            e => Failure::new(Stage::Branch, e),
        })?;
    progress.on_branch_ready(&branch).await;

    progress.on_phase(Phase::WritingFiles).await;
    let files = put_documents(store, &branch, &plan.changes, progress)
        .await
        .map_err(|e| Failure::new(Stage::Write, e))?;

    progress.on_phase(Phase::OpeningReview).await;
    let outcome =
        match open_or_reuse_review_request(store, &branch, &plan.base, &plan.title, &plan.body)
            .await
        {
            Ok(review) => {
                progress.on_review(&review.pull_request, review.reused).await;
                info!(
                    flow = plan.flow,
                    %branch,
                    files = files.len(),
                    number = review.pull_request.number,
                    "change proposed"
                );
                ChangeOutcome::Proposed {
                    branch,
                    files,
                    review,
                }
            }
            Err(advisory) => {
                progress.on_error(&advisory).await;
                warn!(flow = plan.flow, %branch, "change committed without review request");
                ChangeOutcome::Persisted {
                    branch,
                    files,
                    advisory,
                }
            }
        };

    progress.on_phase(Phase::Complete).await;
    Ok(outcome)
}
