//! Progress callback trait for interface-agnostic updates
//!
//! This trait lets the HTTP server (or a test) observe a change while it moves
//! through the pipeline.

use crate::error::Error;
use crate::types::PullRequest;
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, info, warn};

/// Pipeline phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Creating or reusing the change branch
    ProvisioningBranch,
    /// Writing files onto the branch
    WritingFiles,
    /// Opening or reusing the pull request
    OpeningReview,
    /// Change complete
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ProvisioningBranch => "Provisioning branch",
            Self::WritingFiles => "Writing files",
            Self::OpeningReview => "Opening review request",
            Self::Complete => "Complete",
        };
        f.write_str(label)
    }
}

/// File write status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Write started
    Started,
    /// File committed on the branch
    Written,
    /// File removed from the branch
    Deleted,
    /// Write failed with error message
    Failed(String),
}

/// Progress callback trait
///
/// Implement this trait to receive progress updates during a change.
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called when entering a new phase
    async fn on_phase(&self, phase: Phase);

    /// Called once the change branch exists
    async fn on_branch_ready(&self, branch: &str);

    /// Called as each file is written
    async fn on_file(&self, path: &str, status: FileStatus);

    /// Called when the review request is known (created or reused)
    async fn on_review(&self, pr: &PullRequest, reused: bool);

    /// Called when an error occurs (non-fatal)
    async fn on_error(&self, error: &Error);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_phase(&self, _phase: Phase) {}
    async fn on_branch_ready(&self, _branch: &str) {}
    async fn on_file(&self, _path: &str, _status: FileStatus) {}
    async fn on_review(&self, _pr: &PullRequest, _reused: bool) {}
    async fn on_error(&self, _error: &Error) {}
}

/// Progress callback that reports through `tracing`
pub struct TracingProgress {
    /// Label of the flow being executed (e.g. "init-tenant")
    pub flow: &'static str,
}

#[async_trait]
impl ProgressCallback for TracingProgress {
    async fn on_phase(&self, phase: Phase) {
        debug!(flow = self.flow, %phase, "phase");
    }

    async fn on_branch_ready(&self, branch: &str) {
        debug!(flow = self.flow, branch, "branch ready");
    }

    async fn on_file(&self, path: &str, status: FileStatus) {
        match status {
            FileStatus::Started => debug!(flow = self.flow, path, "writing"),
            FileStatus::Written => info!(flow = self.flow, path, "written"),
            FileStatus::Deleted => info!(flow = self.flow, path, "deleted"),
            FileStatus::Failed(msg) => warn!(flow = self.flow, path, error = %msg, "write failed"),
        }
    }

    async fn on_review(&self, pr: &PullRequest, reused: bool) {
        info!(
            flow = self.flow,
            number = pr.number,
            url = %pr.html_url,
            reused,
            "review request"
        );
    }

    async fn on_error(&self, error: &Error) {
        warn!(flow = self.flow, kind = error.kind(), error = %error, "advisory");
    }
}
