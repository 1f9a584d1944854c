//! Success response bodies

use crate::error::Error;
use crate::pipeline::ChangeOutcome;
use serde::Serialize;
use serde_json::Value;

/// Why a committed change has no pull request
#[derive(Debug, Serialize)]
pub struct Advisory {
    /// Error kind (`review_request_failed`)
    pub error: &'static str,
    /// Remote diagnostic text
    pub detail: String,
    /// Remote HTTP status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<&Error> for Advisory {
    fn from(error: &Error) -> Self {
        Self {
            error: error.kind(),
            detail: error.detail(),
            status: error.remote_status(),
        }
    }
}

/// Response of every write route
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeResponse {
    /// Always `true`; failures use the error body
    pub ok: bool,
    /// Branch carrying the change
    pub branch: String,
    /// Pull request URL, `null` when only committed
    pub review_url: Option<String>,
    /// Pull request number
    pub review_number: Option<u64>,
    /// Whether an already open pull request was reused
    pub reused: bool,
    /// Paths written, in order
    pub paths: Vec<String>,
    /// Present when the files were committed but no pull request exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<Advisory>,
    /// Follow-up links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Value>,
}

impl ChangeResponse {
    /// Attach follow-up links
    #[must_use]
    pub fn with_next(mut self, next: Value) -> Self {
        self.next = Some(next);
        self
    }
}

impl From<ChangeOutcome> for ChangeResponse {
    fn from(outcome: ChangeOutcome) -> Self {
        let paths = outcome.files().iter().map(|f| f.path.clone()).collect();
        let review = outcome.review();

        let review_url = review.map(|r| r.pull_request.html_url.clone());
        let review_number = review.map(|r| r.pull_request.number);
        let reused = review.is_some_and(|r| r.reused);

        let advisory = match &outcome {
            ChangeOutcome::Persisted { advisory, .. } => Some(Advisory::from(advisory)),
            ChangeOutcome::Proposed { .. } => None,
        };

        Self {
            ok: true,
            branch: outcome.branch().to_string(),
            review_url,
            review_number,
            reused,
            paths,
            advisory,
            next: None,
        }
    }
}

/// Response of a directory listing
#[derive(Debug, Serialize)]
pub struct Listing {
    /// Always `true`
    pub ok: bool,
    /// Entry names
    pub items: Vec<String>,
}

/// Response of a merge
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    /// Always `true`
    pub ok: bool,
    /// Whether this call created a merge
    pub merged: bool,
    /// Branch merged into
    pub base: String,
    /// Branch that was merged
    #[serde(rename = "ref")]
    pub reference: String,
    /// Merge commit sha
    pub commit_sha: Option<String>,
}
