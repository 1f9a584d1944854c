//! Error types for oscal-gateway

use thiserror::Error;

/// A non-success response from the content store, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("remote returned {status}: {body}")]
pub struct RemoteError {
    /// HTTP status code
    pub status: u16,
    /// Response body text
    pub body: String,
}

impl RemoteError {
    /// Create a remote error from a status code and body
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Errors that can occur in oscal-gateway
#[derive(Debug, Error)]
pub enum Error {
    /// The base branch could not be resolved to a commit
    #[error("base reference not found: {0}")]
    BaseRefNotFound(String),

    /// Creating the change branch failed for a reason other than "already exists"
    #[error("failed to create branch {branch}: {detail}")]
    BranchCreateFailed {
        /// Branch that was being created
        branch: String,
        /// Remote HTTP status, if the remote answered
        status: Option<u16>,
        /// Remote diagnostic text
        detail: String,
    },

    /// Writing (or deleting) a file on the change branch failed
    #[error("failed to write {path}: {detail}")]
    WriteFailed {
        /// Repository path of the file that failed
        path: String,
        /// Remote HTTP status, if the remote answered
        status: Option<u16>,
        /// Remote diagnostic text
        detail: String,
    },

    /// Opening a pull request failed
    #[error("failed to open review request: {detail}")]
    ReviewRequestFailed {
        /// Remote HTTP status, if the remote answered
        status: Option<u16>,
        /// Remote diagnostic text
        detail: String,
    },

    /// Merging a branch or pull request failed
    #[error("merge failed: {detail}")]
    MergeFailed {
        /// Remote HTTP status, if the remote answered
        status: Option<u16>,
        /// Remote diagnostic text
        detail: String,
    },

    /// Caller input was malformed
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Requested document does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing or wrong API key
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Non-success response from the content store
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// HTTP transport error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// GitHub API error raised by octocrab
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Authentication error
    #[error("authentication error: {0}")]
    Auth(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Parse error
    #[error("parse error: {0}")]
    Parse(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}

impl Error {
    /// Stable machine-readable kind string
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BaseRefNotFound(_) => "base_ref_not_found",
            Self::BranchCreateFailed { .. } => "branch_create_failed",
            Self::WriteFailed { .. } => "write_failed",
            Self::ReviewRequestFailed { .. } => "review_request_failed",
            Self::MergeFailed { .. } => "merge_failed",
            Self::ValidationFailed(_) => "validation_failed",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::Remote(_) | Self::Http(_) | Self::GitHubApi(_) => "upstream_error",
            Self::Json(_)
            | Self::Auth(_)
            | Self::Config(_)
            | Self::Parse(_)
            | Self::Internal(_) => "server_error",
        }
    }

    /// Human-readable detail
    ///
    /// For write failures this is the failing path, so batch callers can see
    /// which file stopped the change.
    pub fn detail(&self) -> String {
        match self {
            Self::BaseRefNotFound(base) => base.clone(),
            Self::WriteFailed { path, .. } => path.clone(),
            Self::BranchCreateFailed { detail, .. }
            | Self::ReviewRequestFailed { detail, .. }
            | Self::MergeFailed { detail, .. } => detail.clone(),
            Self::ValidationFailed(msg) | Self::NotFound(msg) | Self::Unauthorized(msg) => {
                msg.clone()
            }
            Self::Remote(remote) => remote.body.clone(),
            other => other.to_string(),
        }
    }

    /// Remote HTTP status attached to this error, if any
    pub const fn remote_status(&self) -> Option<u16> {
        match self {
            Self::BranchCreateFailed { status, .. }
            | Self::WriteFailed { status, .. }
            | Self::ReviewRequestFailed { status, .. }
            | Self::MergeFailed { status, .. } => *status,
            Self::Remote(remote) => Some(remote.status),
            _ => None,
        }
    }

    /// Remote status and diagnostic text for wrapping into a stage error
    fn remote_parts(self) -> (Option<u16>, String) {
        match self {
            Self::Remote(RemoteError { status, body }) => (Some(status), body),
            Self::BranchCreateFailed { status, detail, .. }
            | Self::WriteFailed { status, detail, .. }
            | Self::ReviewRequestFailed { status, detail }
            | Self::MergeFailed { status, detail } => (status, detail),
            other => (None, other.to_string()),
        }
    }

    /// Wrap a store error as a branch creation failure
    pub fn branch_create_failed(branch: &str, err: Self) -> Self {
        let (status, detail) = err.remote_parts();
        Self::BranchCreateFailed {
            branch: branch.to_string(),
            status,
            detail,
        }
    }

    /// Wrap a store error as a write failure for `path`
    pub fn write_failed(path: &str, err: Self) -> Self {
        let (status, detail) = err.remote_parts();
        Self::WriteFailed {
            path: path.to_string(),
            status,
            detail,
        }
    }

    /// Wrap a store error as a review request failure
    pub fn review_request_failed(err: Self) -> Self {
        let (status, detail) = err.remote_parts();
        Self::ReviewRequestFailed { status, detail }
    }

    /// Wrap a store error as a merge failure
    pub fn merge_failed(err: Self) -> Self {
        let (status, detail) = err.remote_parts();
        Self::MergeFailed { status, detail }
    }
}

/// Result type alias for oscal-gateway operations
pub type Result<T> = std::result::Result<T, Error>;
