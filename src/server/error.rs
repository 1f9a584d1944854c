//! Error responses
//!
//! Every failure leaves the gateway as `{ok:false, error, detail, stage?, status?}`.

use crate::error::Error;
use crate::pipeline::{Failure, Stage};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

/// An error on its way to the caller
#[derive(Debug)]
pub struct ApiError {
    /// Underlying error
    pub error: Error,
    /// Pipeline stage, for change failures
    pub stage: Option<Stage>,
}

#[derive(Serialize)]
struct ErrorBody {
    ok: bool,
    error: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
}

/// HTTP status for an error kind
pub const fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::ValidationFailed(_) => StatusCode::BAD_REQUEST,
        Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::BaseRefNotFound(_)
        | Error::BranchCreateFailed { .. }
        | Error::WriteFailed { .. }
        | Error::ReviewRequestFailed { .. }
        | Error::MergeFailed { .. }
        | Error::Remote(_)
        | Error::Http(_)
        | Error::GitHubApi(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self { error, stage: None }
    }
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        Self {
            error: failure.error,
            stage: Some(failure.stage),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.error);

        if status.is_server_error() {
            error!(kind = self.error.kind(), stage = ?self.stage, error = %self.error, "request failed");
        } else if status != StatusCode::NOT_FOUND {
            warn!(kind = self.error.kind(), error = %self.error, "request rejected");
        }

        // Internal details stay in the log
        let detail = if self.error.kind() == "server_error" {
            "unexpected server error".to_string()
        } else {
            self.error.detail()
        };

        let body = ErrorBody {
            ok: false,
            error: self.error.kind(),
            detail,
            stage: self.stage.map(Stage::as_str),
            status: self.error.remote_status(),
        };

        (status, Json(body)).into_response()
    }
}
