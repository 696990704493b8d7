//! Error kinds for request ingress and schedule generation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::dto::ErrorResponse;

/// Everything that can go wrong between receiving a request and returning a
/// schedule.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// A clock time that is not a valid `HH:MM`.
    #[error("invalid time {0:?}, expected HH:MM")]
    BadTime(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// The solver proved a week infeasible or hit its time limit. Carries the
    /// human-readable diagnostic.
    #[error("{0}")]
    Infeasible(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ScheduleError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadTime(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            // Infeasibility is a normal outcome for the caller, not a
            // transport failure; the diagnostic travels in the payload.
            Self::Infeasible(_) => StatusCode::OK,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ScheduleError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "schedule request failed");
        } else if status != StatusCode::OK {
            tracing::warn!(error = %self, "schedule request rejected");
        }
        let body = ErrorResponse::new(self.to_string());
        (status, axum::Json(body)).into_response()
    }
}
