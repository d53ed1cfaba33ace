//! Shared helpers for route handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::checkin::CheckInError;

use crate::auth::guards::Empty;
use crate::response::ApiResponse;

/// Maps a check-in failure to its HTTP status.
///
/// `AlreadyCheckedIn` is a rejection rather than a server fault, so it maps to
/// 400 with a message the student UI can surface directly.
pub fn checkin_error_status(err: &CheckInError) -> StatusCode {
    match err {
        CheckInError::NotFound(_) | CheckInError::InvalidToken => StatusCode::NOT_FOUND,
        CheckInError::SessionEnded
        | CheckInError::NotEnrolled
        | CheckInError::AlreadyCheckedIn
        | CheckInError::Validation(_) => StatusCode::BAD_REQUEST,
        CheckInError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Renders a `CheckInError` as the standard error envelope.
pub fn checkin_error_response(err: CheckInError) -> Response {
    if let CheckInError::Db(ref e) = err {
        tracing::error!(error = %e, "Attendance persistence failure");
    }
    let status = checkin_error_status(&err);
    (status, Json(ApiResponse::<Empty>::error(err.to_string()))).into_response()
}

/// Renders an arbitrary error message as the standard envelope.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<Empty>::error(message))).into_response()
}
