use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use util::state::AppState;

use crate::response::ApiResponse;
use crate::routes::classes::attendance::common::AttendanceRecordResponse;
use crate::routes::common::checkin_error_response;

use db::checkin;

#[derive(Debug, Deserialize)]
pub struct CheckInReq {
    pub qr_token: String,
    /// Student number, numeric ID, or email.
    pub student_identifier: String,
}

/// POST `/api/attendance/checkin`
///
/// Records a student as present against the session identified by the QR
/// token. Duplicate present scans are rejected so the UI can explain
/// "already marked present"; everything else in the validation chain maps to
/// a typed error response.
pub async fn check_in(
    State(state): State<AppState>,
    Json(body): Json<CheckInReq>,
) -> Response {
    let db = state.db();

    match checkin::check_in_by_qr(db, &body.qr_token, &body.student_identifier, Utc::now()).await {
        Ok(outcome) => {
            tracing::info!(
                session_id = outcome.record.session_id,
                student_id = outcome.record.student_id,
                created = outcome.created,
                "Attendance check-in recorded"
            );
            let status = if outcome.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (
                status,
                Json(ApiResponse::success(
                    AttendanceRecordResponse::from_record(outcome.record, outcome.created),
                    "Attendance recorded",
                )),
            )
                .into_response()
        }
        Err(e) => checkin_error_response(e),
    }
}
