use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use util::{config, state::AppState};
use validator::Validate;

use crate::routes::common::{checkin_error_response, error_response};
use crate::{auth::AuthUser, response::ApiResponse};

use super::common::{
    AttendanceRecordResponse, AttendanceSessionResponse, CreateSessionReq, ManualAttendanceReq,
    QrTokenResponse,
};
use db::checkin::{self, ManualEntry};
use db::models::attendance_session::{
    Column as SessionCol, Entity as SessionEntity, Model as SessionModel,
};
use db::models::attendance_summary::Model as SummaryModel;

/// POST `/api/classes/{class_id}/attendance/sessions`
///
/// Creates a session for the class. Ownership enforced by the router guard.
pub async fn create_session(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CreateSessionReq>,
) -> Response {
    if let Err(e) = body.validate() {
        return error_response(StatusCode::BAD_REQUEST, format!("Validation failed: {e}"));
    }

    let db = state.db();
    match SessionModel::create(
        db,
        class_id,
        claims.sub,
        &body.title,
        body.session_date,
        body.start_time,
        body.end_time,
        body.location.as_deref(),
    )
    .await
    {
        Ok(row) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                AttendanceSessionResponse::from(row),
                "Attendance session created",
            )),
        )
            .into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to create attendance session: {e}"),
        ),
    }
}

/// POST `/api/classes/{class_id}/attendance/sessions/{session_id}/qr`
///
/// Issues a fresh QR token for the session, invalidating any previous one.
/// Returns the token, the deep link to encode as a QR image, and the
/// scheduled expiry (null when the session has no end time yet).
pub async fn issue_qr(
    State(state): State<AppState>,
    Path((class_id, session_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<QrTokenResponse>>) {
    let db = state.db();

    let session = match SessionEntity::find()
        .filter(SessionCol::Id.eq(session_id))
        .filter(SessionCol::ClassId.eq(class_id))
        .one(db)
        .await
    {
        Ok(Some(session)) => session,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Attendance session not found")),
            );
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "Database error retrieving attendance session",
                )),
            );
        }
    };

    if !session.is_active {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Session is not currently active")),
        );
    }

    match session.rotate_qr_token(db).await {
        Ok(session) => {
            let token = session.qr_token.clone().unwrap_or_default();
            let expires_at = session.scheduled_end().map(|t| t.to_rfc3339());
            let qr_payload = format!("{}/checkin?token={}", config::frontend_url(), token);

            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    QrTokenResponse {
                        token,
                        qr_payload,
                        expires_at,
                    },
                    "QR token issued",
                )),
            )
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Failed to issue QR token")),
        ),
    }
}

/// POST `/api/classes/{class_id}/attendance/sessions/{session_id}/end`
///
/// Ends the session. Ending an already-ended session is a no-op success.
pub async fn end_session(
    State(state): State<AppState>,
    Path((class_id, session_id)): Path<(i64, i64)>,
) -> Response {
    let db = state.db();

    let session = match SessionEntity::find()
        .filter(SessionCol::Id.eq(session_id))
        .filter(SessionCol::ClassId.eq(class_id))
        .one(db)
        .await
    {
        Ok(Some(session)) => session,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "Attendance session not found");
        }
        Err(_) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error retrieving attendance session",
            );
        }
    };

    match session.end(db).await {
        Ok(row) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                AttendanceSessionResponse::from(row),
                "Attendance session ended",
            )),
        )
            .into_response(),
        Err(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to end attendance session",
        ),
    }
}

/// POST `/api/classes/{class_id}/attendance/sessions/{session_id}/records`
///
/// Teacher-initiated manual attendance entry. Idempotent upsert keyed on
/// (session, student): a retried POST updates rather than duplicates.
pub async fn upsert_record(
    State(state): State<AppState>,
    Path((class_id, session_id)): Path<(i64, i64)>,
    Json(body): Json<ManualAttendanceReq>,
) -> Response {
    let db = state.db();

    // The session must belong to the class in the path.
    match SessionEntity::find()
        .filter(SessionCol::Id.eq(session_id))
        .filter(SessionCol::ClassId.eq(class_id))
        .one(db)
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "Attendance session not found");
        }
        Err(_) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error retrieving attendance session",
            );
        }
    }

    let identifier = match (&body.student_identifier, body.student_pk) {
        (Some(s), _) => s.clone(),
        (None, Some(pk)) => pk.to_string(),
        (None, None) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "student_identifier or student_pk is required",
            );
        }
    };

    let entry = ManualEntry {
        status: body.status,
        notes: body.notes,
        check_in_time: body.check_in_time,
    };

    match checkin::manual_upsert(db, session_id, &identifier, entry, Utc::now()).await {
        Ok(outcome) => {
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

/// POST `/api/classes/{class_id}/attendance/summaries/{student_id}/recompute`
///
/// Recomputes the cached per-student summary for this class. The cache is
/// only as fresh as the last recompute.
pub async fn recompute_summary(
    State(state): State<AppState>,
    Path((class_id, student_id)): Path<(i64, i64)>,
) -> (
    StatusCode,
    Json<ApiResponse<Option<db::models::attendance_summary::Model>>>,
) {
    let db = state.db();

    match SummaryModel::recompute(db, class_id, student_id).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(summary),
                "Attendance summary recomputed",
            )),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Failed to recompute attendance summary")),
        ),
    }
}
