use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use util::state::AppState;
use validator::Validate;

use crate::routes::common::{checkin_error_response, error_response};
use crate::{auth::AuthUser, response::ApiResponse};

use super::common::{ClassResponse, CreateClassReq, EnrollStudentReq};
use db::checkin;
use db::models::class::Model as ClassModel;
use db::models::class_student::{EnrollmentSource, Model as EnrollModel};

/// POST `/api/classes`
///
/// Creates a class owned by the caller.
pub async fn create_class(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CreateClassReq>,
) -> Response {
    if let Err(e) = body.validate() {
        return error_response(StatusCode::BAD_REQUEST, format!("Validation failed: {e}"));
    }

    let db = state.db();
    match ClassModel::create(
        db,
        &body.code,
        &body.name,
        claims.sub,
        body.capacity.unwrap_or(50),
        body.allow_qr_enrollment.unwrap_or(false),
    )
    .await
    {
        Ok(row) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                ClassResponse::from(row),
                "Class created",
            )),
        )
            .into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to create class: {e}"),
        ),
    }
}

/// POST `/api/classes/{class_id}/students`
///
/// Enrolls a student (by student number, ID, or email) into the class.
/// Re-enrolling a deactivated student reactivates the existing edge.
pub async fn enroll_student(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(body): Json<EnrollStudentReq>,
) -> Response {
    let db = state.db();

    let student = match checkin::resolve_student(db, &body.student_identifier).await {
        Ok(s) => s,
        Err(e) => return checkin_error_response(e),
    };

    let source = body.source.unwrap_or(EnrollmentSource::Admin);
    match EnrollModel::enroll(db, class_id, student.id, source).await {
        Ok(edge) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(edge, "Student enrolled")),
        )
            .into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to enroll student: {e}"),
        ),
    }
}
