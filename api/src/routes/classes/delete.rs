use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::EntityTrait;
use util::state::AppState;

use crate::response::ApiResponse;

use db::models::class::Entity as ClassEntity;
use db::models::class_student::Model as EnrollModel;

/// DELETE `/api/classes/{class_id}`
///
/// Removes the class; sessions and attendance rows cascade away with it.
pub async fn delete_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = state.db();

    match ClassEntity::delete_by_id(class_id).exec(db).await {
        Ok(res) if res.rows_affected > 0 => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Class deleted")),
        ),
        Ok(_) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Class not found")),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Failed to delete class")),
        ),
    }
}

/// DELETE `/api/classes/{class_id}/students/{student_id}`
///
/// Deactivates an enrollment rather than deleting the edge, preserving the
/// attendance history behind it.
pub async fn remove_student(
    State(state): State<AppState>,
    Path((class_id, student_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = state.db();

    match EnrollModel::deactivate(db, class_id, student_id).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Student unenrolled")),
        ),
        Err(sea_orm::DbErr::RecordNotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Enrollment not found")),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Failed to unenroll student")),
        ),
    }
}
