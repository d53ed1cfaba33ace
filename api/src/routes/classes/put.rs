use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use util::state::AppState;
use validator::Validate;

use crate::response::ApiResponse;

use super::common::{ClassResponse, EditClassReq};
use db::models::class::{ActiveModel as ClassActive, Entity as ClassEntity};

/// PUT `/api/classes/{class_id}`
///
/// Partial edit of class fields; absent fields are left untouched.
pub async fn edit_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(body): Json<EditClassReq>,
) -> (StatusCode, Json<ApiResponse<ClassResponse>>) {
    if let Err(e) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Validation failed: {e}"))),
        );
    }

    let db = state.db();

    let existing = match ClassEntity::find_by_id(class_id).one(db).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Class not found")),
            );
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Database error retrieving class")),
            );
        }
    };

    let mut active: ClassActive = existing.into();
    if let Some(code) = body.code {
        active.code = Set(code);
    }
    if let Some(name) = body.name {
        active.name = Set(name);
    }
    if let Some(capacity) = body.capacity {
        active.capacity = Set(capacity);
    }
    if let Some(allow) = body.allow_qr_enrollment {
        active.allow_qr_enrollment = Set(allow);
    }
    if let Some(is_active) = body.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now());

    match active.update(db).await {
        Ok(row) => (
            StatusCode::OK,
            Json(ApiResponse::success(row.into(), "Class updated")),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Failed to update class")),
        ),
    }
}
