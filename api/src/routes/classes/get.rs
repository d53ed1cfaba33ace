use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use util::state::AppState;

use crate::{auth::AuthUser, response::ApiResponse};

use super::common::{ClassResponse, RosterEntryResponse};
use db::models::class::{Column as ClassCol, Entity as ClassEntity};
use db::models::class_student::{Column as EnrollCol, Entity as EnrollEntity};
use db::models::user;

/// GET `/api/classes`
///
/// Lists classes owned by the caller; admins see every class.
pub async fn list_classes(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<ClassResponse>>>) {
    let db = state.db();

    let mut sel = ClassEntity::find().order_by_asc(ClassCol::Code);
    if !claims.admin {
        sel = sel.filter(ClassCol::TeacherId.eq(claims.sub));
    }

    match sel.all(db).await {
        Ok(rows) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                rows.into_iter().map(ClassResponse::from).collect(),
                "Classes retrieved",
            )),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Database error retrieving classes")),
        ),
    }
}

/// GET `/api/classes/{class_id}`
pub async fn get_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<ClassResponse>>) {
    let db = state.db();

    match ClassEntity::find_by_id(class_id).one(db).await {
        Ok(Some(row)) => (
            StatusCode::OK,
            Json(ApiResponse::success(row.into(), "Class retrieved")),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Class not found")),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Database error retrieving class")),
        ),
    }
}

/// GET `/api/classes/{class_id}/students`
///
/// Returns the roster, including deactivated enrollments, with the student's
/// identifying fields joined in.
pub async fn list_roster(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Vec<RosterEntryResponse>>>) {
    let db = state.db();

    let rows = EnrollEntity::find()
        .filter(EnrollCol::ClassId.eq(class_id))
        .order_by_asc(EnrollCol::EnrolledAt)
        .find_also_related(user::Entity)
        .all(db)
        .await;

    match rows {
        Ok(rows) => {
            let roster = rows
                .into_iter()
                .map(|(edge, student)| {
                    let (username, email) = student
                        .map(|u| (u.username, u.email))
                        .unwrap_or_default();
                    RosterEntryResponse {
                        student_id: edge.student_id,
                        username,
                        email,
                        is_active: edge.is_active,
                        source: edge.source,
                        enrolled_at: edge.enrolled_at,
                    }
                })
                .collect();
            (
                StatusCode::OK,
                Json(ApiResponse::success(roster, "Roster retrieved")),
            )
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Database error retrieving roster")),
        ),
    }
}
