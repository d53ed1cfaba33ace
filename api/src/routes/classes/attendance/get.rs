//! Attendance: read-only routes (list sessions, get session, analytics,
//! list records, cached summaries).

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use util::state::AppState;

use crate::response::ApiResponse;
use crate::routes::common::error_response;

use super::common::{AttendanceSessionResponse, ListQuery, ListResponse};
use db::analytics::{self, SessionAnalytics};
use db::models::attendance::{
    AttendanceStatus, Column as RecordCol, Entity as RecordEntity,
};
use db::models::attendance_session::{Column as SessionCol, Entity as SessionEntity};
use db::models::attendance_summary::Model as SummaryModel;
use db::models::class_student::Model as EnrollModel;

async fn present_count(
    db: &sea_orm::DatabaseConnection,
    session_id: i64,
) -> u64 {
    RecordEntity::find()
        .filter(RecordCol::SessionId.eq(session_id))
        .filter(RecordCol::Status.eq(AttendanceStatus::Present))
        .count(db)
        .await
        .unwrap_or(0)
}

/// GET `/api/classes/{class_id}/attendance/sessions`
///
/// List attendance sessions for a class.
///
/// **Query**:
/// - `q` *(optional)*: fuzzy match on title
/// - `active` *(optional bool)*
/// - `sort` *(optional)*: `created_at` | `title` | `active` (prefix `-` for desc)
/// - `page` *(default 1)*
/// - `per_page` *(default 20, max 100)*
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Query(q): Query<ListQuery>,
) -> (StatusCode, Json<ApiResponse<ListResponse>>) {
    let db = state.db();
    let page = q.page.unwrap_or(1).max(1) as u64;
    let per_page = q.per_page.unwrap_or(20).clamp(1, 100) as u64;

    let mut sel = SessionEntity::find().filter(SessionCol::ClassId.eq(class_id));
    if let Some(s) = q.q.as_ref().filter(|s| !s.trim().is_empty()) {
        sel = sel.filter(SessionCol::Title.contains(s));
    }
    if let Some(a) = q.active {
        sel = sel.filter(SessionCol::IsActive.eq(a));
    }
    sel = match q.sort.as_deref() {
        Some(sort) if sort.starts_with('-') => match &sort[1..] {
            "created_at" => sel.order_by_desc(SessionCol::CreatedAt),
            "title" => sel.order_by_desc(SessionCol::Title),
            "active" => sel.order_by_desc(SessionCol::IsActive),
            _ => sel.order_by_desc(SessionCol::CreatedAt),
        },
        Some("created_at") => sel.order_by_asc(SessionCol::CreatedAt),
        Some("title") => sel.order_by_asc(SessionCol::Title),
        Some("active") => sel.order_by_asc(SessionCol::IsActive),
        _ => sel.order_by_desc(SessionCol::CreatedAt),
    };

    let paginator = sel.paginate(db, per_page);
    let total = paginator.num_items().await.unwrap_or(0) as i32;
    let rows = paginator
        .fetch_page(page.saturating_sub(1))
        .await
        .unwrap_or_default();

    let student_count = EnrollModel::active_count(db, class_id).await.unwrap_or(0);

    let mut sessions = Vec::with_capacity(rows.len());
    for row in rows {
        let attended = present_count(db, row.id).await;
        sessions.push(AttendanceSessionResponse::from_with_counts(
            row,
            attended,
            student_count,
        ));
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            ListResponse {
                sessions,
                page: page as i32,
                per_page: per_page as i32,
                total,
            },
            "Attendance sessions retrieved",
        )),
    )
}

/// GET `/api/classes/{class_id}/attendance/sessions/{session_id}`
pub async fn get_session(
    State(state): State<AppState>,
    Path((class_id, session_id)): Path<(i64, i64)>,
) -> Response {
    let db = state.db();

    let found = SessionEntity::find()
        .filter(
            Condition::all()
                .add(SessionCol::Id.eq(session_id))
                .add(SessionCol::ClassId.eq(class_id)),
        )
        .one(db)
        .await;

    match found {
        Ok(Some(row)) => {
            let student_count = EnrollModel::active_count(db, class_id).await.unwrap_or(0);
            let attended = present_count(db, row.id).await;
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    AttendanceSessionResponse::from_with_counts(row, attended, student_count),
                    "Attendance session retrieved",
                )),
            )
                .into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Attendance session not found"),
        Err(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Database error retrieving attendance session",
        ),
    }
}

/// GET `/api/classes/{class_id}/attendance/sessions/{session_id}/analytics`
///
/// Aggregate counts plus the present-student list ordered by check-in time.
pub async fn session_analytics(
    State(state): State<AppState>,
    Path((class_id, session_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<Option<SessionAnalytics>>>) {
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

    match analytics::session_analytics(db, &session).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(stats),
                "Session analytics computed",
            )),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Failed to compute session analytics")),
        ),
    }
}

/// GET `/api/classes/{class_id}/attendance/sessions/{session_id}/records`
///
/// All attendance rows for a session, by check-in time ascending.
pub async fn list_records(
    State(state): State<AppState>,
    Path((class_id, session_id)): Path<(i64, i64)>,
) -> (
    StatusCode,
    Json<ApiResponse<Vec<db::models::attendance::Model>>>,
) {
    let db = state.db();

    match SessionEntity::find()
        .filter(SessionCol::Id.eq(session_id))
        .filter(SessionCol::ClassId.eq(class_id))
        .one(db)
        .await
    {
        Ok(Some(_)) => {}
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
    }

    match RecordEntity::find()
        .filter(RecordCol::SessionId.eq(session_id))
        .order_by_asc(RecordCol::CheckInTime)
        .all(db)
        .await
    {
        Ok(rows) => (
            StatusCode::OK,
            Json(ApiResponse::success(rows, "Attendance records retrieved")),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(
                "Database error retrieving attendance records",
            )),
        ),
    }
}

/// GET `/api/classes/{class_id}/attendance/summaries/{student_id}`
///
/// Returns the cached summary. May be stale; POST `.../recompute` refreshes.
pub async fn get_summary(
    State(state): State<AppState>,
    Path((class_id, student_id)): Path<(i64, i64)>,
) -> (
    StatusCode,
    Json<ApiResponse<Option<db::models::attendance_summary::Model>>>,
) {
    let db = state.db();

    match SummaryModel::find_pair(db, class_id, student_id).await {
        Ok(Some(summary)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(summary),
                "Attendance summary retrieved",
            )),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(
                "No summary computed yet for this student",
            )),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(
                "Database error retrieving attendance summary",
            )),
        ),
    }
}
