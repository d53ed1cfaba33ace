use axum::{Json, extract::State, http::StatusCode};
use util::state::AppState;

use crate::response::ApiResponse;
use db::analytics::{self, GlobalStatistics};

/// GET `/api/attendance/statistics`
///
/// Global present/total counts and rate across all sessions. Admin-only.
pub async fn attendance_statistics(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Option<GlobalStatistics>>>) {
    let db = state.db();

    match analytics::global_statistics(db).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(stats),
                "Attendance statistics computed",
            )),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Failed to compute attendance statistics")),
        ),
    }
}
