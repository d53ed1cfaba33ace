use axum::{
    Router,
    routing::{delete, get, post},
};
use util::state::AppState;

pub mod common;
pub mod delete;
pub mod get;
pub mod post;

pub use delete::delete_session;
pub use get::{get_session, get_summary, list_records, list_sessions, session_analytics};
pub use post::{create_session, end_session, issue_qr, recompute_summary, upsert_record};

/// Attendance routes nested under `/classes/{class_id}/attendance`.
///
/// Every route here is class-owner-gated at the mount site; students interact
/// with attendance only through the top-level `/attendance/checkin` endpoint.
pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions", post(create_session))
        .route("/sessions/{session_id}", get(get_session))
        .route("/sessions/{session_id}", delete(delete_session))
        .route("/sessions/{session_id}/qr", post(issue_qr))
        .route("/sessions/{session_id}/end", post(end_session))
        .route("/sessions/{session_id}/analytics", get(session_analytics))
        .route("/sessions/{session_id}/records", get(list_records))
        .route("/sessions/{session_id}/records", post(upsert_record))
        .route("/summaries/{student_id}", get(get_summary))
        .route("/summaries/{student_id}/recompute", post(recompute_summary))
}
