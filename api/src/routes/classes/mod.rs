//! Routes for the `/api/classes` endpoint group.
//!
//! - `post.rs` — create class, enroll students
//! - `get.rs` — list/fetch classes, list roster
//! - `put.rs` — edit class
//! - `delete.rs` — delete class, unenroll students
//! - `attendance/` — nested attendance session routes

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use util::state::AppState;

pub mod attendance;
pub mod common;
pub mod delete;
pub mod get;
pub mod post;
pub mod put;

use crate::auth::guards::require_class_owner;
use attendance::attendance_routes;
use delete::{delete_class, remove_student};
use get::{get_class, list_classes, list_roster};
use post::{create_class, enroll_student};
use put::edit_class;

/// Builds and returns the `/classes` route group.
///
/// Reads and creation require authentication (applied at the mount site);
/// everything scoped to a specific class is gated on class ownership.
pub fn classes_routes(app_state: AppState) -> Router<AppState> {
    let owner = |state: &AppState| from_fn_with_state(state.clone(), require_class_owner);

    Router::new()
        .route("/", get(list_classes))
        .route("/", post(create_class))
        .route("/{class_id}", get(get_class).route_layer(owner(&app_state)))
        .route("/{class_id}", put(edit_class).route_layer(owner(&app_state)))
        .route(
            "/{class_id}",
            delete(delete_class).route_layer(owner(&app_state)),
        )
        .route(
            "/{class_id}/students",
            get(list_roster).route_layer(owner(&app_state)),
        )
        .route(
            "/{class_id}/students",
            post(enroll_student).route_layer(owner(&app_state)),
        )
        .route(
            "/{class_id}/students/{student_id}",
            delete(remove_student).route_layer(owner(&app_state)),
        )
        .nest(
            "/{class_id}/attendance",
            attendance_routes().route_layer(owner(&app_state)),
        )
        .with_state(app_state)
}
