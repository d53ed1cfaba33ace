//! HTTP route entry point for `/api/...`.
//!
//! Route groups include:
//! - `/health` → Health check endpoint (public)
//! - `/classes` → Class CRUD, roster management, and nested attendance
//!   sessions (authenticated; class-scoped writes require ownership)
//! - `/attendance` → QR check-in (any authenticated user) and global
//!   statistics (admin-only)

use crate::auth::guards::allow_authenticated;
use crate::routes::{
    attendance::attendance_routes, classes::classes_routes, health::health_routes,
};
use axum::{Router, middleware::from_fn};
use util::state::AppState;

pub mod attendance;
pub mod classes;
pub mod common;
pub mod health;

/// Builds the complete application router for all HTTP endpoints.
pub fn routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest(
            "/classes",
            classes_routes(app_state.clone()).route_layer(from_fn(allow_authenticated)),
        )
        .nest("/attendance", attendance_routes(app_state.clone()))
        .with_state(app_state)
}
