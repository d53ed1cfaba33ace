use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use util::state::AppState;

pub mod get;
pub mod post;

pub use get::attendance_statistics;
pub use post::check_in;

use crate::auth::guards::{allow_admin, allow_authenticated};

/// Top-level `/attendance` routes: QR check-in for any authenticated user and
/// global statistics for admins.
pub fn attendance_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/checkin",
            post(check_in).route_layer(from_fn(allow_authenticated)),
        )
        .route(
            "/statistics",
            get(attendance_statistics).route_layer(from_fn(allow_admin)),
        )
        .with_state(app_state)
}
