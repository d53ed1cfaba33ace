use std::convert::Infallible;
use std::sync::Once;

use axum::{Router, body::Body, http::Request, response::Response};
use tower::ServiceExt;
use tower::util::BoxCloneService;

use api::routes::routes;
use util::state::AppState;

static TEST_ENV: Once = Once::new();

/// Populates the environment variables the auth layer and config read.
/// Every test binary sets the same values, so ordering does not matter.
fn init_test_env() {
    TEST_ENV.call_once(|| {
        // SAFETY: called before any request handling touches the environment.
        unsafe {
            std::env::set_var("JWT_SECRET", "test-secret");
            std::env::set_var("JWT_DURATION_MINUTES", "60");
            std::env::set_var("DATABASE_PATH", "sqlite::memory:");
            std::env::set_var("FRONTEND_URL", "http://localhost:5173");
        }
    });
}

/// Builds the full `/api` router on a fresh in-memory database.
///
/// Returns both the boxed service (for `oneshot`) and the `AppState` so tests
/// can seed rows and assert against the database directly.
pub async fn make_test_app() -> (
    BoxCloneService<Request<Body>, Response, Infallible>,
    AppState,
) {
    init_test_env();

    let db = db::test_utils::setup_test_db().await;
    let app_state = AppState::new(db);

    let router = Router::new()
        .nest("/api", routes(app_state.clone()))
        .with_state(app_state.clone());

    (router.into_service().boxed_clone(), app_state)
}

/// Builds the router on a database with no schema, so every query fails.
///
/// Used to assert that handlers report storage failures as 500s instead of
/// mistaking them for missing resources.
pub async fn make_broken_storage_app() -> BoxCloneService<Request<Body>, Response, Infallible> {
    init_test_env();

    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .unwrap();
    let app_state = AppState::new(db);

    let router = Router::new()
        .nest("/api", routes(app_state.clone()))
        .with_state(app_state);

    router.into_service().boxed_clone()
}
