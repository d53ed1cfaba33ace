use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, Path, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::class::Entity as ClassEntity;
use sea_orm::EntityTrait;
use std::collections::HashMap;
use util::state::AppState;

#[derive(serde::Serialize, Default)]
pub struct Empty;

/// Helper to extract, validate user from request extensions and insert them back into the request
async fn extract_and_insert_authuser(
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), (StatusCode, Json<ApiResponse<Empty>>)> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

/// Basic guard to ensure the request is authenticated.
pub async fn allow_authenticated(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, _user) = extract_and_insert_authuser(req).await?;

    Ok(next.run(req).await)
}

/// Admin-only guard.
pub async fn allow_admin(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(req).await?;

    if !user.0.admin {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Admin access required")),
        ));
    }

    Ok(next.run(req).await)
}

/// Capability guard for class-scoped resources: passes when the actor owns the
/// class named by the `class_id` path parameter, or is an admin.
///
/// This is the single authorization check consulted by every class-scoped
/// operation; sessions and attendance rows inherit ownership from their class.
pub async fn require_class_owner(
    State(app_state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(req).await?;

    let class_id = params
        .get("class_id")
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Missing or invalid class_id")),
        ))?;

    if user.0.admin {
        return Ok(next.run(req).await);
    }

    let class = match ClassEntity::find_by_id(class_id).one(app_state.db()).await {
        Ok(Some(class)) => class,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Class not found")),
            ));
        }
        Err(e) => {
            // Deny on DB error (fail-safe).
            tracing::warn!(
                error = %e,
                user_id = user.0.sub,
                class_id,
                "DB error while checking class ownership; denying access"
            );
            return Err((
                StatusCode::FORBIDDEN,
                Json(ApiResponse::error("Access denied")),
            ));
        }
    };

    if class.is_managed_by(user.0.sub, user.0.admin) {
        Ok(next.run(req).await)
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error(
                "Only the class teacher or an admin may perform this action",
            )),
        ))
    }
}
