// Authentication middleware for protected routes
// Validates bearer tokens and injects AuthenticatedUser into request extensions

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::{app::AppState, middleware::auth::AuthenticatedUser};

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": message,
            "status": StatusCode::UNAUTHORIZED.as_u16()
        })),
    )
        .into_response()
}

/// Validate the bearer token and add AuthenticatedUser to extensions
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        return unauthorized("Missing or invalid authorization header");
    };

    let user = app_state
        .jwt_service
        .validate_access_token(token)
        .and_then(AuthenticatedUser::try_from);

    match user {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        },
        Err(e) => {
            tracing::warn!("JWT validation failed: {}", e);
            unauthorized("Invalid or expired token")
        },
    }
}

/// Layered after `auth_middleware`; lets only administrators through
pub async fn require_admin(request: Request<Body>, next: Next) -> Response {
    match request.extensions().get::<AuthenticatedUser>() {
        Some(user) if user.is_admin() => next.run(request).await,
        Some(user) => {
            tracing::warn!("Non-admin {} attempted an admin route", user.user_id);
            (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "Administrator role required",
                    "status": StatusCode::FORBIDDEN.as_u16()
                })),
            )
                .into_response()
        },
        None => unauthorized("Authentication required"),
    }
}

/// Lets handlers take `AuthenticatedUser` as an argument
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| unauthorized("Authentication required"))
    }
}
