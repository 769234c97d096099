use axum::{
    body::Body,
    extract::State,
    http::{
        header::{self, HeaderValue},
        Method, Request, Response, StatusCode,
    },
    middleware::Next,
};
use tracing::debug;

use crate::app::AppState;

/// Origin allowed to call the API, if any.
/// A `*` entry reflects any origin outside production so credentials keep working.
pub fn allowed_origin(
    allowed: &[String],
    is_production: bool,
    origin: Option<&str>,
) -> Option<String> {
    let origin = origin?;
    let has_wildcard = allowed.iter().any(|o| o == "*");

    if has_wildcard && !is_production {
        debug!("CORS: Reflecting origin outside production: {}", origin);
        return Some(origin.to_string());
    }

    if allowed.iter().any(|o| o == origin) {
        Some(origin.to_string())
    } else {
        debug!("CORS: Origin not in whitelist: {}", origin);
        None
    }
}

fn apply_headers(response: &mut Response<Body>, origin: &str) {
    let Ok(value) = HeaderValue::from_str(origin) else {
        return;
    };
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(header::VARY, HeaderValue::from_static("origin"));
}

/// CORS for the JSON API; the public redirect never needs it
pub async fn dynamic_cors_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response<Body>, StatusCode> {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let allowed = allowed_origin(
        &state.config.security.cors_allowed_origins,
        state.config.is_production(),
        origin.as_deref(),
    );

    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        if let Some(allowed) = &allowed {
            apply_headers(&mut response, allowed);
            let headers = response.headers_mut();
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET, POST, PUT, PATCH, DELETE, OPTIONS"),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("content-type, authorization, accept, origin"),
            );
            headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("3600"));
        }
        *response.status_mut() = StatusCode::NO_CONTENT;
        return Ok(response);
    }

    let mut response = next.run(req).await;
    if let Some(allowed) = &allowed {
        apply_headers(&mut response, allowed);
    }

    Ok(response)
}
