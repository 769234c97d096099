// Public scan handlers
// GET /r/{slug} always answers with a temporary redirect, whatever happens inside.

mod pages;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::{
    app::AppState,
    db::RedirectTarget,
    models::content::QrContent,
    services::{
        metrics, slug, DenyReason, PasswordGateError, RedirectOutcome, ScanLimit,
        ScanRequestContext,
    },
    utils::service_error::ServiceError,
};

/// Verification cookie for one slug
pub fn access_cookie_name(slug: &str) -> String {
    format!("qr_access_{}", slug)
}

fn access_token(jar: &CookieJar, slug: &str) -> Option<String> {
    jar.get(&access_cookie_name(slug))
        .map(|cookie| cookie.value().to_string())
}

// =============================================================================
// REDIRECT HANDLER
// =============================================================================

/// Resolve a scan
/// GET /r/{slug}
#[utoipa::path(
    get,
    path = "/r/{slug}",
    tag = "Public",
    operation_id = "resolveScan",
    params(("slug" = String, Path, description = "Public QR slug", example = "abc12345")),
    responses(
        (status = 307, description = "Redirect to the content, landing page, password challenge or unavailable page")
    )
)]
pub async fn resolve_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(slug): Path<String>,
) -> Redirect {
    let ctx = ScanRequestContext::from_headers(&headers);
    let token = access_token(&jar, &slug);

    // A panic inside resolution must still end in a redirect
    let service = state.redirect_service.clone();
    let task_slug = slug.clone();
    let resolved =
        tokio::spawn(async move { service.resolve(&task_slug, token.as_deref(), ctx).await })
            .await;

    let outcome = match resolved {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Resolving {} aborted: {}", slug, e);
            let outcome = RedirectOutcome::failed(&state.config.redirect.public_base_url);
            metrics::record_outcome(outcome.label());
            outcome
        },
    };

    Redirect::temporary(outcome.location())
}

// =============================================================================
// PASSWORD VERIFICATION
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPasswordRequest {
    pub slug: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPasswordResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyPasswordResponse {
    fn failure(status: StatusCode, message: &str) -> Response {
        (
            status,
            Json(VerifyPasswordResponse {
                success: false,
                redirect: None,
                error: Some(message.to_string()),
            }),
        )
            .into_response()
    }
}

/// Check the password of a protected code and set its verification cookie
/// POST /api/v1/qr/verify-password
#[utoipa::path(
    post,
    path = "/api/v1/qr/verify-password",
    tag = "Public",
    operation_id = "verifyQrPassword",
    request_body = VerifyPasswordRequest,
    responses(
        (status = 200, description = "Password accepted; cookie set", body = VerifyPasswordResponse),
        (status = 401, description = "Incorrect password", body = VerifyPasswordResponse),
        (status = 404, description = "Unknown slug or code without a password", body = VerifyPasswordResponse)
    )
)]
pub async fn verify_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<VerifyPasswordRequest>,
) -> Response {
    let slug = request.slug.trim().to_string();
    if !slug::is_plausible_slug(&slug) {
        return VerifyPasswordResponse::failure(StatusCode::NOT_FOUND, "QR code not found");
    }

    match state.password_gate.verify(&slug, &request.password).await {
        Ok(token) => {
            let ttl = state.jwt_service.slug_token_ttl();
            let cookie = Cookie::build((access_cookie_name(&slug), token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(state.config.is_production())
                .max_age(time::Duration::seconds(ttl as i64));

            (
                jar.add(cookie),
                Json(VerifyPasswordResponse {
                    success: true,
                    redirect: Some(format!("/r/{}", slug)),
                    error: None,
                }),
            )
                .into_response()
        },
        Err(PasswordGateError::WrongPassword) => {
            VerifyPasswordResponse::failure(StatusCode::UNAUTHORIZED, "Incorrect password")
        },
        Err(PasswordGateError::NotFound) => {
            VerifyPasswordResponse::failure(StatusCode::NOT_FOUND, "QR code not found")
        },
        Err(PasswordGateError::Internal(e)) => {
            error!("Password verification failed for {}: {}", slug, e);
            VerifyPasswordResponse::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed, please try again",
            )
        },
    }
}

// =============================================================================
// PAGES
// =============================================================================

/// GET /r/{slug}/verify
pub async fn challenge_page(Path(slug): Path<String>) -> Response {
    if !slug::is_plausible_slug(&slug) {
        return Redirect::temporary("/expired").into_response();
    }
    Html(pages::challenge_page(&slug)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ExpiredParams {
    pub reason: Option<String>,
}

/// GET /expired
pub async fn expired_page(Query(params): Query<ExpiredParams>) -> Html<String> {
    let reason = match params.reason.as_deref() {
        Some("limit") => Some(DenyReason::Limit),
        Some("subscription") => Some(DenyReason::Subscription),
        _ => None,
    };
    Html(pages::expired_page(reason))
}

#[derive(Debug, Deserialize)]
pub struct ViewParams {
    /// View pass issued by the scan that redirected here
    pub pass: Option<String>,
}

/// Policy check for the landing routes. Viewing is not a scan and records nothing.
/// With a valid view pass the scan ceiling is skipped, since the scan that issued
/// it was allowed; without one a code past its limit stays closed.
async fn authorize_view(
    state: &AppState,
    jar: &CookieJar,
    slug: &str,
    pass: Option<&str>,
) -> Result<RedirectTarget, RedirectOutcome> {
    let token = access_token(jar, slug);
    let limit = if state.redirect_service.has_view_pass(slug, pass) {
        ScanLimit::Ignore
    } else {
        ScanLimit::Enforce
    };

    state
        .redirect_service
        .authorize(slug, token.as_deref(), limit)
        .await
}

/// Landing page for non-URL content
/// GET /view/{slug}
pub async fn landing_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(slug): Path<String>,
    Query(params): Query<ViewParams>,
) -> Response {
    let pass = params.pass.as_deref();

    match authorize_view(&state, &jar, &slug, pass).await {
        Ok(target) => Html(pages::landing_page(&target.qr, pass)).into_response(),
        Err(outcome) => {
            warn!("Landing page for {} refused: {}", slug, outcome.label());
            Redirect::temporary(outcome.location()).into_response()
        },
    }
}

/// vCard download for contact codes
/// GET /view/{slug}/contact.vcf
pub async fn download_vcard(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(slug): Path<String>,
    Query(params): Query<ViewParams>,
) -> Response {
    let target = match authorize_view(&state, &jar, &slug, params.pass.as_deref()).await {
        Ok(target) => target,
        Err(outcome) => return Redirect::temporary(outcome.location()).into_response(),
    };

    match target.qr.typed_content() {
        QrContent::Vcard(vcard) => (
            [
                (header::CONTENT_TYPE, "text/vcard; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}.vcf\"", target.qr.slug),
                ),
            ],
            vcard.to_vcf(),
        )
            .into_response(),
        _ => ServiceError::NotFound.into_response(),
    }
}
