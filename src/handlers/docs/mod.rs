// OpenAPI document for the public and dashboard APIs

use axum::{extract::State, Json};
use utoipa::{
    openapi::{
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
        server::Server,
    },
    Modify, OpenApi,
};

use crate::app::AppState;
use crate::handlers::{admin, analytics, folders, qr_codes, redirect};
use crate::models::{
    AdminStats, AdminToggleRequest, AdminUserSummary, AnalyticsOverview, BreakdownEntry,
    BulkAction, BulkActionRequest, BulkActionResponse, CreateFolderRequest, CreateQrCodeRequest,
    DailyCount, FolderResponse, QrAnalytics, QrCodeListResponse, QrCodeResponse, ScanBreakdowns,
    SubscriptionStatus, TopQrCode, UpdateFolderRequest, UpdateQrCodeRequest, User, UserRole,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "QR Redirect Service API",
        version = "1.0.0",
        description = "Public scan resolution for dynamic QR codes, plus the dashboard and admin APIs"
    ),
    paths(
        redirect::resolve_scan,
        redirect::verify_password,
        qr_codes::create_qr_code,
        qr_codes::list_qr_codes,
        qr_codes::get_qr_code,
        qr_codes::update_qr_code,
        qr_codes::delete_qr_code,
        qr_codes::toggle_status,
        qr_codes::toggle_favorite,
        qr_codes::bulk_action,
        folders::create_folder,
        folders::list_folders,
        folders::update_folder,
        folders::delete_folder,
        analytics::overview,
        analytics::qr_code_analytics,
        admin::stats,
        admin::list_users,
        admin::list_qr_codes,
        admin::force_toggle,
    ),
    components(schemas(
        redirect::VerifyPasswordRequest,
        redirect::VerifyPasswordResponse,
        CreateQrCodeRequest,
        UpdateQrCodeRequest,
        QrCodeResponse,
        QrCodeListResponse,
        BulkAction,
        BulkActionRequest,
        BulkActionResponse,
        CreateFolderRequest,
        UpdateFolderRequest,
        FolderResponse,
        BreakdownEntry,
        DailyCount,
        ScanBreakdowns,
        QrAnalytics,
        AnalyticsOverview,
        TopQrCode,
        AdminStats,
        AdminToggleRequest,
        AdminUserSummary,
        User,
        UserRole,
        SubscriptionStatus,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Public", description = "Scan resolution and password verification"),
        (name = "QR Codes", description = "QR code management"),
        (name = "Folders", description = "Folder organization"),
        (name = "Analytics", description = "Scan analytics"),
        (name = "Admin", description = "Platform administration")
    )
)]
pub struct ApiDoc;

/// Document with the configured public base URL as its only server
pub fn build_openapi_spec(public_base_url: &str) -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    spec.servers = Some(vec![Server::new(public_base_url)]);
    spec
}

/// GET /api-docs/openapi.json
pub async fn serve_openapi_spec(State(state): State<AppState>) -> Json<utoipa::openapi::OpenApi> {
    Json(build_openapi_spec(&state.config.redirect.public_base_url))
}
