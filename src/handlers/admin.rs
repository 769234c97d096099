// Administrator API; mounted behind the role check

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::AuthenticatedUser,
    models::{
        AdminListParams, AdminStats, AdminToggleRequest, AdminUserSummary, QrCodeListResponse,
        QrCodeResponse,
    },
    utils::service_error::ServiceResult,
};

#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    tag = "Admin",
    operation_id = "adminStats",
    responses(
        (status = 200, description = "Platform totals", body = AdminStats),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearerAuth" = []))
)]
pub async fn stats(State(state): State<AppState>) -> ServiceResult<Json<AdminStats>> {
    Ok(Json(state.admin_service.stats().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "Admin",
    operation_id = "adminListUsers",
    params(AdminListParams),
    responses(
        (status = 200, description = "Users with their QR counts", body = Vec<AdminUserSummary>),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<AdminListParams>,
) -> ServiceResult<Json<Vec<AdminUserSummary>>> {
    Ok(Json(state.admin_service.list_users(params).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/qr-codes",
    tag = "Admin",
    operation_id = "adminListQrCodes",
    params(AdminListParams),
    responses(
        (status = 200, description = "QR codes across all owners", body = QrCodeListResponse),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_qr_codes(
    State(state): State<AppState>,
    Query(params): Query<AdminListParams>,
) -> ServiceResult<Json<QrCodeListResponse>> {
    Ok(Json(state.admin_service.list_qr_codes(params).await?))
}

/// Enable or disable any code; an empty body flips it
#[utoipa::path(
    patch,
    path = "/api/v1/admin/qr-codes/{id}/toggle",
    tag = "Admin",
    operation_id = "adminToggleQrCode",
    params(("id" = Uuid, Path, description = "QR code ID")),
    request_body = AdminToggleRequest,
    responses(
        (status = 200, description = "Updated QR code", body = QrCodeResponse),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn force_toggle(
    State(state): State<AppState>,
    admin: AuthenticatedUser,
    Path(id): Path<Uuid>,
    request: Option<Json<AdminToggleRequest>>,
) -> ServiceResult<Json<QrCodeResponse>> {
    let is_active = request.and_then(|Json(body)| body.is_active);
    tracing::info!("Admin {} toggling QR code {} ({:?})", admin.user_id, id, is_active);

    Ok(Json(
        state.admin_service.force_toggle(id, is_active).await?,
    ))
}
