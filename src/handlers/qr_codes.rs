// QR code management API

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        BulkActionRequest, BulkActionResponse, CreateQrCodeRequest, ListQrCodesParams,
        QrCodeListResponse, QrCodeResponse, UpdateQrCodeRequest,
    },
    utils::service_error::{ServiceError, ServiceResult},
};

/// Create a QR code
/// POST /api/v1/qr-codes
#[utoipa::path(
    post,
    path = "/api/v1/qr-codes",
    tag = "QR Codes",
    operation_id = "createQrCode",
    request_body = CreateQrCodeRequest,
    responses(
        (status = 201, description = "QR code created", body = QrCodeResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_qr_code(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateQrCodeRequest>,
) -> ServiceResult<impl IntoResponse> {
    let created = state
        .qr_code_service
        .create(auth_user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List the caller's QR codes
/// GET /api/v1/qr-codes
#[utoipa::path(
    get,
    path = "/api/v1/qr-codes",
    tag = "QR Codes",
    operation_id = "listQrCodes",
    params(ListQrCodesParams),
    responses(
        (status = 200, description = "Page of QR codes", body = QrCodeListResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_qr_codes(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(params): Query<ListQrCodesParams>,
) -> ServiceResult<Json<QrCodeListResponse>> {
    let page = state
        .qr_code_service
        .list(auth_user.user_id, params)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/qr-codes/{id}",
    tag = "QR Codes",
    operation_id = "getQrCode",
    params(("id" = Uuid, Path, description = "QR code ID")),
    responses(
        (status = 200, description = "QR code", body = QrCodeResponse),
        (status = 404, description = "Not found or not owned by the caller")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_qr_code(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<QrCodeResponse>> {
    Ok(Json(state.qr_code_service.get(auth_user.user_id, id).await?))
}

/// Partial update; `null` clears folder, password and scan limit
#[utoipa::path(
    put,
    path = "/api/v1/qr-codes/{id}",
    tag = "QR Codes",
    operation_id = "updateQrCode",
    params(("id" = Uuid, Path, description = "QR code ID")),
    request_body = UpdateQrCodeRequest,
    responses(
        (status = 200, description = "Updated QR code", body = QrCodeResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Not found or not owned by the caller")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_qr_code(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateQrCodeRequest>,
) -> ServiceResult<Json<QrCodeResponse>> {
    let updated = state
        .qr_code_service
        .update(auth_user.user_id, id, request)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/qr-codes/{id}",
    tag = "QR Codes",
    operation_id = "deleteQrCode",
    params(("id" = Uuid, Path, description = "QR code ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found or not owned by the caller")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_qr_code(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> ServiceResult<StatusCode> {
    state.qr_code_service.delete(auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/v1/qr-codes/{id}/toggle-status",
    tag = "QR Codes",
    operation_id = "toggleQrCodeStatus",
    params(("id" = Uuid, Path, description = "QR code ID")),
    responses(
        (status = 200, description = "QR code with flipped active flag", body = QrCodeResponse),
        (status = 404, description = "Not found or not owned by the caller")
    ),
    security(("bearerAuth" = []))
)]
pub async fn toggle_status(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<QrCodeResponse>> {
    Ok(Json(
        state
            .qr_code_service
            .toggle_status(auth_user.user_id, id)
            .await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/qr-codes/{id}/toggle-favorite",
    tag = "QR Codes",
    operation_id = "toggleQrCodeFavorite",
    params(("id" = Uuid, Path, description = "QR code ID")),
    responses(
        (status = 200, description = "QR code with flipped favorite flag", body = QrCodeResponse),
        (status = 404, description = "Not found or not owned by the caller")
    ),
    security(("bearerAuth" = []))
)]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<QrCodeResponse>> {
    Ok(Json(
        state
            .qr_code_service
            .toggle_favorite(auth_user.user_id, id)
            .await?,
    ))
}

/// Apply one action to many codes
/// POST /api/v1/qr-codes/bulk
#[utoipa::path(
    post,
    path = "/api/v1/qr-codes/bulk",
    tag = "QR Codes",
    operation_id = "bulkQrCodeAction",
    request_body = BulkActionRequest,
    responses(
        (status = 200, description = "Number of codes affected", body = BulkActionResponse),
        (status = 400, description = "Validation failed")
    ),
    security(("bearerAuth" = []))
)]
pub async fn bulk_action(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<BulkActionRequest>,
) -> ServiceResult<Json<BulkActionResponse>> {
    if request.ids.is_empty() {
        return Err(ServiceError::ValidationError(
            "Select at least one QR code".to_string(),
        ));
    }

    let result = state
        .qr_code_service
        .bulk_action(auth_user.user_id, request)
        .await?;
    Ok(Json(result))
}
