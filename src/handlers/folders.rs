// Folder API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::AuthenticatedUser,
    models::{CreateFolderRequest, FolderResponse, UpdateFolderRequest},
    utils::service_error::ServiceResult,
};

#[utoipa::path(
    post,
    path = "/api/v1/folders",
    tag = "Folders",
    operation_id = "createFolder",
    request_body = CreateFolderRequest,
    responses(
        (status = 201, description = "Folder created", body = FolderResponse),
        (status = 400, description = "Validation failed")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_folder(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(request): Json<CreateFolderRequest>,
) -> ServiceResult<impl IntoResponse> {
    let folder = state
        .folder_service
        .create(auth_user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

/// Folders with the number of codes in each
#[utoipa::path(
    get,
    path = "/api/v1/folders",
    tag = "Folders",
    operation_id = "listFolders",
    responses((status = 200, description = "Caller's folders", body = Vec<FolderResponse>)),
    security(("bearerAuth" = []))
)]
pub async fn list_folders(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> ServiceResult<Json<Vec<FolderResponse>>> {
    Ok(Json(state.folder_service.list(auth_user.user_id).await?))
}

/// Rename or recolor
#[utoipa::path(
    patch,
    path = "/api/v1/folders/{id}",
    tag = "Folders",
    operation_id = "updateFolder",
    params(("id" = Uuid, Path, description = "Folder ID")),
    request_body = UpdateFolderRequest,
    responses(
        (status = 200, description = "Updated folder", body = FolderResponse),
        (status = 404, description = "Not found or not owned by the caller")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_folder(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateFolderRequest>,
) -> ServiceResult<Json<FolderResponse>> {
    let folder = state
        .folder_service
        .update(auth_user.user_id, id, request)
        .await?;
    Ok(Json(folder))
}

/// Codes inside are kept and become unfiled
#[utoipa::path(
    delete,
    path = "/api/v1/folders/{id}",
    tag = "Folders",
    operation_id = "deleteFolder",
    params(("id" = Uuid, Path, description = "Folder ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found or not owned by the caller")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_folder(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ServiceResult<StatusCode> {
    state.folder_service.delete(auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
