// Scan analytics API

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::AuthenticatedUser,
    models::{AnalyticsOverview, AnalyticsQuery, QrAnalytics},
    utils::service_error::ServiceResult,
};

/// Totals, breakdowns and daily series across the caller's codes
#[utoipa::path(
    get,
    path = "/api/v1/analytics/overview",
    tag = "Analytics",
    operation_id = "analyticsOverview",
    params(AnalyticsQuery),
    responses((status = 200, description = "Account-wide analytics", body = AnalyticsOverview)),
    security(("bearerAuth" = []))
)]
pub async fn overview(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(query): Query<AnalyticsQuery>,
) -> ServiceResult<Json<AnalyticsOverview>> {
    Ok(Json(
        state
            .analytics_service
            .overview(auth_user.user_id, query)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/qr-codes/{id}/analytics",
    tag = "Analytics",
    operation_id = "qrCodeAnalytics",
    params(
        ("id" = Uuid, Path, description = "QR code ID"),
        AnalyticsQuery
    ),
    responses(
        (status = 200, description = "Analytics for one code", body = QrAnalytics),
        (status = 404, description = "Not found or not owned by the caller")
    ),
    security(("bearerAuth" = []))
)]
pub async fn qr_code_analytics(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<AnalyticsQuery>,
) -> ServiceResult<Json<QrAnalytics>> {
    Ok(Json(
        state
            .analytics_service
            .qr_analytics(auth_user.user_id, id, query)
            .await?,
    ))
}
