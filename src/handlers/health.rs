// Liveness and metrics endpoints

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::time::Instant;

use crate::{app::AppState, db, services::metrics as scan_metrics};

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();
    let started = Instant::now();

    let (healthy, postgres) = match db::check_diesel_health(&state.diesel_pool).await {
        Ok(()) => (
            true,
            serde_json::json!({
                "status": "healthy",
                "latency_ms": started.elapsed().as_millis() as u64,
                "max_connections": state.config.database.max_connections,
                "error": null
            }),
        ),
        Err(e) => (
            false,
            serde_json::json!({
                "status": "unhealthy",
                "error": format!("Database connection failed: {}", e)
            }),
        ),
    };

    let response = serde_json::json!({
        "status": if healthy { "healthy" } else { "degraded" },
        "service": "qr-redirect-service",
        "environment": state.config.environment.to_string(),
        "timestamp": timestamp,
        "components": {
            "postgresql": postgres
        }
    });

    if healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// GET /metrics
pub async fn metrics() -> Response {
    match scan_metrics::render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to render metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}
