// Application state and router assembly
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::{
    app_config::AppConfig,
    db::{DieselPool, RedirectStore},
    handlers,
    middleware::{auth_middleware, dynamic_cors_middleware, require_admin},
    services::{
        AdminService, AnalyticsService, FolderService, GeoLocator, JwtService,
        PasswordGateService, QrCodeService, RedirectService,
    },
};

// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub diesel_pool: DieselPool,
    pub jwt_service: Arc<JwtService>,
    pub redirect_service: RedirectService,
    pub password_gate: PasswordGateService,
    pub qr_code_service: QrCodeService,
    pub folder_service: FolderService,
    pub analytics_service: AnalyticsService,
    pub admin_service: AdminService,
}

impl AppState {
    /// Wire every service. The resolver and password gate only see `store`,
    /// so tests can swap the database out for those paths.
    pub fn new(
        config: Arc<AppConfig>,
        diesel_pool: DieselPool,
        store: Arc<dyn RedirectStore>,
        geo: Arc<dyn GeoLocator>,
    ) -> Self {
        let jwt_service = Arc::new(JwtService::from_app_config(&config));

        Self {
            redirect_service: RedirectService::new(
                store.clone(),
                geo,
                jwt_service.clone(),
                config.clone(),
            ),
            password_gate: PasswordGateService::new(store, jwt_service.clone()),
            qr_code_service: QrCodeService::new(diesel_pool.clone(), config.clone()),
            folder_service: FolderService::new(diesel_pool.clone()),
            analytics_service: AnalyticsService::new(diesel_pool.clone()),
            admin_service: AdminService::new(diesel_pool.clone(), config.clone()),
            jwt_service,
            diesel_pool,
            config,
        }
    }
}

/// Full HTTP surface: public scan routes, the dashboard API and admin
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/qr-codes", handlers::qr_code_routes())
        .nest("/folders", handlers::folder_routes())
        .nest("/analytics", handlers::analytics_routes())
        .nest(
            "/admin",
            handlers::admin_routes().route_layer(middleware::from_fn(require_admin)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .route(
            "/qr/verify-password",
            post(handlers::redirect::verify_password),
        )
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            dynamic_cors_middleware,
        ));

    let mut router = Router::new()
        .merge(handlers::public_routes())
        .nest("/api/v1", api)
        .route("/health", get(handlers::health::health_check));

    if state.config.features.enable_metrics {
        router = router.route("/metrics", get(handlers::health::metrics));
    }

    if state.config.features.enable_api_docs {
        router = router.route("/api-docs/openapi.json", get(handlers::docs::serve_openapi_spec));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
