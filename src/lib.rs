// Library exports for the QR redirect service
// The binary in main.rs only wires configuration, the pool and the listener.

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::{build_router, AppState};
pub use app_config::AppConfig;
pub use db::{DieselPool, DieselRedirectStore, RedirectStore, RedirectTarget, StoreError};
pub use middleware::AuthenticatedUser;
pub use services::{
    AccessDecision, DenyReason, GeoLocation, GeoLocator, HttpGeoLocator, JwtService,
    RedirectOutcome, RedirectService, ScanRequestContext,
};
pub use utils::service_error::{ServiceError, ServiceResult};
