// HTTP handlers and route builders

pub mod admin;
pub mod analytics;
pub mod docs;
pub mod folders;
pub mod health;
pub mod qr_codes;
pub mod redirect;

use crate::app::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};

// Scan resolution and the pages it redirects to
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/r/{slug}", get(redirect::resolve_scan))
        .route("/r/{slug}/verify", get(redirect::challenge_page))
        .route("/expired", get(redirect::expired_page))
        .route("/view/{slug}", get(redirect::landing_page))
        .route("/view/{slug}/contact.vcf", get(redirect::download_vcard))
}

// QR code management
pub fn qr_code_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(qr_codes::create_qr_code).get(qr_codes::list_qr_codes))
        .route("/bulk", post(qr_codes::bulk_action))
        .route(
            "/{id}",
            get(qr_codes::get_qr_code)
                .put(qr_codes::update_qr_code)
                .delete(qr_codes::delete_qr_code),
        )
        .route("/{id}/toggle-status", patch(qr_codes::toggle_status))
        .route("/{id}/toggle-favorite", patch(qr_codes::toggle_favorite))
        .route("/{id}/analytics", get(analytics::qr_code_analytics))
}

pub fn folder_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(folders::create_folder).get(folders::list_folders))
        .route(
            "/{id}",
            patch(folders::update_folder).delete(folders::delete_folder),
        )
}

pub fn analytics_routes() -> Router<AppState> {
    Router::new().route("/overview", get(analytics::overview))
}

// Administrator-only; the caller adds the role check
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(admin::stats))
        .route("/users", get(admin::list_users))
        .route("/qr-codes", get(admin::list_qr_codes))
        .route("/qr-codes/{id}/toggle", patch(admin::force_toggle))
}
