// Embedded PostgreSQL migrations, applied at startup
// diesel_migrations needs a sync connection, so the harness runs on the blocking pool

use diesel::Connection;
use diesel::PgConnection;
use diesel_migrations::MigrationHarness;
use std::error::Error;
use tracing::{debug, info};

use crate::db::MIGRATIONS;

/// Run all pending migrations, returning how many were applied
pub async fn run_migrations(database_url: &str) -> Result<usize, Box<dyn Error + Send + Sync>> {
    info!("[MIGRATIONS] Starting migration process...");

    let database_url = database_url.to_string();

    let applied_count =
        tokio::task::spawn_blocking(move || -> Result<usize, Box<dyn Error + Send + Sync>> {
            let mut conn = PgConnection::establish(&database_url)
                .map_err(|e| format!("Failed to establish sync connection: {}", e))?;

            let applied = conn
                .run_pending_migrations(MIGRATIONS)
                .map_err(|e| format!("Failed to run migrations: {}", e))?;

            for migration in &applied {
                debug!("[MIGRATIONS] Applied migration: {}", migration);
            }

            Ok(applied.len())
        })
        .await
        .map_err(|e| format!("Migration task panicked: {}", e))??;

    if applied_count > 0 {
        info!("[MIGRATIONS] Applied {} migrations", applied_count);
    } else {
        info!("[MIGRATIONS] Schema up to date");
    }

    Ok(applied_count)
}

/// Check if migrations should run based on configuration
pub fn should_run_migrations(config: &crate::app_config::AppConfig) -> bool {
    !config.features.disable_embedded_migrations
}
