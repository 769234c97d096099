use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qr_redirect_service::{
    app::{build_router, AppState},
    app_config::AppConfig,
    db::{self, DieselDatabaseConfig, DieselRedirectStore},
    migrations,
    services::HttpGeoLocator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before anything reads them
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qr_redirect_service=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AppConfig::from_env().context("Invalid configuration")?);
    info!(
        "Starting QR redirect service ({}) on {}",
        config.environment, config.server.bind_address
    );

    let db_config = DieselDatabaseConfig::from(&config.database);
    info!("Database URL: {}", db::mask_connection_string(&db_config.url));
    let diesel_pool = db::create_diesel_pool(db_config)
        .await
        .context("Database initialization failed")?;

    if migrations::should_run_migrations(&config) {
        migrations::run_migrations(&config.database.url)
            .await
            .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    } else {
        warn!("Embedded migrations disabled; assuming the schema is current");
    }

    let geo = HttpGeoLocator::new(&config.attribution).context("Geolocation client setup failed")?;
    let store = DieselRedirectStore::new(diesel_pool.clone());
    let state = AppState::new(config.clone(), diesel_pool, Arc::new(store), Arc::new(geo));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;

    info!("Listening on {}", config.server.bind_address);
    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
