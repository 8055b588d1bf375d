use anyhow::Context;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinema_booking::{
    app,
    config::{Config, LogFormat},
    database::Database,
    AppState,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("invalid configuration")?;

    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log));
    match config.app.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    info!(environment = %config.app.environment, "Starting cinema booking API");

    // Connect to the database
    let db = Database::new(&config.database.url, config.database.pool_size)
        .await
        .context("failed to connect to database")?;
    info!("Database connected");

    // Run migrations
    db.run_migrations()
        .await
        .context("failed to run migrations")?;

    tokio::fs::create_dir_all(&config.media.root)
        .await
        .with_context(|| format!("failed to create media root {}", config.media.root.display()))?;

    let ip = config
        .app
        .host
        .parse()
        .with_context(|| format!("HOST is not an IP address: {}", config.app.host))?;
    let addr = SocketAddr::new(ip, config.app.port);

    let app_state = AppState::new(db, config);
    let router = app(app_state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
