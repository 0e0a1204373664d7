//! Application entry point for the `iot-sensor-api` service.
//!
//! Startup order: `.env` and tracing, configuration, database pool, sensor
//! tables, then the router is bound and served until Ctrl-C or SIGTERM.
//!
//! # Environment Variables
//! - `DATABASE_URL` – PostgreSQL connection string, or the discrete
//!   `DB_USERNAME` / `DB_PASSWORD` / `DB_HOSTNAME` / `DB_PORT` / `DB_DATABASE`
//! - `PORT` (optional) – HTTP listen port (default: 8080)
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
//! - `API_PREFIX` (optional) – route prefix (default: `/api/iot-sf`)
//! - logging knobs are listed in `telemetry.rs`
use std::net::SocketAddr;

use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;

use anyhow::{Context, Result};

mod config;
mod models;
mod repository;
mod response;
mod routes;
mod schema;
mod sensors;
mod service;
mod telemetry;
mod validation;

pub use config::Config;

// Re-exported for routes/*.rs so they depend on their parent module only.
pub use repository::{PgRepository, ReadingRepository};
pub use response::ApiResponse;

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    telemetry::init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Attempting to connect to {}", cfg.db_display);

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect_with(cfg.db_options.clone())
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Successfully connected to database");

    schema::create_schema(&pool).await?;
    tracing::info!("Sensor tables ready: {}", sensors::SENSORS.len());

    let app: Router = routes::router(PgRepository::new(pool.clone()), &cfg);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

// ---

/// Resolve when the process receives Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    // ---
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
