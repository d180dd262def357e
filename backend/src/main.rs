//! Main entry point for the NodeChat backend.
//!
//! This file initializes logging and configuration, sets up the database,
//! bootstraps the admin account and serves the API with Axum.

mod api;
mod auth;
mod config;
mod database;
mod errors;
mod repositories;
mod services;
mod state;
mod utils;

use anyhow::Context;
use config::Config;
use database::Database;
use services::user_service::UserService;
use state::AppState;
use tracing::info;
use tracing_subscriber::fmt::init;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();

    let config = Config::from_env()?;
    let db = Database::new(&config)
        .await
        .context("Failed to initialize database")?;
    let pool = db.pool().clone();

    if let Some(admin) = &config.admin {
        UserService::new(pool.clone())
            .ensure_admin_user(admin)
            .await
            .context("Failed to bootstrap admin user")?;
    }

    let state = AppState::new(pool, &config).context("Failed to build application state")?;
    if state.e2e.is_none() {
        info!("E2E token issuer not configured; logins will not carry E2E tokens");
    }

    let app = api::router(state);

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    info!("Starting NodeChat server on port {}", config.server_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
