//! Artikey API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use artikey_core::AppError;
use artikey_infrastructure::HttpArtifactoryClientFactory;
use tracing::{info, warn};

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_services::{build_app_state, build_key_value_store, connect_and_migrate};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    if config.migrate_only {
        if let Some(database_url) = config.database_url.as_deref() {
            connect_and_migrate(database_url).await?;
        }
        info!("migrations applied");
        return Ok(());
    }

    let store = build_key_value_store(&config).await?;
    let app_state = build_app_state(
        store,
        Arc::new(HttpArtifactoryClientFactory::new()),
        config.client_cache_ttl,
        config.role_lock_buckets,
        config.admin_token.clone(),
    );

    match app_state
        .reconciliation_service
        .replay_recovery_log(config.recovery_min_age)
        .await
    {
        Ok(report) => {
            for warning in &report.warnings {
                warn!(warning = %warning, "startup recovery warning");
            }
            info!(
                replayed = report.replayed,
                retained = report.retained,
                "startup recovery sweep finished"
            );
        }
        Err(error) => warn!(error = %error, "startup recovery sweep failed"),
    }

    let app = api_router::build_router(app_state);
    let address = config.socket_address()?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, storage = ?config.storage_backend, "artikey-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
