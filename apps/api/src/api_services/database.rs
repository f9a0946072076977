use std::sync::Arc;

use artikey_application::KeyValueStore;
use artikey_core::AppError;
use artikey_infrastructure::{InMemoryKeyValueStore, PostgresKeyValueStore};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::api_config::{ApiConfig, StorageBackend};

pub async fn connect_and_migrate(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    Ok(pool)
}

pub async fn build_key_value_store(config: &ApiConfig) -> Result<Arc<dyn KeyValueStore>, AppError> {
    match (config.storage_backend, config.database_url.as_deref()) {
        (StorageBackend::Postgres, Some(database_url)) => {
            let pool = connect_and_migrate(database_url).await?;
            Ok(Arc::new(PostgresKeyValueStore::new(pool)))
        }
        (StorageBackend::Postgres, None) => Err(AppError::Validation(
            "DATABASE_URL is required".to_owned(),
        )),
        (StorageBackend::Memory, _) => {
            info!("using in-memory storage, state is lost on restart");
            Ok(Arc::new(InMemoryKeyValueStore::new()))
        }
    }
}
