use artikey_application::KeyValueStore;
use artikey_core::{AppError, AppResult};
use async_trait::async_trait;
use sqlx::PgPool;

/// PostgreSQL-backed key-value store.
///
/// Writes are single-row upserts, so the database serializes concurrent
/// writers of one key across processes.
#[derive(Clone)]
pub struct PostgresKeyValueStore {
    pool: PgPool,
}

impl PostgresKeyValueStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyValueStore for PostgresKeyValueStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT value
            FROM kv_entries
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to read key '{key}': {error}")))
    }

    async fn put(&self, key: &str, value: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value,
                updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to write key '{key}': {error}")))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM kv_entries
            WHERE key = $1
            "#,
        )
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to delete key '{key}': {error}")))?;

        Ok(())
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        let keys = sqlx::query_scalar::<_, String>(
            r#"
            SELECT key
            FROM kv_entries
            WHERE starts_with(key, $1)
            ORDER BY key
            "#,
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!("failed to list keys under '{prefix}': {error}"))
        })?;

        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(prefix).map(str::to_owned))
            .collect())
    }
}
