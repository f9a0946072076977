use std::sync::Arc;

use artikey_core::{AppError, AppResult};
use artikey_domain::{RecoveryEntry, RoleName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::KeyValueStore;

const RECOVERY_KEY_PREFIX: &str = "wal/";

/// Persisted recovery log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryRecord {
    /// Record identifier, also the storage key suffix.
    pub id: Uuid,
    /// Time the record was appended.
    pub created_at: DateTime<Utc>,
    /// Resource the record protects.
    pub entry: RecoveryEntry,
}

/// Write-ahead log of external resources that may exist without a committed
/// role referencing them.
///
/// Records are keyed independently from roles so a role write never has to
/// update both atomically.
#[derive(Clone)]
pub struct RecoveryLog {
    store: Arc<dyn KeyValueStore>,
}

impl RecoveryLog {
    /// Creates a recovery log over one key-value backend.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Durably appends one record and returns it.
    pub async fn append(&self, entry: RecoveryEntry) -> AppResult<RecoveryRecord> {
        let record = RecoveryRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            entry,
        };

        let value = serde_json::to_string(&record).map_err(|error| {
            AppError::Internal(format!("failed to encode recovery record: {error}"))
        })?;
        self.store.put(&record_key(record.id), &value).await?;

        Ok(record)
    }

    /// Loads one record.
    pub async fn get(&self, id: Uuid) -> AppResult<Option<RecoveryRecord>> {
        let Some(value) = self.store.get(&record_key(id)).await? else {
            return Ok(None);
        };

        serde_json::from_str(&value).map(Some).map_err(|error| {
            AppError::Storage(format!("failed to decode recovery record '{id}': {error}"))
        })
    }

    /// Lists every readable record, oldest first.
    ///
    /// Records that cannot be decoded are skipped with a warning and left in
    /// storage for inspection.
    pub async fn list(&self) -> AppResult<Vec<RecoveryRecord>> {
        let mut records = Vec::new();

        for suffix in self.store.list(RECOVERY_KEY_PREFIX).await? {
            let Ok(id) = Uuid::parse_str(&suffix) else {
                warn!(key = %suffix, "skipping recovery record with invalid key");
                continue;
            };

            match self.get(id).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(error) => warn!(record_id = %id, error = %error, "skipping recovery record"),
            }
        }

        records.sort_by(|left, right| {
            left.created_at
                .cmp(&right.created_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(records)
    }

    /// Lists the records belonging to one role, oldest first.
    pub async fn list_for_role(&self, role_name: &RoleName) -> AppResult<Vec<RecoveryRecord>> {
        let mut records = self.list().await?;
        records.retain(|record| record.entry.role_name() == role_name);
        Ok(records)
    }

    /// Removes one record. Missing records are not an error.
    pub async fn remove(&self, id: Uuid) -> AppResult<()> {
        self.store.delete(&record_key(id)).await
    }
}

fn record_key(id: Uuid) -> String {
    format!("{RECOVERY_KEY_PREFIX}{id}")
}
