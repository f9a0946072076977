use std::sync::Arc;

use artikey_core::{AppError, AppResult};
use artikey_domain::{RoleEntry, RoleName};

use crate::KeyValueStore;

const ROLE_KEY_PREFIX: &str = "roles/";

/// Durable role persistence keyed by normalized role name.
#[derive(Clone)]
pub struct RoleStore {
    store: Arc<dyn KeyValueStore>,
}

impl RoleStore {
    /// Creates a role store over one key-value backend.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Loads one role.
    pub async fn get(&self, name: &RoleName) -> AppResult<Option<RoleEntry>> {
        let Some(value) = self.store.get(&role_key(name)).await? else {
            return Ok(None);
        };

        serde_json::from_str(&value).map(Some).map_err(|error| {
            AppError::Storage(format!("failed to decode role '{name}': {error}"))
        })
    }

    /// Persists one role after checking it is structurally complete.
    pub async fn put(&self, entry: &RoleEntry) -> AppResult<()> {
        entry.validate()?;

        let value = serde_json::to_string(entry).map_err(|error| {
            AppError::Internal(format!(
                "failed to encode role '{}': {error}",
                entry.name()
            ))
        })?;

        self.store.put(&role_key(entry.name()), &value).await
    }

    /// Removes one role. Missing roles are not an error.
    pub async fn delete(&self, name: &RoleName) -> AppResult<()> {
        self.store.delete(&role_key(name)).await
    }

    /// Lists stored role names in ascending order.
    pub async fn list(&self) -> AppResult<Vec<String>> {
        self.store.list(ROLE_KEY_PREFIX).await
    }
}

fn role_key(name: &RoleName) -> String {
    format!("{ROLE_KEY_PREFIX}{name}")
}
