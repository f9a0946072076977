use artikey_core::AppResult;
use async_trait::async_trait;

/// Durable key-value storage port shared by roles, recovery records, and
/// backend configuration.
///
/// Implementations must serialize concurrent writes to the same key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value for one key.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Inserts or replaces the value for one key.
    async fn put(&self, key: &str, value: &str) -> AppResult<()>;

    /// Removes one key. Missing keys are not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Lists key suffixes below `prefix` in ascending order.
    async fn list(&self, prefix: &str) -> AppResult<Vec<String>>;
}
