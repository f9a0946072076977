use artikey_domain::RoleName;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, MutexGuard};

/// Bucket count used when none is configured.
pub const DEFAULT_ROLE_LOCK_BUCKETS: usize = 256;

/// Fixed table of striped locks serializing work on one role.
///
/// Two roles may share a bucket; that only costs parallelism. Locking is
/// process-local, so cross-process safety relies on the key-value store
/// serializing writes to the same key.
pub struct RoleLockTable {
    buckets: Vec<Mutex<()>>,
}

impl RoleLockTable {
    /// Creates a table with `bucket_count` locks, at least one.
    #[must_use]
    pub fn new(bucket_count: usize) -> Self {
        let buckets = (0..bucket_count.max(1)).map(|_| Mutex::new(())).collect();
        Self { buckets }
    }

    /// Returns the number of lock buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Waits for the lock guarding `role_name`.
    pub async fn lock(&self, role_name: &RoleName) -> MutexGuard<'_, ()> {
        self.buckets[self.bucket_index(role_name)].lock().await
    }

    fn bucket_index(&self, role_name: &RoleName) -> usize {
        let digest = Sha256::digest(role_name.as_str().as_bytes());
        let mut prefix = [0_u8; 8];
        prefix.copy_from_slice(&digest[..8]);

        let bucket_count = u64::try_from(self.buckets.len()).unwrap_or(u64::MAX);
        usize::try_from(u64::from_be_bytes(prefix) % bucket_count).unwrap_or_default()
    }
}

impl Default for RoleLockTable {
    fn default() -> Self {
        Self::new(DEFAULT_ROLE_LOCK_BUCKETS)
    }
}
