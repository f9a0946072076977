use std::sync::Arc;
use std::time::{Duration, Instant};

use artikey_core::AppResult;
use artikey_domain::BackendConfig;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{ArtifactoryClient, ArtifactoryClientFactory};

/// Lifetime of a cached client when none is configured.
pub const DEFAULT_CLIENT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

struct CachedClient {
    client: Arc<dyn ArtifactoryClient>,
    expires_at: Instant,
}

/// Process-wide client shared by all requests, rebuilt when it expires or
/// when the backend configuration changes.
pub struct ArtifactoryClientCache {
    factory: Arc<dyn ArtifactoryClientFactory>,
    ttl: Duration,
    cached: RwLock<Option<CachedClient>>,
}

impl ArtifactoryClientCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(factory: Arc<dyn ArtifactoryClientFactory>, ttl: Duration) -> Self {
        Self {
            factory,
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Returns the cached client, building one when the cache is empty or
    /// expired.
    ///
    /// `load_config` is only awaited under the write lock, so a rebuild never
    /// races [`Self::invalidate`] with configuration read before it.
    pub async fn client<F>(&self, load_config: F) -> AppResult<Arc<dyn ArtifactoryClient>>
    where
        F: Future<Output = AppResult<BackendConfig>>,
    {
        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref()
                && entry.expires_at > Instant::now()
            {
                return Ok(Arc::clone(&entry.client));
            }
        }

        let mut cached = self.cached.write().await;
        if let Some(entry) = cached.as_ref()
            && entry.expires_at > Instant::now()
        {
            return Ok(Arc::clone(&entry.client));
        }

        let config = load_config.await?;
        debug!(base_url = %config.base_url(), "building artifactory client");
        let client = self.factory.build(&config)?;
        let now = Instant::now();
        *cached = Some(CachedClient {
            client: Arc::clone(&client),
            expires_at: now.checked_add(self.ttl).unwrap_or(now),
        });

        Ok(client)
    }

    /// Drops the cached client so the next call rebuilds it.
    pub async fn invalidate(&self) {
        self.cached.write().await.take();
    }
}
