use std::sync::Arc;
use std::time::Duration;

use artikey_core::{AppError, AppResult};
use artikey_domain::{BackendConfig, BackendConfigUpdate};
use tracing::info;

use crate::{ArtifactoryClient, ArtifactoryClientCache, KeyValueStore};

const CONFIG_KEY: &str = "config";

/// Backend configuration as shown to operators; secrets are never echoed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfigView {
    /// External service base URL.
    pub base_url: String,
    /// Backend token lifetime ceiling.
    pub max_ttl: Duration,
    /// HTTP timeout for external calls.
    pub client_timeout: Duration,
}

impl From<&BackendConfig> for BackendConfigView {
    fn from(config: &BackendConfig) -> Self {
        Self {
            base_url: config.base_url().to_owned(),
            max_ttl: config.max_ttl(),
            client_timeout: config.client_timeout(),
        }
    }
}

/// Application service owning the persisted backend configuration and the
/// client built from it.
#[derive(Clone)]
pub struct BackendConfigService {
    store: Arc<dyn KeyValueStore>,
    client_cache: Arc<ArtifactoryClientCache>,
}

impl BackendConfigService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, client_cache: Arc<ArtifactoryClientCache>) -> Self {
        Self {
            store,
            client_cache,
        }
    }

    /// Returns the stored configuration, if any.
    pub async fn find(&self) -> AppResult<Option<BackendConfig>> {
        let Some(value) = self.store.get(CONFIG_KEY).await? else {
            return Ok(None);
        };

        serde_json::from_str(&value)
            .map(Some)
            .map_err(|error| AppError::Storage(format!("failed to decode backend config: {error}")))
    }

    /// Returns the stored configuration or a validation error when the
    /// backend has not been configured.
    pub async fn require(&self) -> AppResult<BackendConfig> {
        self.find().await?.ok_or_else(|| {
            AppError::Validation("backend configuration has not been set up".to_owned())
        })
    }

    /// Returns the redacted view of the stored configuration.
    pub async fn read(&self) -> AppResult<Option<BackendConfigView>> {
        Ok(self.find().await?.as_ref().map(BackendConfigView::from))
    }

    /// Merges `update` into the stored configuration and drops the cached
    /// client so new credentials take effect on the next call.
    pub async fn write(&self, update: BackendConfigUpdate) -> AppResult<BackendConfigView> {
        let config = BackendConfig::apply_update(self.find().await?, update)?;
        let value = serde_json::to_string(&config).map_err(|error| {
            AppError::Internal(format!("failed to encode backend config: {error}"))
        })?;

        self.store.put(CONFIG_KEY, &value).await?;
        self.client_cache.invalidate().await;
        info!(base_url = %config.base_url(), "backend configuration updated");

        Ok(BackendConfigView::from(&config))
    }

    /// Returns a client for the stored configuration.
    ///
    /// A rebuild reads the configuration while holding the cache lock, so a
    /// concurrent [`Self::write`] is never undone by a stale rebuild.
    pub async fn client(&self) -> AppResult<Arc<dyn ArtifactoryClient>> {
        self.client_cache.client(self.require()).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use artikey_core::AppError;
    use artikey_domain::{ArtifactoryCredentials, BackendConfigUpdate};

    use crate::test_support::{
        FakeArtifactoryClient, FakeArtifactoryClientFactory, FakeKeyValueStore,
    };
    use crate::{ArtifactoryClientCache, KeyValueStore};

    use super::BackendConfigService;

    fn service() -> (
        BackendConfigService,
        Arc<FakeKeyValueStore>,
        Arc<FakeArtifactoryClientFactory>,
    ) {
        let store = Arc::new(FakeKeyValueStore::default());
        let factory = Arc::new(FakeArtifactoryClientFactory::new(Arc::new(
            FakeArtifactoryClient::default(),
        )));
        let cache = Arc::new(ArtifactoryClientCache::new(
            factory.clone(),
            Duration::from_secs(600),
        ));
        (
            BackendConfigService::new(store.clone(), cache),
            store,
            factory,
        )
    }

    #[tokio::test]
    async fn unconfigured_backend_is_rejected() {
        let (service, _, _) = service();

        assert_eq!(service.read().await.unwrap_or_default(), None);
        match service.client().await {
            Err(AppError::Validation(message)) => {
                assert_eq!(message, "backend configuration has not been set up");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected a validation error"),
        }
    }

    #[tokio::test]
    async fn write_hides_secrets_and_invalidates_client() {
        let (service, store, factory) = service();

        let view = service
            .write(BackendConfigUpdate {
                base_url: Some("https://artifactory.example".to_owned()),
                bearer_token: Some("first-token".to_owned()),
                ..BackendConfigUpdate::default()
            })
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(view.base_url, "https://artifactory.example");
        assert_eq!(view.max_ttl, Duration::from_secs(3600));

        assert!(service.client().await.is_ok());
        assert!(service.client().await.is_ok());
        assert_eq!(factory.build_count(), 1);

        service
            .write(BackendConfigUpdate {
                bearer_token: Some("second-token".to_owned()),
                ..BackendConfigUpdate::default()
            })
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(service.client().await.is_ok());
        assert_eq!(factory.build_count(), 2);

        let stored = store.get("config").await.unwrap_or_default().unwrap_or_default();
        assert!(stored.contains("second-token"));
        let shown = format!("{:?}", service.read().await.unwrap_or_default());
        assert!(!shown.contains("second-token"));
    }

    #[tokio::test]
    async fn missing_credentials_fail_at_client_build() {
        let (service, _, factory) = service();
        service
            .write(BackendConfigUpdate {
                base_url: Some("https://artifactory.example".to_owned()),
                ..BackendConfigUpdate::default()
            })
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(service.client().await.is_err());
        assert_eq!(factory.build_count(), 0);
    }

    #[tokio::test]
    async fn client_rebuilt_after_concurrent_write_uses_rotated_credentials() {
        let (service, _, factory) = service();
        service
            .write(BackendConfigUpdate {
                base_url: Some("https://artifactory.example".to_owned()),
                bearer_token: Some("old-token".to_owned()),
                ..BackendConfigUpdate::default()
            })
            .await
            .unwrap_or_else(|_| unreachable!());

        let rotate = service.write(BackendConfigUpdate {
            bearer_token: Some("new-token".to_owned()),
            ..BackendConfigUpdate::default()
        });
        let (built, rotated) = tokio::join!(service.client(), rotate);
        assert!(built.is_ok());
        assert!(rotated.is_ok());

        assert!(service.client().await.is_ok());
        assert!(service.client().await.is_ok());
        assert_eq!(
            factory.built_with().last(),
            Some(&ArtifactoryCredentials::BearerToken("new-token".to_owned()))
        );
    }
}
