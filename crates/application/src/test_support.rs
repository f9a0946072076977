//! In-process fakes for the application ports.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use artikey_core::{AppError, AppResult};
use artikey_domain::{ArtifactoryCredentials, BackendConfig};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    ArtifactoryClient, ArtifactoryClientFactory, GroupDefinition, IssuedAccessToken,
    KeyValueStore, PermissionTargetBinding, TokenRequest,
};

#[derive(Default)]
pub struct FakeKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
    failing_prefixes: Mutex<Vec<String>>,
}

impl FakeKeyValueStore {
    /// Makes every write to keys starting with `prefix` fail.
    pub async fn fail_writes_to(&self, prefix: &str) {
        self.failing_prefixes.lock().await.push(prefix.to_owned());
    }

    pub async fn heal(&self) {
        self.failing_prefixes.lock().await.clear();
    }

    async fn check_writable(&self, key: &str) -> AppResult<()> {
        let failing = self.failing_prefixes.lock().await;
        if failing.iter().any(|prefix| key.starts_with(prefix.as_str())) {
            return Err(AppError::Storage(format!("write to '{key}' failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FakeKeyValueStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> AppResult<()> {
        self.check_writable(key).await?;
        self.entries
            .lock()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.check_writable(key).await?;
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .await
            .keys()
            .filter_map(|key| key.strip_prefix(prefix))
            .map(str::to_owned)
            .collect())
    }
}

/// One call observed by the fake client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    UpsertGroup(String),
    DeleteGroup(String),
    UpsertPermissionTarget(String),
    DeletePermissionTarget(String),
    CreateToken(String),
}

#[derive(Default)]
pub struct FakeArtifactoryClient {
    groups: Mutex<BTreeMap<String, GroupDefinition>>,
    permission_targets: Mutex<BTreeMap<String, PermissionTargetBinding>>,
    calls: Mutex<Vec<ClientCall>>,
    failing: Mutex<BTreeSet<String>>,
}

impl FakeArtifactoryClient {
    /// Makes every call touching `name` fail until healed.
    pub async fn fail_on(&self, name: &str) {
        self.failing.lock().await.insert(name.to_owned());
    }

    pub async fn heal(&self) {
        self.failing.lock().await.clear();
    }

    pub async fn group_names(&self) -> Vec<String> {
        self.groups.lock().await.keys().cloned().collect()
    }

    pub async fn group(&self, name: &str) -> Option<GroupDefinition> {
        self.groups.lock().await.get(name).cloned()
    }

    pub async fn permission_target_names(&self) -> Vec<String> {
        self.permission_targets.lock().await.keys().cloned().collect()
    }

    pub async fn permission_target(&self, name: &str) -> Option<PermissionTargetBinding> {
        self.permission_targets.lock().await.get(name).cloned()
    }

    pub async fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().await.clone()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    async fn record(&self, call: ClientCall, name: &str) -> AppResult<()> {
        self.calls.lock().await.push(call);
        if self.failing.lock().await.contains(name) {
            return Err(AppError::External(format!("request for '{name}' failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactoryClient for FakeArtifactoryClient {
    async fn create_or_replace_group(&self, group: &GroupDefinition) -> AppResult<()> {
        self.record(ClientCall::UpsertGroup(group.name.clone()), &group.name)
            .await?;
        self.groups
            .lock()
            .await
            .insert(group.name.clone(), group.clone());
        Ok(())
    }

    async fn delete_group(&self, name: &str) -> AppResult<()> {
        self.record(ClientCall::DeleteGroup(name.to_owned()), name)
            .await?;
        self.groups.lock().await.remove(name);
        Ok(())
    }

    async fn create_or_update_permission_target(
        &self,
        target: &PermissionTargetBinding,
    ) -> AppResult<()> {
        self.record(
            ClientCall::UpsertPermissionTarget(target.name.clone()),
            &target.name,
        )
        .await?;
        self.permission_targets
            .lock()
            .await
            .insert(target.name.clone(), target.clone());
        Ok(())
    }

    async fn delete_permission_target(&self, name: &str) -> AppResult<()> {
        self.record(ClientCall::DeletePermissionTarget(name.to_owned()), name)
            .await?;
        self.permission_targets.lock().await.remove(name);
        Ok(())
    }

    async fn create_token(&self, request: &TokenRequest) -> AppResult<IssuedAccessToken> {
        self.record(
            ClientCall::CreateToken(request.principal.clone()),
            &request.principal,
        )
        .await?;
        Ok(IssuedAccessToken {
            access_token: format!("token-for-{}", request.principal),
            expires_in: Some(request.ttl),
        })
    }
}

pub struct FakeArtifactoryClientFactory {
    client: Arc<FakeArtifactoryClient>,
    builds: AtomicUsize,
    built_with: std::sync::Mutex<Vec<ArtifactoryCredentials>>,
}

impl FakeArtifactoryClientFactory {
    pub fn new(client: Arc<FakeArtifactoryClient>) -> Self {
        Self {
            client,
            builds: AtomicUsize::new(0),
            built_with: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Credentials of every client built so far, oldest first.
    pub fn built_with(&self) -> Vec<ArtifactoryCredentials> {
        self.built_with
            .lock()
            .map(|built| built.clone())
            .unwrap_or_default()
    }
}

impl ArtifactoryClientFactory for FakeArtifactoryClientFactory {
    fn build(&self, config: &BackendConfig) -> AppResult<Arc<dyn ArtifactoryClient>> {
        let credentials = config.credentials()?;
        self.builds.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut built) = self.built_with.lock() {
            built.push(credentials);
        }
        Ok(self.client.clone())
    }
}
