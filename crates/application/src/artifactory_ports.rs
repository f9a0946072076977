use std::sync::Arc;
use std::time::Duration;

use artikey_core::AppResult;
use artikey_domain::{BackendConfig, PermissionTargetSpec};
use async_trait::async_trait;

/// Group to create or replace on the external service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDefinition {
    /// Derived group name.
    pub name: String,
    /// Human-readable description naming the owning role.
    pub description: String,
}

/// Permission target bound to a role's group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTargetBinding {
    /// Derived permission target name.
    pub name: String,
    /// Group receiving the granted operations.
    pub group_name: String,
    /// Repository and build sections to grant.
    pub spec: PermissionTargetSpec,
}

/// Scoped token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    /// Principal the token is issued under.
    pub principal: String,
    /// Token scope, bound to the role group.
    pub scope: String,
    /// Requested token lifetime.
    pub ttl: Duration,
    /// Free-form description stored with the token.
    pub description: String,
}

/// Token returned by the external service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedAccessToken {
    /// Opaque bearer token.
    pub access_token: String,
    /// Lifetime reported by the external service, when present.
    pub expires_in: Option<Duration>,
}

/// Port for group, permission target, and token operations on the external
/// artifact repository.
///
/// Every mutation is idempotent; deletes treat a missing resource as success.
#[async_trait]
pub trait ArtifactoryClient: Send + Sync {
    /// Creates the group, or replaces it in place when it already exists.
    async fn create_or_replace_group(&self, group: &GroupDefinition) -> AppResult<()>;

    /// Deletes one group.
    async fn delete_group(&self, name: &str) -> AppResult<()>;

    /// Creates or replaces one permission target.
    async fn create_or_update_permission_target(
        &self,
        target: &PermissionTargetBinding,
    ) -> AppResult<()>;

    /// Deletes one permission target.
    async fn delete_permission_target(&self, name: &str) -> AppResult<()>;

    /// Issues one scoped access token.
    async fn create_token(&self, request: &TokenRequest) -> AppResult<IssuedAccessToken>;
}

/// Builds clients from the persisted backend configuration.
pub trait ArtifactoryClientFactory: Send + Sync {
    /// Builds a client, failing when no usable credentials are configured.
    fn build(&self, config: &BackendConfig) -> AppResult<Arc<dyn ArtifactoryClient>>;
}
