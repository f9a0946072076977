use std::time::Duration;

use artikey_core::{AppError, AppResult};
use artikey_domain::{
    RESOURCE_PREFIX, RoleName, group_name, group_scope, resolve_token_ttl, token_principal_name,
};
use tracing::info;

use crate::{BackendConfigService, RoleStore, TokenRequest};

/// Token handed back to the caller. Nothing about it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Opaque bearer token.
    pub access_token: String,
    /// Principal the token was issued under.
    pub username: String,
    /// Effective token lifetime.
    pub expires_in: Duration,
}

/// Application service issuing scoped tokens for stored roles.
#[derive(Clone)]
pub struct TokenService {
    roles: RoleStore,
    backend: BackendConfigService,
}

impl TokenService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(roles: RoleStore, backend: BackendConfigService) -> Self {
        Self { roles, backend }
    }

    /// Issues a token for `role_name`.
    ///
    /// A zero or missing `ttl` takes the role default. Lifetimes above the
    /// role maximum are rejected before the external service is contacted.
    pub async fn issue_token(
        &self,
        role_name: &str,
        ttl: Option<Duration>,
    ) -> AppResult<IssuedToken> {
        let role_name = RoleName::parse(role_name)?;
        let role = self
            .roles
            .get(&role_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' is not recognized")))?;

        let ttl = resolve_token_ttl(ttl, &role)?;
        let principal = token_principal_name(role.name());
        let client = self.backend.client().await?;

        let issued = client
            .create_token(&TokenRequest {
                principal: principal.clone(),
                scope: group_scope(&group_name(role.role_id())),
                ttl,
                description: format!("Generated by {RESOURCE_PREFIX}"),
            })
            .await?;

        info!(
            role_name = %role_name,
            principal = %principal,
            ttl_seconds = ttl.as_secs(),
            "token issued"
        );

        Ok(IssuedToken {
            access_token: issued.access_token,
            username: principal,
            expires_in: issued.expires_in.unwrap_or(ttl),
        })
    }
}
