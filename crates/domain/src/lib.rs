//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod config;
mod duration_seconds;
mod naming;
mod permission_target;
mod recovery;
mod role;
mod ttl;

pub use config::{
    ArtifactoryCredentials, BackendConfig, BackendConfigUpdate, DEFAULT_CLIENT_TIMEOUT,
    DEFAULT_CONFIG_MAX_TTL,
};
pub use naming::{
    RESOURCE_PREFIX, TOKEN_PRINCIPAL_MAX_LENGTH, TOKEN_PRINCIPAL_PREFIX, group_name, group_scope,
    permission_target_name, token_principal_name,
};
pub use permission_target::{
    Operation, PermissionBlock, PermissionTargetSpec, parse_permission_targets,
};
pub use recovery::RecoveryEntry;
pub use role::{MAX_ROLE_NAME_LENGTH, RoleEntry, RoleId, RoleName};
pub use ttl::{DEFAULT_ROLE_MAX_TTL, DEFAULT_TOKEN_TTL, RoleTtls, resolve_token_ttl};
