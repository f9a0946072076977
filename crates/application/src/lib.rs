//! Application services and ports.

#![forbid(unsafe_code)]

mod artifactory_client_cache;
mod artifactory_ports;
mod backend_config_service;
mod reconciliation_service;
mod recovery_log;
mod role_lock_table;
mod role_store;
mod storage_ports;
mod token_service;

#[cfg(test)]
mod test_support;

pub use artifactory_client_cache::{ArtifactoryClientCache, DEFAULT_CLIENT_CACHE_TTL};
pub use artifactory_ports::{
    ArtifactoryClient, ArtifactoryClientFactory, GroupDefinition, IssuedAccessToken,
    PermissionTargetBinding, TokenRequest,
};
pub use backend_config_service::{BackendConfigService, BackendConfigView};
pub use reconciliation_service::{
    DeleteRoleOutcome, ReconciliationService, RecoveryReport, SaveRoleInput, SaveRoleOutcome,
};
pub use recovery_log::{RecoveryLog, RecoveryRecord};
pub use role_lock_table::{DEFAULT_ROLE_LOCK_BUCKETS, RoleLockTable};
pub use role_store::RoleStore;
pub use storage_ports::KeyValueStore;
pub use token_service::{IssuedToken, TokenService};
