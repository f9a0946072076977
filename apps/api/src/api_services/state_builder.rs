use std::sync::Arc;
use std::time::Duration;

use artikey_application::{
    ArtifactoryClientCache, ArtifactoryClientFactory, BackendConfigService, KeyValueStore,
    ReconciliationService, RecoveryLog, RoleLockTable, RoleStore, TokenService,
};

use crate::state::AppState;

/// Wires the application services around one key-value store.
pub fn build_app_state(
    store: Arc<dyn KeyValueStore>,
    client_factory: Arc<dyn ArtifactoryClientFactory>,
    client_cache_ttl: Duration,
    role_lock_buckets: usize,
    admin_token: String,
) -> AppState {
    let client_cache = Arc::new(ArtifactoryClientCache::new(client_factory, client_cache_ttl));
    let backend_config_service = BackendConfigService::new(store.clone(), client_cache);
    let role_store = RoleStore::new(store.clone());
    let reconciliation_service = ReconciliationService::new(
        role_store.clone(),
        RecoveryLog::new(store),
        Arc::new(RoleLockTable::new(role_lock_buckets)),
        backend_config_service.clone(),
    );
    let token_service = TokenService::new(role_store, backend_config_service.clone());

    AppState {
        reconciliation_service,
        token_service,
        backend_config_service,
        admin_token: Arc::from(admin_token),
    }
}
