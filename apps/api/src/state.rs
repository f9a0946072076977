use std::sync::Arc;

use artikey_application::{BackendConfigService, ReconciliationService, TokenService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub reconciliation_service: ReconciliationService,
    pub token_service: TokenService,
    pub backend_config_service: BackendConfigService,
    pub admin_token: Arc<str>,
}
