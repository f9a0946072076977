use artikey_application::{BackendConfigView, DeleteRoleOutcome, IssuedToken, SaveRoleOutcome};
use artikey_domain::{BackendConfigUpdate, RoleEntry, permission_target_name};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBackendConfigRequest {
    pub base_url: Option<String>,
    pub bearer_token: Option<String>,
    pub api_key: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_ttl: Option<i64>,
    pub client_timeout: Option<i64>,
}

impl From<UpdateBackendConfigRequest> for BackendConfigUpdate {
    fn from(value: UpdateBackendConfigRequest) -> Self {
        Self {
            base_url: value.base_url,
            bearer_token: value.bearer_token,
            api_key: value.api_key,
            username: value.username,
            password: value.password,
            max_ttl_seconds: value.max_ttl,
            client_timeout_seconds: value.client_timeout,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BackendConfigResponse {
    pub base_url: String,
    pub max_ttl: u64,
    pub client_timeout: u64,
}

impl From<BackendConfigView> for BackendConfigResponse {
    fn from(value: BackendConfigView) -> Self {
        Self {
            base_url: value.base_url,
            max_ttl: value.max_ttl.as_secs(),
            client_timeout: value.client_timeout.as_secs(),
        }
    }
}

/// Role write payload. `permission_targets` is normally the JSON text itself;
/// a JSON array is accepted too and stored as its serialized text.
#[derive(Debug, Default, Deserialize)]
pub struct SaveRoleRequest {
    pub token_ttl: Option<i64>,
    pub max_ttl: Option<i64>,
    pub permission_targets: Option<Value>,
}

impl SaveRoleRequest {
    pub fn raw_permission_targets(&self) -> Option<String> {
        match &self.permission_targets {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => Some(raw.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveRoleResponse {
    pub role_id: String,
    pub role_name: String,
    pub permission_targets: Vec<String>,
    pub warnings: Vec<String>,
}

impl From<SaveRoleOutcome> for SaveRoleResponse {
    fn from(value: SaveRoleOutcome) -> Self {
        let role = value.role;
        let permission_targets = (0..role.permission_targets().len())
            .map(|index| permission_target_name(role.name(), index))
            .collect();

        Self {
            role_id: role.role_id().as_str().to_owned(),
            role_name: role.name().as_str().to_owned(),
            permission_targets,
            warnings: value.warnings,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub name: String,
    pub role_id: String,
    pub token_ttl: u64,
    pub max_ttl: u64,
    pub permission_targets: String,
}

impl From<RoleEntry> for RoleResponse {
    fn from(value: RoleEntry) -> Self {
        Self {
            name: value.name().as_str().to_owned(),
            role_id: value.role_id().as_str().to_owned(),
            token_ttl: value.token_ttl().as_secs(),
            max_ttl: value.max_ttl().as_secs(),
            permission_targets: value.raw_permission_targets().to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoleListResponse {
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteRoleResponse {
    pub warnings: Vec<String>,
}

impl From<DeleteRoleOutcome> for DeleteRoleResponse {
    fn from(value: DeleteRoleOutcome) -> Self {
        Self {
            warnings: value.warnings,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IssueTokenRequest {
    /// Requested lifetime in seconds; zero or absent takes the role default.
    pub ttl: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct IssueTokenResponse {
    pub access_token: String,
    pub username: String,
    pub expires_in: u64,
}

impl From<IssuedToken> for IssueTokenResponse {
    fn from(value: IssuedToken) -> Self {
        Self {
            access_token: value.access_token,
            username: value.username,
            expires_in: value.expires_in.as_secs(),
        }
    }
}
