use std::collections::BTreeMap;
use std::sync::Arc;

use artikey_application::{
    ArtifactoryClient, ArtifactoryClientFactory, GroupDefinition, IssuedAccessToken,
    PermissionTargetBinding, TokenRequest,
};
use artikey_core::{AppError, AppResult};
use artikey_domain::{ArtifactoryCredentials, BackendConfig, PermissionBlock};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

const API_KEY_HEADER: &str = "X-JFrog-Art-Api";

/// reqwest-based client for the Artifactory REST and Access APIs.
pub struct HttpArtifactoryClient {
    http_client: reqwest::Client,
    artifactory_url: Url,
    access_url: Url,
    credentials: ArtifactoryCredentials,
}

impl HttpArtifactoryClient {
    /// Builds a client from the persisted backend configuration.
    pub fn from_config(config: &BackendConfig) -> AppResult<Self> {
        let credentials = config.credentials()?;
        let (artifactory_url, access_url) = service_urls(config.base_url())?;
        let http_client = reqwest::Client::builder()
            .timeout(config.client_timeout())
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            http_client,
            artifactory_url,
            access_url,
            credentials,
        })
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.http_client.request(method, url);
        match &self.credentials {
            ArtifactoryCredentials::BearerToken(token) => builder.bearer_auth(token),
            ArtifactoryCredentials::ApiKey(api_key) => builder.header(API_KEY_HEADER, api_key),
            ArtifactoryCredentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        }
    }

    fn group_url(&self, name: &str) -> AppResult<Url> {
        join(&self.artifactory_url, &format!("api/security/groups/{name}"))
    }

    fn permission_target_url(&self, name: &str) -> AppResult<Url> {
        join(
            &self.artifactory_url,
            &format!("api/v2/security/permissions/{name}"),
        )
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        action: &str,
    ) -> AppResult<reqwest::Response> {
        builder.send().await.map_err(|error| {
            AppError::External(format!("artifactory {action} request failed: {error}"))
        })
    }

    async fn send_delete(&self, url: Url, action: &str) -> AppResult<()> {
        let response = self.send(self.request(Method::DELETE, url), action).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(action, "resource already absent");
            return Ok(());
        }

        ensure_success(response, action).await.map(|_| ())
    }
}

#[async_trait]
impl ArtifactoryClient for HttpArtifactoryClient {
    async fn create_or_replace_group(&self, group: &GroupDefinition) -> AppResult<()> {
        let url = self.group_url(&group.name)?;
        let lookup_action = format!("lookup of group '{}'", group.name);
        let lookup = self
            .send(self.request(Method::GET, url.clone()), &lookup_action)
            .await?;

        let exists = if lookup.status() == StatusCode::NOT_FOUND {
            false
        } else {
            ensure_success(lookup, &lookup_action).await?;
            true
        };

        // PUT creates a group, POST replaces an existing one in place.
        let (method, verb) = if exists {
            (Method::POST, "update")
        } else {
            (Method::PUT, "create")
        };
        let action = format!("{verb} of group '{}'", group.name);
        let response = self
            .send(
                self.request(method, url).json(&GroupPayload::from(group)),
                &action,
            )
            .await?;
        ensure_success(response, &action).await?;

        debug!(group = %group.name, exists, "group reconciled");
        Ok(())
    }

    async fn delete_group(&self, name: &str) -> AppResult<()> {
        self.send_delete(self.group_url(name)?, &format!("delete of group '{name}'"))
            .await
    }

    async fn create_or_update_permission_target(
        &self,
        target: &PermissionTargetBinding,
    ) -> AppResult<()> {
        let url = self.permission_target_url(&target.name)?;
        let action = format!("upsert of permission target '{}'", target.name);
        let response = self
            .send(
                self.request(Method::PUT, url)
                    .json(&PermissionTargetPayload::from(target)),
                &action,
            )
            .await?;
        ensure_success(response, &action).await?;

        debug!(permission_target = %target.name, "permission target reconciled");
        Ok(())
    }

    async fn delete_permission_target(&self, name: &str) -> AppResult<()> {
        self.send_delete(
            self.permission_target_url(name)?,
            &format!("delete of permission target '{name}'"),
        )
        .await
    }

    async fn create_token(&self, request: &TokenRequest) -> AppResult<IssuedAccessToken> {
        let url = join(&self.access_url, "api/v1/tokens")?;
        let action = format!("token creation for '{}'", request.principal);
        let response = self
            .send(
                self.request(Method::POST, url)
                    .json(&TokenPayload::from(request)),
                &action,
            )
            .await?;
        let response = ensure_success(response, &action).await?;

        let body: TokenResponse = response.json().await.map_err(|error| {
            AppError::External(format!("failed to decode artifactory token response: {error}"))
        })?;

        Ok(IssuedAccessToken {
            access_token: body.access_token,
            expires_in: body.expires_in.map(std::time::Duration::from_secs),
        })
    }
}

/// Builds [`HttpArtifactoryClient`] instances for the client cache.
#[derive(Debug, Default)]
pub struct HttpArtifactoryClientFactory;

impl HttpArtifactoryClientFactory {
    /// Creates a new factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactoryClientFactory for HttpArtifactoryClientFactory {
    fn build(&self, config: &BackendConfig) -> AppResult<Arc<dyn ArtifactoryClient>> {
        Ok(Arc::new(HttpArtifactoryClient::from_config(config)?))
    }
}

/// Derives the Artifactory and Access API roots from a base URL that may or
/// may not already end in `/artifactory`.
fn service_urls(base_url: &str) -> AppResult<(Url, Url)> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let root = trimmed.strip_suffix("/artifactory").unwrap_or(trimmed);
    let root = Url::parse(&format!("{root}/")).map_err(|error| {
        AppError::Validation(format!("invalid artifactory base url '{base_url}': {error}"))
    })?;

    Ok((join(&root, "artifactory/")?, join(&root, "access/")?))
}

fn join(base: &Url, path: &str) -> AppResult<Url> {
    base.join(path)
        .map_err(|error| AppError::Internal(format!("failed to build url for '{path}': {error}")))
}

async fn ensure_success(response: reqwest::Response, action: &str) -> AppResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
    Err(AppError::External(format!(
        "artifactory {action} failed with status {status}: {body}"
    )))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupPayload<'a> {
    name: &'a str,
    description: &'a str,
    auto_join: bool,
    admin_privileges: bool,
}

impl<'a> From<&'a GroupDefinition> for GroupPayload<'a> {
    fn from(group: &'a GroupDefinition) -> Self {
        Self {
            name: group.name.as_str(),
            description: group.description.as_str(),
            auto_join: false,
            admin_privileges: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct PermissionTargetPayload<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    repo: Option<PermissionSectionPayload<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    build: Option<PermissionSectionPayload<'a>>,
}

impl<'a> From<&'a PermissionTargetBinding> for PermissionTargetPayload<'a> {
    fn from(binding: &'a PermissionTargetBinding) -> Self {
        let section = |block: &'a PermissionBlock| PermissionSectionPayload {
            include_patterns: block.include_patterns(),
            exclude_patterns: block.exclude_patterns(),
            repositories: block.repositories(),
            actions: ActionsPayload {
                groups: BTreeMap::from([(
                    binding.group_name.as_str(),
                    block
                        .operations()
                        .iter()
                        .map(|operation| operation.as_str())
                        .collect(),
                )]),
            },
        };

        Self {
            name: binding.name.as_str(),
            repo: binding.spec.repo().map(section),
            build: binding.spec.build().map(section),
        }
    }
}

#[derive(Debug, Serialize)]
struct PermissionSectionPayload<'a> {
    #[serde(rename = "include-patterns", skip_serializing_if = "is_empty")]
    include_patterns: &'a [String],
    #[serde(rename = "exclude-patterns", skip_serializing_if = "is_empty")]
    exclude_patterns: &'a [String],
    repositories: &'a [String],
    actions: ActionsPayload<'a>,
}

#[derive(Debug, Serialize)]
struct ActionsPayload<'a> {
    groups: BTreeMap<&'a str, Vec<&'static str>>,
}

fn is_empty(values: &&[String]) -> bool {
    values.is_empty()
}

#[derive(Debug, Serialize)]
struct TokenPayload<'a> {
    username: &'a str,
    scope: &'a str,
    expires_in: u64,
    token_type: &'static str,
    audience: &'static str,
    description: &'a str,
}

impl<'a> From<&'a TokenRequest> for TokenPayload<'a> {
    fn from(request: &'a TokenRequest) -> Self {
        Self {
            username: request.principal.as_str(),
            scope: request.scope.as_str(),
            expires_in: request.ttl.as_secs(),
            token_type: "access_token",
            audience: "*@*",
            description: request.description.as_str(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use artikey_application::{GroupDefinition, PermissionTargetBinding, TokenRequest};
    use artikey_domain::{BackendConfig, BackendConfigUpdate, parse_permission_targets};
    use reqwest::Method;
    use serde_json::json;

    use super::{
        GroupPayload, HttpArtifactoryClient, PermissionTargetPayload, TokenPayload, service_urls,
    };

    fn client(update: BackendConfigUpdate) -> HttpArtifactoryClient {
        let config = BackendConfig::apply_update(
            None,
            BackendConfigUpdate {
                base_url: Some("https://jfrog.example/artifactory/".to_owned()),
                ..update
            },
        )
        .unwrap_or_else(|_| unreachable!());
        HttpArtifactoryClient::from_config(&config).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn base_url_is_normalized_to_service_roots() {
        for base in [
            "https://jfrog.example",
            "https://jfrog.example/",
            "https://jfrog.example/artifactory",
            "https://jfrog.example/artifactory/",
        ] {
            let (artifactory, access) = service_urls(base).unwrap_or_else(|_| unreachable!());
            assert_eq!(artifactory.as_str(), "https://jfrog.example/artifactory/");
            assert_eq!(access.as_str(), "https://jfrog.example/access/");
        }

        assert!(service_urls("not a url").is_err());
    }

    #[test]
    fn group_payload_disables_auto_join_and_admin() {
        let group = GroupDefinition {
            name: "artikey.abc".to_owned(),
            description: "artikey group for r1".to_owned(),
        };

        assert_eq!(
            serde_json::to_value(GroupPayload::from(&group)).unwrap_or_default(),
            json!({
                "name": "artikey.abc",
                "description": "artikey group for r1",
                "autoJoin": false,
                "adminPrivileges": false
            })
        );
    }

    #[test]
    fn permission_target_payload_binds_operations_to_group() {
        let spec = parse_permission_targets(
            r#"[{"repo":{"include_patterns":["/mytest/**"],"repositories":["repoA"],"operations":["read","write"]}}]"#,
        )
        .unwrap_or_else(|_| unreachable!())
        .remove(0);
        let binding = PermissionTargetBinding {
            name: "artikey.pt0.r1".to_owned(),
            group_name: "artikey.abc".to_owned(),
            spec,
        };

        assert_eq!(
            serde_json::to_value(PermissionTargetPayload::from(&binding)).unwrap_or_default(),
            json!({
                "name": "artikey.pt0.r1",
                "repo": {
                    "include-patterns": ["/mytest/**"],
                    "repositories": ["repoA"],
                    "actions": { "groups": { "artikey.abc": ["read", "write"] } }
                }
            })
        );
    }

    #[test]
    fn token_payload_requests_scoped_access_token() {
        let request = TokenRequest {
            principal: "auto-artikey.r1".to_owned(),
            scope: "applied-permissions/groups:artikey.abc".to_owned(),
            ttl: Duration::from_secs(600),
            description: "Generated by artikey".to_owned(),
        };

        assert_eq!(
            serde_json::to_value(TokenPayload::from(&request)).unwrap_or_default(),
            json!({
                "username": "auto-artikey.r1",
                "scope": "applied-permissions/groups:artikey.abc",
                "expires_in": 600,
                "token_type": "access_token",
                "audience": "*@*",
                "description": "Generated by artikey"
            })
        );
    }

    #[test]
    fn credentials_are_applied_in_precedence_order() {
        let bearer = client(BackendConfigUpdate {
            bearer_token: Some("token".to_owned()),
            api_key: Some("key".to_owned()),
            ..BackendConfigUpdate::default()
        });
        let url = bearer
            .group_url("artikey.abc")
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(
            url.as_str(),
            "https://jfrog.example/artifactory/api/security/groups/artikey.abc"
        );
        let request = bearer
            .request(Method::GET, url.clone())
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(
            request
                .headers()
                .get("authorization")
                .and_then(|value| value.to_str().ok()),
            Some("Bearer token")
        );

        let api_key = client(BackendConfigUpdate {
            api_key: Some("key".to_owned()),
            ..BackendConfigUpdate::default()
        });
        let request = api_key
            .request(Method::GET, url)
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(
            request
                .headers()
                .get("x-jfrog-art-api")
                .and_then(|value| value.to_str().ok()),
            Some("key")
        );
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn missing_credentials_fail_at_build_time() {
        let config = BackendConfig::apply_update(
            None,
            BackendConfigUpdate {
                base_url: Some("https://jfrog.example".to_owned()),
                username: Some("admin".to_owned()),
                ..BackendConfigUpdate::default()
            },
        )
        .unwrap_or_else(|_| unreachable!());

        assert!(HttpArtifactoryClient::from_config(&config).is_err());
    }
}
