use std::fmt::{Debug, Formatter};
use std::time::Duration;

use artikey_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Backend-wide token lifetime ceiling applied when none is configured.
pub const DEFAULT_CONFIG_MAX_TTL: Duration = Duration::from_secs(3600);

/// HTTP timeout for the external service applied when none is configured.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials used to talk to the external artifact repository.
#[derive(Clone, PartialEq, Eq)]
pub enum ArtifactoryCredentials {
    /// Access token sent as a bearer token.
    BearerToken(String),
    /// Legacy API key header.
    ApiKey(String),
    /// HTTP basic authentication.
    Basic {
        /// Account name.
        username: String,
        /// Account password.
        password: String,
    },
}

impl Debug for ArtifactoryCredentials {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BearerToken(_) => formatter.write_str("BearerToken(<redacted>)"),
            Self::ApiKey(_) => formatter.write_str("ApiKey(<redacted>)"),
            Self::Basic { username, .. } => formatter
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Persisted connection settings for the external artifact repository.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    base_url: NonEmptyString,
    #[serde(default)]
    bearer_token: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(with = "crate::duration_seconds")]
    max_ttl: Duration,
    #[serde(with = "crate::duration_seconds")]
    client_timeout: Duration,
}

/// Partial update applied on a config write. Missing fields keep their
/// stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendConfigUpdate {
    /// Artifactory base URL.
    pub base_url: Option<String>,
    /// Bearer token with permission to manage groups and issue tokens.
    pub bearer_token: Option<String>,
    /// API key alternative to the bearer token.
    pub api_key: Option<String>,
    /// Username for basic authentication.
    pub username: Option<String>,
    /// Password for basic authentication.
    pub password: Option<String>,
    /// Backend token lifetime ceiling in seconds.
    pub max_ttl_seconds: Option<i64>,
    /// HTTP timeout in seconds.
    pub client_timeout_seconds: Option<i64>,
}

impl BackendConfig {
    /// Merges an update into the stored configuration, if any.
    ///
    /// Non-positive durations keep the stored value, or the default when
    /// nothing is stored yet.
    pub fn apply_update(
        existing: Option<BackendConfig>,
        update: BackendConfigUpdate,
    ) -> AppResult<Self> {
        let base_url = match (update.base_url, existing.as_ref()) {
            (Some(value), _) => NonEmptyString::new(value).map_err(|_| {
                AppError::Validation("base_url must not be empty".to_owned())
            })?,
            (None, Some(current)) => current.base_url.clone(),
            (None, None) => {
                return Err(AppError::Validation(
                    "base_url is required for the initial configuration".to_owned(),
                ));
            }
        };

        let pick = |value: Option<String>, current: Option<&String>| {
            value
                .or_else(|| current.cloned())
                .filter(|value| !value.is_empty())
        };

        let max_ttl = positive_seconds(update.max_ttl_seconds)
            .or_else(|| existing.as_ref().map(|current| current.max_ttl))
            .unwrap_or(DEFAULT_CONFIG_MAX_TTL);
        let client_timeout = positive_seconds(update.client_timeout_seconds)
            .or_else(|| existing.as_ref().map(|current| current.client_timeout))
            .unwrap_or(DEFAULT_CLIENT_TIMEOUT);

        Ok(Self {
            base_url,
            bearer_token: pick(
                update.bearer_token,
                existing.as_ref().and_then(|current| current.bearer_token.as_ref()),
            ),
            api_key: pick(
                update.api_key,
                existing.as_ref().and_then(|current| current.api_key.as_ref()),
            ),
            username: pick(
                update.username,
                existing.as_ref().and_then(|current| current.username.as_ref()),
            ),
            password: pick(
                update.password,
                existing.as_ref().and_then(|current| current.password.as_ref()),
            ),
            max_ttl,
            client_timeout,
        })
    }

    /// Selects credentials in precedence order: bearer token, API key,
    /// then username and password.
    pub fn credentials(&self) -> AppResult<ArtifactoryCredentials> {
        if let Some(token) = &self.bearer_token {
            return Ok(ArtifactoryCredentials::BearerToken(token.clone()));
        }
        if let Some(api_key) = &self.api_key {
            return Ok(ArtifactoryCredentials::ApiKey(api_key.clone()));
        }
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return Ok(ArtifactoryCredentials::Basic {
                username: username.clone(),
                password: password.clone(),
            });
        }

        Err(AppError::Validation(
            "bearer token, API key, or username/password must be configured".to_owned(),
        ))
    }

    /// Returns the external service base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Returns the backend token lifetime ceiling.
    #[must_use]
    pub fn max_ttl(&self) -> Duration {
        self.max_ttl
    }

    /// Returns the HTTP timeout for external calls.
    #[must_use]
    pub fn client_timeout(&self) -> Duration {
        self.client_timeout
    }
}

impl Debug for BackendConfig {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("BackendConfig")
            .field("base_url", &self.base_url.as_str())
            .field("max_ttl", &self.max_ttl)
            .field("client_timeout", &self.client_timeout)
            .finish_non_exhaustive()
    }
}

fn positive_seconds(value: Option<i64>) -> Option<Duration> {
    value
        .filter(|seconds| *seconds > 0)
        .and_then(|seconds| u64::try_from(seconds).ok())
        .map(Duration::from_secs)
}
