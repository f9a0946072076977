use std::time::Duration;

use artikey_core::{AppError, AppResult, ValidationErrors};

use crate::role::RoleEntry;

/// Token lifetime applied when a role write does not supply one.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(900);

/// Role max lifetime applied when a role write does not supply one.
pub const DEFAULT_ROLE_MAX_TTL: Duration = Duration::from_secs(3600);

/// Validated pair of role lifetimes.
///
/// Holds `token_ttl <= max_ttl <= configured max` at construction time. The
/// bound is not re-checked for entries already persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleTtls {
    token_ttl: Duration,
    max_ttl: Duration,
}

impl RoleTtls {
    /// Validates explicit lifetimes against the backend maximum.
    pub fn new(
        token_ttl: Duration,
        max_ttl: Duration,
        configured_max_ttl: Duration,
    ) -> AppResult<Self> {
        let mut errors = ValidationErrors::new();

        if max_ttl > configured_max_ttl {
            errors.push(format!(
                "role max ttl ({}s) is greater than config max ttl ({}s)",
                max_ttl.as_secs(),
                configured_max_ttl.as_secs()
            ));
        }
        if token_ttl > max_ttl {
            errors.push(format!(
                "role token ttl ({}s) is greater than role max ttl ({}s)",
                token_ttl.as_secs(),
                max_ttl.as_secs()
            ));
        }

        errors.into_result()?;
        Ok(Self { token_ttl, max_ttl })
    }

    /// Resolves request values in seconds, then validates them.
    ///
    /// Missing or non-positive inputs keep the `current` value on update and
    /// take the defaults on creation.
    pub fn from_request_seconds(
        token_ttl_seconds: Option<i64>,
        max_ttl_seconds: Option<i64>,
        current: Option<RoleTtls>,
        configured_max_ttl: Duration,
    ) -> AppResult<Self> {
        let token_ttl = positive_seconds(token_ttl_seconds)
            .or_else(|| current.map(|ttls| ttls.token_ttl))
            .unwrap_or(DEFAULT_TOKEN_TTL);
        let max_ttl = positive_seconds(max_ttl_seconds)
            .or_else(|| current.map(|ttls| ttls.max_ttl))
            .unwrap_or(DEFAULT_ROLE_MAX_TTL);

        Self::new(token_ttl, max_ttl, configured_max_ttl)
    }

    pub(crate) fn from_stored(token_ttl: Duration, max_ttl: Duration) -> Self {
        Self { token_ttl, max_ttl }
    }

    /// Returns the default token lifetime.
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Returns the maximum token lifetime.
    #[must_use]
    pub fn max_ttl(&self) -> Duration {
        self.max_ttl
    }
}

/// Chooses the lifetime of a token issued under `role`.
///
/// A positive request wins over the role default; the result must not exceed
/// the role maximum.
pub fn resolve_token_ttl(requested: Option<Duration>, role: &RoleEntry) -> AppResult<Duration> {
    let effective = requested
        .filter(|value| !value.is_zero())
        .unwrap_or_else(|| role.token_ttl());

    if effective > role.max_ttl() {
        return Err(AppError::Validation(format!(
            "token ttl ({}s) is greater than role max ttl ({}s)",
            effective.as_secs(),
            role.max_ttl().as_secs()
        )));
    }

    Ok(effective)
}

fn positive_seconds(value: Option<i64>) -> Option<Duration> {
    value
        .filter(|seconds| *seconds > 0)
        .and_then(|seconds| u64::try_from(seconds).ok())
        .map(Duration::from_secs)
}
