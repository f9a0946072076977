use std::fmt::{Display, Formatter};
use std::time::Duration;

use artikey_core::{AppError, AppResult, ValidationErrors};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permission_target::PermissionTargetSpec;
use crate::ttl::RoleTtls;

/// Maximum accepted role name length.
pub const MAX_ROLE_NAME_LENGTH: usize = 64;

/// Case-normalized role name used as the storage key and in grant naming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(String);

impl RoleName {
    /// Parses and normalizes a user-supplied role name.
    pub fn parse(value: &str) -> AppResult<Self> {
        let normalized = value.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(AppError::Validation("role name must not be empty".to_owned()));
        }

        if normalized.len() > MAX_ROLE_NAME_LENGTH {
            return Err(AppError::Validation(format!(
                "role name must be at most {MAX_ROLE_NAME_LENGTH} characters"
            )));
        }

        let is_allowed = |character: char| {
            character.is_ascii_lowercase()
                || character.is_ascii_digit()
                || matches!(character, '_' | '-' | '.')
        };
        let is_edge = |character: char| {
            character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_'
        };

        if !normalized.chars().all(is_allowed) {
            return Err(AppError::Validation(format!(
                "role name '{normalized}' may only contain letters, digits, '_', '-' and '.'"
            )));
        }

        let starts_ok = normalized.chars().next().is_some_and(is_edge);
        let ends_ok = normalized.chars().last().is_some_and(is_edge);
        if !starts_ok || !ends_ok {
            return Err(AppError::Validation(format!(
                "role name '{normalized}' must start and end with a letter, digit or '_'"
            )));
        }

        Ok(Self(normalized))
    }

    /// Returns the normalized name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RoleName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Opaque identifier assigned once at role creation.
///
/// It suffixes the externally visible group name and never changes for the
/// life of the role, so a recreated role never adopts an orphaned group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    /// Generates a fresh random role identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an identifier read back from storage or a recovery record.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Persisted role definition.
///
/// Owned by the role store and only replaced by the reconciliation service
/// while it holds the role lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    role_id: RoleId,
    name: RoleName,
    #[serde(with = "crate::duration_seconds")]
    token_ttl: Duration,
    #[serde(with = "crate::duration_seconds")]
    max_ttl: Duration,
    raw_permission_targets: String,
    permission_targets: Vec<PermissionTargetSpec>,
}

impl RoleEntry {
    /// Builds a role entry from validated parts.
    #[must_use]
    pub fn new(
        role_id: RoleId,
        name: RoleName,
        ttls: RoleTtls,
        raw_permission_targets: impl Into<String>,
        permission_targets: Vec<PermissionTargetSpec>,
    ) -> Self {
        Self {
            role_id,
            name,
            token_ttl: ttls.token_ttl(),
            max_ttl: ttls.max_ttl(),
            raw_permission_targets: raw_permission_targets.into(),
            permission_targets,
        }
    }

    /// Checks that the entry is structurally complete before it is persisted.
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = ValidationErrors::new();

        if self.name.as_str().is_empty() {
            errors.push("role name is empty");
        }
        if self.role_id.as_str().trim().is_empty() {
            errors.push("role id is empty");
        }
        if self.raw_permission_targets.trim().is_empty() {
            errors.push("raw permission targets are empty");
        }
        if self.permission_targets.is_empty() {
            errors.push("permission targets are empty");
        }

        errors.into_result()
    }

    /// Returns the stable role identifier.
    #[must_use]
    pub fn role_id(&self) -> &RoleId {
        &self.role_id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &RoleName {
        &self.name
    }

    /// Returns the default token lifetime.
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Returns the upper bound for token lifetimes.
    #[must_use]
    pub fn max_ttl(&self) -> Duration {
        self.max_ttl
    }

    /// Returns both lifetimes as stored, without re-checking them.
    #[must_use]
    pub fn ttls(&self) -> RoleTtls {
        RoleTtls::from_stored(self.token_ttl, self.max_ttl)
    }

    /// Returns the permission target text exactly as last accepted.
    #[must_use]
    pub fn raw_permission_targets(&self) -> &str {
        self.raw_permission_targets.as_str()
    }

    /// Returns the parsed targets; the index is part of each grant's identity.
    #[must_use]
    pub fn permission_targets(&self) -> &[PermissionTargetSpec] {
        self.permission_targets.as_slice()
    }
}
