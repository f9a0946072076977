//! Role reconciliation against the external artifact repository.
//!
//! Every sequence that touches a role's external resources runs under that
//! role's lock. The role store write is the durability boundary: resources
//! provisioned before it are covered by recovery records, and resources that
//! become unused after it are deleted only once the new role is committed.

mod delete;
mod recovery;
mod save;


use std::sync::Arc;

use artikey_core::AppResult;
use artikey_domain::{RoleEntry, RoleName};

use crate::{BackendConfigService, RecoveryLog, RoleLockTable, RoleStore};

/// Input for creating or updating one role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveRoleInput {
    /// User-supplied role name, normalized before use.
    pub name: String,
    /// Default token lifetime in seconds; non-positive takes the default.
    pub token_ttl_seconds: Option<i64>,
    /// Maximum token lifetime in seconds; non-positive takes the default.
    pub max_ttl_seconds: Option<i64>,
    /// Permission target JSON list; required when creating a role.
    pub permission_targets: Option<String>,
}

/// Result of a committed role write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRoleOutcome {
    /// The committed role.
    pub role: RoleEntry,
    /// Non-fatal cleanup failures.
    pub warnings: Vec<String>,
}

/// Result of a role deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteRoleOutcome {
    /// External cleanup failures; the role itself is gone regardless.
    pub warnings: Vec<String>,
}

/// Summary of one recovery log replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Records resolved and removed.
    pub replayed: usize,
    /// Records left for a later replay.
    pub retained: usize,
    /// Reasons records were retained.
    pub warnings: Vec<String>,
}

impl RecoveryReport {
    fn merge(&mut self, other: RecoveryReport) {
        self.replayed += other.replayed;
        self.retained += other.retained;
        self.warnings.extend(other.warnings);
    }
}

/// Application service keeping stored roles and their external group and
/// permission targets consistent.
#[derive(Clone)]
pub struct ReconciliationService {
    roles: RoleStore,
    recovery_log: RecoveryLog,
    locks: Arc<RoleLockTable>,
    backend: BackendConfigService,
}

impl ReconciliationService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        roles: RoleStore,
        recovery_log: RecoveryLog,
        locks: Arc<RoleLockTable>,
        backend: BackendConfigService,
    ) -> Self {
        Self {
            roles,
            recovery_log,
            locks,
            backend,
        }
    }

    /// Returns one stored role.
    pub async fn find_role(&self, name: &str) -> AppResult<Option<RoleEntry>> {
        let name = RoleName::parse(name)?;
        self.roles.get(&name).await
    }

    /// Lists stored role names.
    pub async fn list_roles(&self) -> AppResult<Vec<String>> {
        self.roles.list().await
    }
}
