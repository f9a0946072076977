use serde::{Deserialize, Serialize};

use crate::naming::{group_name, permission_target_name};
use crate::role::{RoleEntry, RoleId, RoleName};

/// Hint that an external resource may have been provisioned without the
/// role store reflecting it yet.
///
/// Written before the mutation, removed once the role store is committed.
/// Replay deletes the resource unless the committed role still references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecoveryEntry {
    /// A group created for a new role.
    Group {
        /// Role owning the group.
        role_name: RoleName,
        /// Role identifier the group name is derived from.
        role_id: RoleId,
    },
    /// A permission target at one index of a role's list.
    PermissionTarget {
        /// Role owning the permission target.
        role_name: RoleName,
        /// Derived external name, recorded for logging and direct deletion.
        permission_target_name: String,
        /// Position in the role's permission target list.
        index: usize,
    },
}

impl RecoveryEntry {
    /// Creates a record for a role's group.
    #[must_use]
    pub fn group(role_name: RoleName, role_id: RoleId) -> Self {
        Self::Group { role_name, role_id }
    }

    /// Creates a record for the permission target slot at `index`.
    #[must_use]
    pub fn permission_target(role_name: RoleName, index: usize) -> Self {
        let permission_target_name = permission_target_name(&role_name, index);
        Self::PermissionTarget {
            role_name,
            permission_target_name,
            index,
        }
    }

    /// Returns the role whose lock guards this record.
    #[must_use]
    pub fn role_name(&self) -> &RoleName {
        match self {
            Self::Group { role_name, .. } | Self::PermissionTarget { role_name, .. } => role_name,
        }
    }

    /// Returns a stable kind label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Group { .. } => "group",
            Self::PermissionTarget { .. } => "permission_target",
        }
    }

    /// Returns the external name of the resource this record covers.
    #[must_use]
    pub fn resource_name(&self) -> String {
        match self {
            Self::Group { role_id, .. } => group_name(role_id),
            Self::PermissionTarget {
                permission_target_name,
                ..
            } => permission_target_name.clone(),
        }
    }

    /// Returns true when the committed role still uses the resource.
    ///
    /// A group is in use while the role keeps the same identifier; a
    /// permission target is in use while its index is inside the role's list.
    #[must_use]
    pub fn is_referenced_by(&self, current: Option<&RoleEntry>) -> bool {
        let Some(role) = current else {
            return false;
        };

        match self {
            Self::Group { role_id, .. } => role.role_id() == role_id,
            Self::PermissionTarget { index, .. } => *index < role.permission_targets().len(),
        }
    }
}
