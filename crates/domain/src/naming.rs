//! Deterministic names for the external resources owned by a role.
//!
//! Recovery recomputes these names from a recovery record alone, so every
//! function here must stay a pure function of its inputs.

use std::fmt::Write;

use sha2::{Digest, Sha256};

use crate::role::{RoleId, RoleName};

/// Prefix of every group and permission target created for a role.
pub const RESOURCE_PREFIX: &str = "artikey";

/// Prefix of token principal names.
pub const TOKEN_PRINCIPAL_PREFIX: &str = "auto-artikey";

/// Longest principal name the external service accepts for tokens.
pub const TOKEN_PRINCIPAL_MAX_LENGTH: usize = 58;

const TOKEN_PRINCIPAL_HASH_LENGTH: usize = 8;

/// Returns the group name for a role identifier.
#[must_use]
pub fn group_name(role_id: &RoleId) -> String {
    format!("{RESOURCE_PREFIX}.{role_id}")
}

/// Returns the name of the permission target at `index` for a role.
///
/// Names follow list position, not content. Reordering a role's targets
/// rewrites each slot in place rather than moving resources between names.
#[must_use]
pub fn permission_target_name(role_name: &RoleName, index: usize) -> String {
    format!("{RESOURCE_PREFIX}.pt{index}.{role_name}")
}

/// Returns the token scope granting a group's permissions.
#[must_use]
pub fn group_scope(group_name: &str) -> String {
    format!("applied-permissions/groups:{group_name}")
}

/// Returns the principal a role's tokens are issued under.
///
/// Over-long candidates keep their first `max - 8` characters followed by the
/// first 8 hex characters of the SHA-256 of the cut-off suffix.
#[must_use]
pub fn token_principal_name(role_name: &RoleName) -> String {
    let candidate = format!("{TOKEN_PRINCIPAL_PREFIX}.{role_name}");
    if candidate.len() <= TOKEN_PRINCIPAL_MAX_LENGTH {
        return candidate;
    }

    // Role names are ASCII, so every byte offset is a char boundary.
    let cut = TOKEN_PRINCIPAL_MAX_LENGTH - TOKEN_PRINCIPAL_HASH_LENGTH;
    let (kept, suffix) = candidate.split_at(cut);
    let digest = Sha256::digest(suffix.as_bytes());

    let mut principal = String::with_capacity(TOKEN_PRINCIPAL_MAX_LENGTH);
    principal.push_str(kept);
    for byte in digest.iter().take(TOKEN_PRINCIPAL_HASH_LENGTH / 2) {
        let _ = write!(principal, "{byte:02x}");
    }
    principal
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::role::{RoleId, RoleName};

    use super::{
        TOKEN_PRINCIPAL_MAX_LENGTH, group_name, group_scope, permission_target_name,
        token_principal_name,
    };

    fn role_name(value: &str) -> RoleName {
        RoleName::parse(value).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn group_and_grant_names_follow_prefix_scheme() {
        let role_id = RoleId::from_stored("1234567890");
        assert_eq!(group_name(&role_id), "artikey.1234567890");
        assert_eq!(
            permission_target_name(&role_name("deploy"), 3),
            "artikey.pt3.deploy"
        );
        assert_eq!(
            group_scope("artikey.1234567890"),
            "applied-permissions/groups:artikey.1234567890"
        );
    }

    #[test]
    fn short_principal_names_are_untouched() {
        assert_eq!(
            token_principal_name(&role_name("rolename-long-but-less-than-max")),
            "auto-artikey.rolename-long-but-less-than-max"
        );
    }

    #[test]
    fn long_principal_names_are_truncated_with_hash() {
        let principal = token_principal_name(&role_name(
            "rolename-too-long-to-fit-into-artifactory-token-username",
        ));
        assert_eq!(
            principal,
            "auto-artikey.rolename-too-long-to-fit-into-artifacee7b004d"
        );
        assert_eq!(principal.len(), TOKEN_PRINCIPAL_MAX_LENGTH);
    }

    proptest! {
        #[test]
        fn principal_name_is_deterministic_and_bounded(
            name in "[a-z0-9][a-z0-9_.-]{0,62}[a-z0-9]"
        ) {
            let role = role_name(name.as_str());
            let first = token_principal_name(&role);
            let second = token_principal_name(&role);

            prop_assert_eq!(&first, &second);
            prop_assert!(first.len() <= TOKEN_PRINCIPAL_MAX_LENGTH);
        }

        #[test]
        fn names_differing_after_truncation_point_do_not_collide(
            shared in "[a-z]{50}",
            left in "[a-z]{1,10}",
            right in "[a-z]{1,10}",
        ) {
            prop_assume!(left != right);
            let left_principal = token_principal_name(&role_name(&format!("{shared}{left}")));
            let right_principal = token_principal_name(&role_name(&format!("{shared}{right}")));

            prop_assert_ne!(left_principal, right_principal);
        }
    }
}
