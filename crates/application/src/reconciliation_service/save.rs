use super::*;

use artikey_core::AppError;
use artikey_domain::{
    RESOURCE_PREFIX, RecoveryEntry, RoleId, RoleTtls, group_name, parse_permission_targets,
    permission_target_name,
};
use tracing::{debug, info, warn};

use crate::{GroupDefinition, PermissionTargetBinding};

impl ReconciliationService {
    /// Creates or updates a role and reconciles its group and permission
    /// targets.
    ///
    /// External failures abort the sequence with the underlying error.
    /// Resources already provisioned are left to recovery replay.
    pub async fn save_role(&self, input: SaveRoleInput) -> AppResult<SaveRoleOutcome> {
        let role_name = RoleName::parse(&input.name)?;
        let _guard = self.locks.lock(&role_name).await;

        let config = self.backend.require().await?;
        let existing = self.roles.get(&role_name).await?;

        let ttls = RoleTtls::from_request_seconds(
            input.token_ttl_seconds,
            input.max_ttl_seconds,
            existing.as_ref().map(RoleEntry::ttls),
            config.max_ttl(),
        )?;
        let (raw_permission_targets, permission_targets) =
            match (input.permission_targets, existing.as_ref()) {
                (Some(raw), _) => {
                    let targets = parse_permission_targets(&raw)?;
                    (raw, targets)
                }
                (None, Some(current)) => (
                    current.raw_permission_targets().to_owned(),
                    current.permission_targets().to_vec(),
                ),
                (None, None) => {
                    return Err(AppError::Validation(
                        "permission targets are required when creating a role".to_owned(),
                    ));
                }
            };

        let client = self.backend.client().await?;
        let mut warnings = self.replay_pending(&role_name, client.as_ref()).await.warnings;

        let role_id = existing
            .as_ref()
            .map_or_else(RoleId::generate, |current| current.role_id().clone());
        let old_count = existing
            .as_ref()
            .map_or(0, |current| current.permission_targets().len());
        let new_count = permission_targets.len();
        let group = group_name(&role_id);

        let mut resolved_records = Vec::new();
        if existing.is_none() {
            let record = self
                .recovery_log
                .append(RecoveryEntry::group(role_name.clone(), role_id.clone()))
                .await?;
            resolved_records.push(record.id);
        }
        for index in old_count..new_count {
            let record = self
                .recovery_log
                .append(RecoveryEntry::permission_target(role_name.clone(), index))
                .await?;
            resolved_records.push(record.id);
        }

        debug!(role_name = %role_name, group = %group, "reconciling group");
        client
            .create_or_replace_group(&GroupDefinition {
                name: group.clone(),
                description: format!("{RESOURCE_PREFIX} group for {role_name}"),
            })
            .await?;

        let mut excess = Vec::new();
        for index in new_count..old_count {
            let record = self
                .recovery_log
                .append(RecoveryEntry::permission_target(role_name.clone(), index))
                .await?;
            excess.push((index, record.id));
        }

        for (index, spec) in permission_targets.iter().enumerate() {
            let name = permission_target_name(&role_name, index);
            debug!(
                role_name = %role_name,
                permission_target = %name,
                "reconciling permission target"
            );
            client
                .create_or_update_permission_target(&PermissionTargetBinding {
                    name,
                    group_name: group.clone(),
                    spec: spec.clone(),
                })
                .await?;
        }

        let role = RoleEntry::new(
            role_id,
            role_name.clone(),
            ttls,
            raw_permission_targets,
            permission_targets,
        );
        self.roles.put(&role).await?;
        info!(
            role_name = %role_name,
            role_id = %role.role_id(),
            permission_targets = new_count,
            created = existing.is_none(),
            "role committed"
        );

        for (index, record_id) in excess {
            let name = permission_target_name(&role_name, index);
            match client.delete_permission_target(&name).await {
                Ok(()) => {
                    info!(
                        role_name = %role_name,
                        permission_target = %name,
                        "deleted excess permission target"
                    );
                    resolved_records.push(record_id);
                }
                Err(error) => {
                    warn!(
                        role_name = %role_name,
                        permission_target = %name,
                        error = %error,
                        "failed to delete excess permission target"
                    );
                    warnings.push(format!(
                        "failed to delete permission target '{name}': {error}"
                    ));
                }
            }
        }

        self.remove_records(&role_name, resolved_records).await;

        Ok(SaveRoleOutcome { role, warnings })
    }
}
