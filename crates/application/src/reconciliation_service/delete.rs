use super::*;

use artikey_domain::RecoveryEntry;
use tracing::{debug, info, warn};

impl ReconciliationService {
    /// Deletes a role, then removes its group and permission targets on a
    /// best-effort basis.
    ///
    /// Deleting a missing role is a no-op. Cleanup failures are returned as
    /// warnings and their recovery records stay behind for the next replay.
    pub async fn delete_role(&self, name: &str) -> AppResult<DeleteRoleOutcome> {
        let role_name = RoleName::parse(name)?;
        let _guard = self.locks.lock(&role_name).await;

        let Some(existing) = self.roles.get(&role_name).await? else {
            debug!(role_name = %role_name, "role not found, nothing to delete");
            return Ok(DeleteRoleOutcome::default());
        };

        self.recovery_log
            .append(RecoveryEntry::group(
                role_name.clone(),
                existing.role_id().clone(),
            ))
            .await?;
        for index in 0..existing.permission_targets().len() {
            self.recovery_log
                .append(RecoveryEntry::permission_target(role_name.clone(), index))
                .await?;
        }

        self.roles.delete(&role_name).await?;
        info!(role_name = %role_name, role_id = %existing.role_id(), "role deleted");

        let client = match self.backend.client().await {
            Ok(client) => client,
            Err(error) => {
                warn!(role_name = %role_name, error = %error, "external cleanup deferred");
                return Ok(DeleteRoleOutcome {
                    warnings: vec![format!("external cleanup deferred: {error}")],
                });
            }
        };

        let report = self.replay_pending(&role_name, client.as_ref()).await;
        Ok(DeleteRoleOutcome {
            warnings: report.warnings,
        })
    }
}
