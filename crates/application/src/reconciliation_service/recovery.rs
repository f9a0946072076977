use super::*;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use artikey_domain::RecoveryEntry;
use chrono::{TimeDelta, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{ArtifactoryClient, RecoveryRecord};

impl ReconciliationService {
    /// Replays every recovery record at least `min_age` old.
    ///
    /// Each role's records are replayed under that role's lock. Records that
    /// cannot be resolved stay in the log and are reported as warnings.
    pub async fn replay_recovery_log(&self, min_age: Duration) -> AppResult<RecoveryReport> {
        let min_age = TimeDelta::from_std(min_age).unwrap_or(TimeDelta::MAX);
        let now = Utc::now();

        let mut due: BTreeMap<RoleName, BTreeSet<Uuid>> = BTreeMap::new();
        for record in self.recovery_log.list().await? {
            if now.signed_duration_since(record.created_at) >= min_age {
                due.entry(record.entry.role_name().clone())
                    .or_default()
                    .insert(record.id);
            }
        }

        let mut report = RecoveryReport::default();
        if due.is_empty() {
            return Ok(report);
        }

        let client = match self.backend.client().await {
            Ok(client) => client,
            Err(error) => {
                report.retained = due.values().map(BTreeSet::len).sum();
                report
                    .warnings
                    .push(format!("recovery replay skipped: {error}"));
                warn!(error = %error, retained = report.retained, "recovery replay skipped");
                return Ok(report);
            }
        };

        for (role_name, ids) in due {
            let _guard = self.locks.lock(&role_name).await;

            let mut records = Vec::with_capacity(ids.len());
            for id in ids {
                match self.recovery_log.get(id).await {
                    Ok(Some(record)) => records.push(record),
                    // Resolved by a role write since the listing.
                    Ok(None) => {}
                    Err(error) => {
                        report.retained += 1;
                        report
                            .warnings
                            .push(format!("failed to load recovery record '{id}': {error}"));
                    }
                }
            }

            report.merge(
                self.replay_records(&role_name, records, client.as_ref())
                    .await,
            );
        }

        info!(
            replayed = report.replayed,
            retained = report.retained,
            "recovery replay finished"
        );
        Ok(report)
    }

    /// Replays all records of one role. The caller holds the role lock.
    pub(super) async fn replay_pending(
        &self,
        role_name: &RoleName,
        client: &dyn ArtifactoryClient,
    ) -> RecoveryReport {
        match self.recovery_log.list_for_role(role_name).await {
            Ok(records) => self.replay_records(role_name, records, client).await,
            Err(error) => RecoveryReport {
                warnings: vec![format!(
                    "failed to list recovery records for role '{role_name}': {error}"
                )],
                ..RecoveryReport::default()
            },
        }
    }

    /// Removes records whose resources are settled. Failures only leave a
    /// record for a later, idempotent replay.
    pub(super) async fn remove_records(&self, role_name: &RoleName, record_ids: Vec<Uuid>) {
        for record_id in record_ids {
            if let Err(error) = self.recovery_log.remove(record_id).await {
                warn!(
                    role_name = %role_name,
                    record_id = %record_id,
                    error = %error,
                    "failed to remove recovery record"
                );
            }
        }
    }

    async fn replay_records(
        &self,
        role_name: &RoleName,
        records: Vec<RecoveryRecord>,
        client: &dyn ArtifactoryClient,
    ) -> RecoveryReport {
        let mut report = RecoveryReport::default();
        if records.is_empty() {
            return report;
        }

        let current = match self.roles.get(role_name).await {
            Ok(current) => current,
            Err(error) => {
                report.retained = records.len();
                report.warnings.push(format!(
                    "failed to load role '{role_name}' for recovery: {error}"
                ));
                return report;
            }
        };

        for record in records {
            match self.replay_record(&record, current.as_ref(), client).await {
                Ok(()) => report.replayed += 1,
                Err(error) => {
                    let resource = record.entry.resource_name();
                    warn!(
                        role_name = %role_name,
                        kind = record.entry.kind(),
                        resource = %resource,
                        error = %error,
                        "failed to replay recovery record"
                    );
                    report.retained += 1;
                    report.warnings.push(format!(
                        "failed to clean up {} '{resource}': {error}",
                        record.entry.kind().replace('_', " ")
                    ));
                }
            }
        }

        report
    }

    async fn replay_record(
        &self,
        record: &RecoveryRecord,
        current: Option<&RoleEntry>,
        client: &dyn ArtifactoryClient,
    ) -> AppResult<()> {
        let resource = record.entry.resource_name();

        if record.entry.is_referenced_by(current) {
            debug!(
                role_name = %record.entry.role_name(),
                kind = record.entry.kind(),
                resource = %resource,
                "recovery record still referenced"
            );
        } else {
            match &record.entry {
                RecoveryEntry::Group { .. } => client.delete_group(&resource).await?,
                RecoveryEntry::PermissionTarget { .. } => {
                    client.delete_permission_target(&resource).await?;
                }
            }
            info!(
                role_name = %record.entry.role_name(),
                kind = record.entry.kind(),
                resource = %resource,
                "deleted unreferenced resource"
            );
        }

        self.recovery_log.remove(record.id).await
    }
}
