// SPDX-License-Identifier: GPL-3.0-only

//! Logout-then-delete of stale iSCSI node records.

use std::collections::BTreeSet;

use csi_sys::iscsi_tools::{ISCSI_ERR_NO_OBJS_FOUND, delete_command, logout_command};
use csi_sys::{CommandOutput, CommandRunner, HostCommand, SysError};
use csi_types::{ActionOutcome, CleanupAction, CleanupStep, IscsiTarget, VolumeId};
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct PlannedCleanup {
    pub volume: VolumeId,
    pub target: String,
    pub logout: HostCommand,
    pub delete: HostCommand,
}

impl PlannedCleanup {
    fn steps(&self) -> [(CleanupStep, &HostCommand); 2] {
        [
            (CleanupStep::Logout, &self.logout),
            (CleanupStep::Delete, &self.delete),
        ]
    }
}

/// Resolve the record to remove for `volume`.
///
/// A record parsed for exactly this volume wins; otherwise the first target
/// name containing the identifier is used.
fn find_target<'a>(volume: &VolumeId, targets: &'a [IscsiTarget]) -> Option<&'a IscsiTarget> {
    targets
        .iter()
        .find(|record| &record.volume == volume)
        .or_else(|| {
            targets
                .iter()
                .find(|record| record.target.contains(volume.as_str()))
        })
}

/// Build the command pairs for every stale volume that resolves to a target.
pub fn plan_cleanup(stale: &BTreeSet<VolumeId>, targets: &[IscsiTarget]) -> Vec<PlannedCleanup> {
    stale
        .iter()
        .filter_map(|volume| match find_target(volume, targets) {
            Some(record) => Some(PlannedCleanup {
                volume: volume.clone(),
                target: record.target.clone(),
                logout: logout_command(&record.target),
                delete: delete_command(&record.target),
            }),
            None => {
                debug!(volume = %volume, "No iSCSI target found for stale volume");
                None
            }
        })
        .collect()
}

/// Run (or, in dry-run mode, only record) each planned command once.
///
/// Delete always follows logout: a failed logout usually means the session
/// was already gone.
pub async fn execute_cleanup(
    plan: &[PlannedCleanup],
    runner: &dyn CommandRunner,
    dry_run: bool,
) -> Vec<CleanupAction> {
    if !plan.is_empty() {
        info!("Cleaning up {} stale targets", plan.len());
    }

    let mut actions = Vec::with_capacity(plan.len() * 2);
    for entry in plan {
        for (step, command) in entry.steps() {
            let outcome = if dry_run {
                info!(command = %command, "Dry run: skipped");
                ActionOutcome::DryRun
            } else {
                run_step(runner, step, command).await
            };

            actions.push(CleanupAction {
                volume: entry.volume.clone(),
                target: entry.target.clone(),
                step,
                command: command.render(),
                outcome,
            });
        }
    }
    actions
}

async fn run_step(
    runner: &dyn CommandRunner,
    step: CleanupStep,
    command: &HostCommand,
) -> ActionOutcome {
    info!(command = %command, "Running cleanup command");
    match runner.run(command).await {
        Ok(CommandOutput::NoMatch) => ActionOutcome::NoMatch,
        Ok(CommandOutput::Stdout(_)) => ActionOutcome::Succeeded,
        // No session to log out of; the delete still follows.
        Err(SysError::Failed {
            code: Some(ISCSI_ERR_NO_OBJS_FOUND),
            ..
        }) if step == CleanupStep::Logout => {
            debug!(command = %command, "No active session for target");
            ActionOutcome::NoMatch
        }
        Err(err) => {
            error!("Cleanup command failed: {}", err);
            ActionOutcome::Failed {
                reason: err.to_string(),
            }
        }
    }
}
