// SPDX-License-Identifier: GPL-3.0-only

//! Outcome of a single reconciliation run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{InventorySource, InventorySummary, VolumeId};

/// Which half of the logout-then-delete pair an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupStep {
    Logout,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Printed only; nothing was executed.
    DryRun,
    Succeeded,
    /// The tool exited with the "nothing matched" code.
    NoMatch,
    Failed { reason: String },
}

impl ActionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ActionOutcome::Failed { .. })
    }
}

/// One host command issued (or proposed) during cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupAction {
    pub volume: VolumeId,
    pub target: String,
    pub step: CleanupStep,
    /// Rendered command line, without any privilege wrapper.
    pub command: String,
    pub outcome: ActionOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub node_name: Option<String>,
    pub dry_run: bool,
    pub host_access: bool,
    pub inventories: Vec<InventorySummary>,
    /// Stale identifiers in sorted order.
    pub stale: Vec<VolumeId>,
    pub actions: Vec<CleanupAction>,
    /// Set when stale entries were found but cleanup was not attempted.
    pub cleanup_withheld: Option<String>,
}

impl RunReport {
    pub fn inventory(&self, source: InventorySource) -> Option<&InventorySummary> {
        self.inventories
            .iter()
            .find(|summary| summary.source == source)
    }

    pub fn failed_actions(&self) -> impl Iterator<Item = &CleanupAction> {
        self.actions
            .iter()
            .filter(|action| action.outcome.is_failure())
    }

    /// True when any source was unreachable, cleanup was withheld or a host
    /// command failed.
    pub fn is_degraded(&self) -> bool {
        self.inventories
            .iter()
            .any(|summary| summary.status.is_unavailable())
            || self.cleanup_withheld.is_some()
            || self.failed_actions().next().is_some()
    }
}
