// SPDX-License-Identifier: GPL-3.0-only

//! iSCSI node records via `iscsiadm`.

use csi_types::{Inventory, InventorySource, IscsiTarget};
use tracing::{debug, error, info};

use crate::command::{CommandRunner, HostCommand};
use crate::error::SysError;

/// `iscsiadm` exit code for "no records found" or "no matching sessions".
pub const ISCSI_ERR_NO_OBJS_FOUND: i32 = 21;

pub fn list_nodes_command() -> HostCommand {
    HostCommand::new("iscsiadm").args(["-m", "node"])
}

pub fn logout_command(target: &str) -> HostCommand {
    HostCommand::new("iscsiadm").args(["-m", "node", "-T", target, "-u"])
}

pub fn delete_command(target: &str) -> HostCommand {
    HostCommand::new("iscsiadm").args(["-m", "node", "-T", target, "-o", "delete"])
}

/// Parse `iscsiadm -m node` output.
///
/// Lines look like `10.0.0.5:3260,1 iqn.2024-03.lan.asgard:knas:pvc-...`.
/// Only lines containing `iqn_prefix` are considered; the second field is the
/// target name. Lines without a second field or without a volume identifier
/// are skipped.
pub fn parse_node_records(output: &str, iqn_prefix: &str) -> Vec<IscsiTarget> {
    output
        .lines()
        .filter(|line| line.contains(iqn_prefix))
        .filter_map(|line| line.split_whitespace().nth(1))
        .filter_map(IscsiTarget::from_target_name)
        .collect()
}

/// Configured iSCSI volumes plus the records they came from, in listing
/// order.
#[derive(Debug, Clone)]
pub struct IscsiNodes {
    pub inventory: Inventory,
    pub targets: Vec<IscsiTarget>,
}

impl IscsiNodes {
    fn from_targets(targets: Vec<IscsiTarget>) -> Self {
        let inventory = Inventory::from_volumes(
            InventorySource::Iscsi,
            targets.iter().map(|target| target.volume.clone()),
        );
        Self { inventory, targets }
    }
}

/// Collect the iSCSI inventory. Never fails: an unreadable node database
/// yields an empty inventory marked unavailable.
pub async fn collect_iscsi_nodes(runner: &dyn CommandRunner, iqn_prefix: &str) -> IscsiNodes {
    info!("Fetching iSCSI nodes");

    match runner.run(&list_nodes_command()).await {
        Ok(output) => {
            let targets = parse_node_records(&output.into_stdout(), iqn_prefix);
            debug!(
                records = targets.len(),
                prefix = iqn_prefix,
                "Parsed iSCSI node records"
            );
            IscsiNodes::from_targets(targets)
        }
        Err(SysError::Failed {
            code: Some(ISCSI_ERR_NO_OBJS_FOUND),
            ..
        }) => {
            debug!("iscsiadm reports no node records");
            IscsiNodes::from_targets(Vec::new())
        }
        Err(err) => {
            error!("Failed to list iSCSI nodes: {}", err);
            IscsiNodes {
                inventory: Inventory::unavailable(InventorySource::Iscsi, err.to_string()),
                targets: Vec::new(),
            }
        }
    }
}
