// SPDX-License-Identifier: GPL-3.0-only

//! One reconciliation pass: collect, compare, clean up, report.

use chrono::Utc;
use csi_sys::{CommandRunner, collect_iscsi_nodes, collect_zfs_volumes};
use csi_types::{Inventory, InventorySource, RunReport};
use tracing::{error, info, warn};

use crate::cleanup::{execute_cleanup, plan_cleanup};
use crate::cluster::{PersistentVolumeSource, collect_cluster_volumes};
use crate::config::RunConfig;
use crate::reconcile::{cleanup_guard, stale_set};

pub async fn run(
    config: &RunConfig,
    runner: &dyn CommandRunner,
    volumes: &dyn PersistentVolumeSource,
) -> RunReport {
    let started_at = Utc::now();
    info!(
        node = config.node_name.as_deref().unwrap_or("unknown"),
        dry_run = config.dry_run,
        "Starting reconciliation"
    );

    let iscsi = collect_iscsi_nodes(runner, &config.iqn_prefix).await;
    let zfs = collect_zfs_volumes(runner, &config.zfs_parent_dataset).await;
    let cluster = if config.skip_cluster {
        info!("Cluster inventory disabled");
        Inventory::skipped(InventorySource::Cluster)
    } else {
        collect_cluster_volumes(volumes).await
    };

    info!(
        iscsi = iscsi.inventory.len(),
        zfs = zfs.len(),
        cluster = cluster.len(),
        "Inventories collected"
    );

    let stale = stale_set(&iscsi.inventory, &zfs);
    let mut actions = Vec::new();
    let mut cleanup_withheld = None;

    if stale.is_empty() {
        info!("No stale iSCSI configurations found");
    } else if let Some(reason) = cleanup_guard(&zfs) {
        error!(
            stale = stale.len(),
            "Refusing to clean up iSCSI records: {}", reason
        );
        cleanup_withheld = Some(reason);
    } else {
        warn!(stale = stale.len(), "Found stale iSCSI configurations");
        let plan = plan_cleanup(&stale, &iscsi.targets);
        actions = execute_cleanup(&plan, runner, config.dry_run).await;
    }

    RunReport {
        started_at,
        node_name: config.node_name.clone(),
        dry_run: config.dry_run,
        host_access: config.use_nsenter,
        inventories: vec![iscsi.inventory.summary(), zfs.summary(), cluster.summary()],
        stale: stale.into_iter().collect(),
        actions,
        cleanup_withheld,
    }
}
