// SPDX-License-Identifier: GPL-3.0-only

//! ZFS block volumes via `zfs list`.

use csi_types::{Inventory, InventorySource, VolumeId};
use tracing::{debug, error, info};

use crate::command::{CommandOutput, CommandRunner, HostCommand};

pub fn list_volumes_command(parent_dataset: &str) -> HostCommand {
    HostCommand::new("zfs").args(["list", "-t", "volume", "-H", "-o", "name", "-r", parent_dataset])
}

fn is_under(name: &str, parent: &str) -> bool {
    name == parent
        || name
            .strip_prefix(parent)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Parse `zfs list -H -o name` output into volume identifiers.
///
/// Keeps names inside `parent_dataset` whose last path segment carries the
/// volume prefix.
pub fn parse_volume_names(output: &str, parent_dataset: &str) -> Vec<VolumeId> {
    let parent = parent_dataset.trim_end_matches('/');
    output
        .lines()
        .map(str::trim)
        .filter(|name| is_under(name, parent))
        .filter_map(|name| name.rsplit('/').next())
        .filter_map(VolumeId::from_name)
        .collect()
}

/// Collect the ZFS inventory. Never fails: a failed listing yields an empty
/// inventory marked unavailable.
///
/// `zfs` exits 0 with no output for a dataset without volumes and reserves
/// exit 1 for errors (suspended pool, missing dataset, permission denied), so
/// [`CommandOutput::NoMatch`] is a failure here.
pub async fn collect_zfs_volumes(runner: &dyn CommandRunner, parent_dataset: &str) -> Inventory {
    info!("Fetching ZFS volumes");

    match runner.run(&list_volumes_command(parent_dataset)).await {
        Ok(CommandOutput::NoMatch) => {
            error!(
                "zfs list failed for {} (exit code 1); treating the pool as unreadable",
                parent_dataset
            );
            Inventory::unavailable(
                InventorySource::Zfs,
                format!("zfs list exited with code 1 for {parent_dataset}"),
            )
        }
        Ok(CommandOutput::Stdout(stdout)) => {
            let volumes = parse_volume_names(&stdout, parent_dataset);
            debug!(
                volumes = volumes.len(),
                parent = parent_dataset,
                "Parsed ZFS volumes"
            );
            Inventory::from_volumes(InventorySource::Zfs, volumes)
        }
        Err(err) => {
            error!(
                "Failed to list ZFS volumes under {}: {}",
                parent_dataset, err
            );
            Inventory::unavailable(InventorySource::Zfs, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::tests::CannedRunner;

    const PARENT: &str = "data/csi/iscsi";

    fn names(volumes: &[VolumeId]) -> Vec<&str> {
        volumes.iter().map(VolumeId::as_str).collect()
    }

    #[test]
    fn keeps_volumes_under_parent() {
        let output = "data/csi/iscsi/pvc-aaa\ndata/csi/iscsi/pvc-bbb\n";
        assert_eq!(
            names(&parse_volume_names(output, PARENT)),
            vec!["pvc-aaa", "pvc-bbb"]
        );
    }

    #[test]
    fn excludes_paths_outside_parent() {
        let output = "\
data/csi/iscsi/pvc-aaa
data/other/pvc-eee
data/csi/iscsi2/pvc-fff
";
        assert_eq!(names(&parse_volume_names(output, PARENT)), vec!["pvc-aaa"]);
    }

    #[test]
    fn requires_volume_prefix() {
        let output = "data/csi/iscsi/swap\ndata/csi/iscsi/pvc-aaa\n";
        assert_eq!(names(&parse_volume_names(output, PARENT)), vec!["pvc-aaa"]);
    }

    #[test]
    fn nested_volumes_use_last_segment() {
        let output = "data/csi/iscsi/tenant-a/pvc-abc\n";
        assert_eq!(names(&parse_volume_names(output, "data/csi/iscsi/")), vec!["pvc-abc"]);
    }

    #[test]
    fn builds_listing_command() {
        assert_eq!(
            list_volumes_command(PARENT).render(),
            "zfs list -t volume -H -o name -r data/csi/iscsi"
        );
    }

    #[tokio::test]
    async fn exit_code_one_marks_inventory_unavailable() {
        let inventory = collect_zfs_volumes(&CannedRunner::NoMatch, PARENT).await;
        assert!(!inventory.is_available());
        assert!(inventory.is_empty());
    }

    #[tokio::test]
    async fn empty_output_is_an_empty_available_inventory() {
        let inventory = collect_zfs_volumes(&CannedRunner::Stdout(""), PARENT).await;
        assert!(inventory.is_available());
        assert!(inventory.is_empty());
    }

    #[tokio::test]
    async fn failure_marks_inventory_unavailable() {
        let inventory = collect_zfs_volumes(&CannedRunner::Exit(2), PARENT).await;
        assert!(!inventory.is_available());
    }
}
