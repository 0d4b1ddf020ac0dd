// SPDX-License-Identifier: GPL-3.0-only

//! Stale-set computation.

use std::collections::BTreeSet;

use csi_types::{Inventory, SourceStatus, VolumeId};

/// Volumes with an iSCSI node record but no backing ZFS volume.
///
/// The cluster inventory deliberately plays no part here.
pub fn stale_set(iscsi: &Inventory, zfs: &Inventory) -> BTreeSet<VolumeId> {
    iscsi.missing_from(zfs)
}

/// Reason cleanup must not run, if any.
///
/// An unreadable ZFS pool looks exactly like an empty one, which would make
/// every iSCSI record appear stale.
pub fn cleanup_guard(zfs: &Inventory) -> Option<String> {
    match zfs.status() {
        SourceStatus::Unavailable { reason } => {
            Some(format!("ZFS inventory unavailable: {reason}"))
        }
        SourceStatus::Available | SourceStatus::Skipped => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csi_types::InventorySource;

    fn inventory(source: InventorySource, names: &[&str]) -> Inventory {
        Inventory::from_volumes(
            source,
            names.iter().map(|name| VolumeId::from_name(name).unwrap()),
        )
    }

    fn names(set: &BTreeSet<VolumeId>) -> Vec<&str> {
        set.iter().map(VolumeId::as_str).collect()
    }

    #[test]
    fn stale_is_iscsi_minus_zfs() {
        let iscsi = inventory(InventorySource::Iscsi, &["pvc-aaa", "pvc-bbb"]);
        let zfs = inventory(InventorySource::Zfs, &["pvc-aaa"]);
        assert_eq!(names(&stale_set(&iscsi, &zfs)), vec!["pvc-bbb"]);
    }

    #[test]
    fn disjoint_sets_are_fully_stale() {
        let iscsi = inventory(InventorySource::Iscsi, &["pvc-aaa", "pvc-bbb"]);
        let zfs = inventory(InventorySource::Zfs, &["pvc-ccc"]);
        assert_eq!(names(&stale_set(&iscsi, &zfs)), vec!["pvc-aaa", "pvc-bbb"]);
    }

    #[test]
    fn identical_sets_have_nothing_stale() {
        let iscsi = inventory(InventorySource::Iscsi, &["pvc-aaa", "pvc-bbb"]);
        let zfs = inventory(InventorySource::Zfs, &["pvc-aaa", "pvc-bbb"]);
        assert!(stale_set(&iscsi, &zfs).is_empty());
    }

    #[test]
    fn empty_iscsi_has_nothing_stale() {
        let iscsi = Inventory::new(InventorySource::Iscsi);
        let zfs = inventory(InventorySource::Zfs, &["pvc-aaa"]);
        assert!(stale_set(&iscsi, &zfs).is_empty());
    }

    #[test]
    fn unavailable_zfs_blocks_cleanup() {
        let zfs = Inventory::unavailable(InventorySource::Zfs, "exit code 2");
        assert!(cleanup_guard(&zfs).unwrap().contains("exit code 2"));
        assert!(cleanup_guard(&Inventory::new(InventorySource::Zfs)).is_none());
    }
}
