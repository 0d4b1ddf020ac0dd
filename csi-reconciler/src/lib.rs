// SPDX-License-Identifier: GPL-3.0-only

//! Reconciles iSCSI node records against the ZFS volumes backing them
//!
//! A node record whose ZFS volume has been destroyed keeps `iscsid` trying
//! to log in to a target that no longer exists. Each run collects the
//! configured iSCSI targets, the ZFS volumes under the CSI parent dataset and
//! (for the report only) the cluster's persistent volumes, then logs out of
//! and deletes every record without a backing volume.

pub mod cleanup;
pub mod cluster;
pub mod config;
pub mod reconcile;
pub mod report;
pub mod run;

pub use cluster::{KubePersistentVolumes, PersistentVolumeSource};
pub use config::RunConfig;
pub use run::run;

/// Process exit code for a run that finished with a degraded source, a
/// withheld cleanup or a failed host command.
pub const DEGRADED_EXIT_CODE: u8 = 3;
