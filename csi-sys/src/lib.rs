// SPDX-License-Identifier: GPL-3.0-only

//! Low-level host operations for the CSI reconciler
//!
//! This crate owns every interaction with the host:
//! - Command execution inside the host namespaces, under sudo, or directly
//! - Listing configured iSCSI node records with `iscsiadm`
//! - Listing ZFS block volumes with `zfs list`
//!
//! The commands issued here can be destructive and normally run with root
//! privileges in the host mount namespace.

pub mod command;
pub mod error;
pub mod iscsi_tools;
pub mod zfs_tools;

pub use command::{CommandOutput, CommandRunner, ExecutionContext, HostCommand, HostExecutor};
pub use error::{Result, SysError};
pub use iscsi_tools::{IscsiNodes, collect_iscsi_nodes};
pub use zfs_tools::collect_zfs_volumes;
