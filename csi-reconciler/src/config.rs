// SPDX-License-Identifier: GPL-3.0-only

//! Run configuration.
//!
//! Built once at start-up from flags and environment variables and passed by
//! reference to every stage of the run.

use std::time::Duration;

use clap::{ArgAction, Parser};

pub const DEFAULT_ZFS_PARENT_DATASET: &str = "data/csi/iscsi";
pub const DEFAULT_IQN_PREFIX: &str = "iqn.2024-03.lan.asgard:knas";
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 120;

/// Only a case-insensitive `true` enables a flag.
fn parse_flag(value: &str) -> Result<bool, String> {
    Ok(value.trim().eq_ignore_ascii_case("true"))
}

#[derive(Debug, Clone, Parser)]
#[command(name = "csi-reconciler")]
#[command(about = "Remove iSCSI node records whose backing ZFS volume is gone")]
pub struct RunConfig {
    /// ZFS dataset that holds the CSI block volumes
    #[arg(long, env = "ZFS_PARENT_DATASET", default_value = DEFAULT_ZFS_PARENT_DATASET)]
    pub zfs_parent_dataset: String,

    /// Only iSCSI targets containing this string are considered
    #[arg(long, env = "IQN_PREFIX", default_value = DEFAULT_IQN_PREFIX)]
    pub iqn_prefix: String,

    /// Print cleanup commands without running them
    #[arg(
        long,
        env = "DRY_RUN",
        default_value = "true",
        value_parser = parse_flag,
        action = ArgAction::Set
    )]
    pub dry_run: bool,

    /// Node name, shown in the report only
    #[arg(long, env = "NODE_NAME")]
    pub node_name: Option<String>,

    /// Run host commands inside the namespaces of host PID 1
    #[arg(
        long,
        env = "USE_NSENTER",
        default_value = "true",
        value_parser = parse_flag,
        action = ArgAction::Set
    )]
    pub use_nsenter: bool,

    /// Upper bound for each host command
    #[arg(long, env = "COMMAND_TIMEOUT_SECS", default_value_t = DEFAULT_COMMAND_TIMEOUT_SECS)]
    pub command_timeout_secs: u64,

    /// Do not query the cluster for persistent volumes
    #[arg(long, env = "SKIP_CLUSTER_INVENTORY")]
    pub skip_cluster: bool,

    /// Print the report as JSON
    #[arg(long, env = "REPORT_JSON")]
    pub json: bool,
}

impl RunConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            zfs_parent_dataset: DEFAULT_ZFS_PARENT_DATASET.to_string(),
            iqn_prefix: DEFAULT_IQN_PREFIX.to_string(),
            dry_run: true,
            node_name: None,
            use_nsenter: true,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            skip_cluster: false,
            json: false,
        }
    }
}
