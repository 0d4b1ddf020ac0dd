// SPDX-License-Identifier: GPL-3.0-only

//! In-memory host and cluster doubles for end-to-end runs.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use csi_reconciler::PersistentVolumeSource;
use csi_sys::command::NO_MATCH_EXIT_CODE;
use csi_sys::{CommandOutput, CommandRunner, HostCommand, SysError};

pub const IQN_PREFIX: &str = "iqn.2024-03.lan.asgard:knas";
pub const PARENT: &str = "data/csi/iscsi";

pub fn iqn(volume: &str) -> String {
    format!("{IQN_PREFIX}:{volume}")
}

#[derive(Default)]
struct HostState {
    targets: Vec<String>,
    datasets: Vec<String>,
    executed: Vec<String>,
    failures: HashMap<String, i32>,
    zfs_failure: Option<i32>,
}

/// A node with an iSCSI initiator database and a ZFS pool.
#[derive(Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node record for `volume` under the configured IQN prefix.
    pub fn with_target(self, volume: &str) -> Self {
        self.state.lock().unwrap().targets.push(iqn(volume));
        self
    }

    /// Add a node record with an arbitrary target name.
    pub fn with_raw_target(self, target: &str) -> Self {
        self.state.lock().unwrap().targets.push(target.to_string());
        self
    }

    /// Add a volume below the CSI parent dataset.
    pub fn with_volume(self, volume: &str) -> Self {
        self.with_dataset(&format!("{PARENT}/{volume}"))
    }

    pub fn with_dataset(self, dataset: &str) -> Self {
        self.state.lock().unwrap().datasets.push(dataset.to_string());
        self
    }

    /// Make the rendered command exit with `code`.
    pub fn failing(self, command: &str, code: i32) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(command.to_string(), code);
        self
    }

    pub fn failing_zfs(self, code: i32) -> Self {
        self.state.lock().unwrap().zfs_failure = Some(code);
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn destructive_commands(&self) -> Vec<String> {
        self.executed()
            .into_iter()
            .filter(|command| command.ends_with(" -u") || command.ends_with(" -o delete"))
            .collect()
    }

    pub fn targets(&self) -> Vec<String> {
        self.state.lock().unwrap().targets.clone()
    }

    pub fn datasets(&self) -> Vec<String> {
        self.state.lock().unwrap().datasets.clone()
    }
}

/// Exit the way `HostExecutor` reports it: code 1 is a no-match.
fn exit_with(command: &HostCommand, code: i32, stderr: &str) -> csi_sys::Result<CommandOutput> {
    if code == NO_MATCH_EXIT_CODE {
        Ok(CommandOutput::NoMatch)
    } else {
        Err(failed(command, code, stderr))
    }
}

fn failed(command: &HostCommand, code: i32, stderr: &str) -> SysError {
    SysError::Failed {
        command: command.render(),
        code: Some(code),
        stderr: stderr.to_string(),
    }
}

#[async_trait]
impl CommandRunner for FakeHost {
    async fn run(&self, command: &HostCommand) -> csi_sys::Result<CommandOutput> {
        let rendered = command.render();
        let mut state = self.state.lock().unwrap();
        state.executed.push(rendered.clone());

        if let Some(code) = state.failures.get(&rendered) {
            return exit_with(command, *code, "injected failure");
        }

        let args: Vec<&str> = command.arguments().iter().map(String::as_str).collect();
        match (command.program(), args.as_slice()) {
            ("iscsiadm", ["-m", "node"]) => {
                if state.targets.is_empty() {
                    return Err(failed(command, 21, "iscsiadm: No records found"));
                }
                let listing = state
                    .targets
                    .iter()
                    .map(|target| format!("10.0.0.5:3260,1 {target}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(CommandOutput::Stdout(listing))
            }
            ("iscsiadm", ["-m", "node", "-T", target, "-u"]) => {
                if state.targets.iter().any(|known| known == target) {
                    Ok(CommandOutput::Stdout(format!("Logout of [{target}] successful.")))
                } else {
                    Err(failed(command, 21, "No matching sessions found"))
                }
            }
            ("iscsiadm", ["-m", "node", "-T", target, "-o", "delete"]) => {
                let before = state.targets.len();
                state.targets.retain(|known| known != target);
                if state.targets.len() < before {
                    Ok(CommandOutput::Stdout(String::new()))
                } else {
                    Err(failed(command, 21, "No records found"))
                }
            }
            // Datasets are listed verbatim so stray lines reach the parser.
            ("zfs", ["list", "-t", "volume", "-H", "-o", "name", "-r", _parent]) => {
                if let Some(code) = state.zfs_failure {
                    return exit_with(
                        command,
                        code,
                        "cannot open 'data/csi/iscsi': pool I/O is currently suspended",
                    );
                }
                Ok(CommandOutput::Stdout(state.datasets.join("\n")))
            }
            _ => Err(failed(command, 127, "command not found")),
        }
    }
}

/// Cluster that answers with a fixed list of PV names.
pub struct StaticVolumes(pub Vec<&'static str>);

#[async_trait]
impl PersistentVolumeSource for StaticVolumes {
    async fn list_names(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.0.iter().map(|name| name.to_string()).collect())
    }
}

/// Cluster whose API is unreachable.
pub struct UnreachableCluster;

#[async_trait]
impl PersistentVolumeSource for UnreachableCluster {
    async fn list_names(&self) -> anyhow::Result<Vec<String>> {
        anyhow::bail!("error trying to connect: tcp connect error: Connection refused")
    }
}
