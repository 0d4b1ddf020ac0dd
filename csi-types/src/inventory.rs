// SPDX-License-Identifier: GPL-3.0-only

//! Per-source volume inventories.
//!
//! Each inventory remembers whether its source was actually reachable. An
//! empty inventory from a failed source must not be confused with a source
//! that genuinely holds no volumes.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::VolumeId;

/// Where an inventory was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventorySource {
    Iscsi,
    Zfs,
    Cluster,
}

impl InventorySource {
    /// Label used in the printed report.
    pub fn label(&self) -> &'static str {
        match self {
            InventorySource::Iscsi => "iSCSI Configurations",
            InventorySource::Zfs => "ZFS Volumes",
            InventorySource::Cluster => "Kubernetes PVs",
        }
    }
}

impl fmt::Display for InventorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InventorySource::Iscsi => "iscsi",
            InventorySource::Zfs => "zfs",
            InventorySource::Cluster => "cluster",
        };
        f.write_str(name)
    }
}

/// Whether the source could be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SourceStatus {
    Available,
    /// Collection was switched off by configuration.
    Skipped,
    Unavailable { reason: String },
}

impl SourceStatus {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SourceStatus::Unavailable { .. })
    }
}

/// Set of volume identifiers observed in one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    source: InventorySource,
    status: SourceStatus,
    volumes: BTreeSet<VolumeId>,
}

impl Inventory {
    /// Empty inventory for a source that was read successfully.
    pub fn new(source: InventorySource) -> Self {
        Self {
            source,
            status: SourceStatus::Available,
            volumes: BTreeSet::new(),
        }
    }

    /// Empty inventory for a source that was deliberately not read.
    pub fn skipped(source: InventorySource) -> Self {
        Self {
            source,
            status: SourceStatus::Skipped,
            volumes: BTreeSet::new(),
        }
    }

    /// Empty inventory for a source that could not be read.
    pub fn unavailable(source: InventorySource, reason: impl Into<String>) -> Self {
        Self {
            source,
            status: SourceStatus::Unavailable {
                reason: reason.into(),
            },
            volumes: BTreeSet::new(),
        }
    }

    pub fn from_volumes(
        source: InventorySource,
        volumes: impl IntoIterator<Item = VolumeId>,
    ) -> Self {
        let mut inventory = Self::new(source);
        inventory.extend(volumes);
        inventory
    }

    pub fn source(&self) -> InventorySource {
        self.source
    }

    pub fn status(&self) -> &SourceStatus {
        &self.status
    }

    pub fn is_available(&self) -> bool {
        self.status == SourceStatus::Available
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    pub fn contains(&self, volume: &VolumeId) -> bool {
        self.volumes.contains(volume)
    }

    /// Volumes present here but absent from `other`.
    pub fn missing_from(&self, other: &Inventory) -> BTreeSet<VolumeId> {
        self.volumes.difference(&other.volumes).cloned().collect()
    }

    pub fn summary(&self) -> InventorySummary {
        InventorySummary {
            source: self.source,
            count: self.volumes.len(),
            status: self.status.clone(),
        }
    }
}

impl Extend<VolumeId> for Inventory {
    fn extend<T: IntoIterator<Item = VolumeId>>(&mut self, iter: T) {
        self.volumes.extend(iter);
    }
}

/// Count and reachability of one inventory, as carried by the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub source: InventorySource,
    pub count: usize,
    pub status: SourceStatus,
}
