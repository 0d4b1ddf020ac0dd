// SPDX-License-Identifier: GPL-3.0-only

//! Shared data types for the CSI reconciler
//!
//! Everything here is single-run scoped: inventories are built fresh on each
//! reconciliation pass and the report is discarded once printed.

pub mod inventory;
pub mod report;
pub mod volume;

pub use inventory::{Inventory, InventorySource, InventorySummary, SourceStatus};
pub use report::{ActionOutcome, CleanupAction, CleanupStep, RunReport};
pub use volume::{IscsiTarget, VOLUME_ID_PREFIX, VolumeId};
