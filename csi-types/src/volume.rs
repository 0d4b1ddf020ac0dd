// SPDX-License-Identifier: GPL-3.0-only

//! Volume identifiers and the iSCSI target records they are derived from.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prefix carried by every volume the CSI driver provisions.
pub const VOLUME_ID_PREFIX: &str = "pvc-";

static VOLUME_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pvc-[a-f0-9-]+").expect("volume id pattern compiles"));

/// Identifier of a CSI volume, e.g. `pvc-3f1c0a2e-...`.
///
/// Compared by exact, case-sensitive string equality. Deserialization goes
/// through [`VolumeId::from_name`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct VolumeId(String);

impl VolumeId {
    /// Accept a bare volume name (ZFS dataset leaf, PV name).
    ///
    /// Returns `None` unless the name carries [`VOLUME_ID_PREFIX`] followed by
    /// at least one character.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.len() > VOLUME_ID_PREFIX.len() && name.starts_with(VOLUME_ID_PREFIX) {
            Some(Self(name.to_string()))
        } else {
            None
        }
    }

    /// Find the first volume identifier embedded in a longer string such as
    /// an IQN.
    pub fn extract(text: &str) -> Option<Self> {
        VOLUME_ID_PATTERN
            .find(text)
            .map(|found| Self(found.as_str().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VolumeId {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::from_name(&name)
            .ok_or_else(|| format!("not a volume identifier (expected {VOLUME_ID_PREFIX}...): {name}"))
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A configured iSCSI node record: the full target name plus the volume it
/// serves.
///
/// The full name is kept because `iscsiadm` needs it to log out of and
/// delete the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IscsiTarget {
    pub volume: VolumeId,
    pub target: String,
}

impl IscsiTarget {
    /// Build a record from a full target name, or `None` if no volume
    /// identifier can be derived from it.
    pub fn from_target_name(target: &str) -> Option<Self> {
        VolumeId::extract(target).map(|volume| Self {
            volume,
            target: target.to_string(),
        })
    }
}
