// components/zfs_mirror/src/parse/topology.rs
//! `zpool status` parsing

use serde::{Serialize, Serializer};
use std::fmt;

use crate::types::{DiskId, PartitionIndex};
use remote_exec::CommandOutput;

/// States a row of the vdev listing can report
const VDEV_STATES: [&str; 8] = [
    "ONLINE", "DEGRADED", "FAULTED", "OFFLINE", "UNAVAIL", "REMOVED", "AVAIL", "INUSE",
];

/// Kinds of grouping vdev, listed as `<kind>-<n>` (`raidz1-0`, `mirror-0`, ...)
const GROUP_VDEV_KINDS: [&str; 6] = ["mirror", "raidz", "draid", "replacing", "spare", "indirect"];

/// Pool lifecycle state as reported on the `state:` line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PoolState {
    Online,
    Degraded,
    Faulted,
    /// The pool status command failed; usually "no such pool"
    Missing,
    #[default]
    Unknown,
    /// Any other state (`OFFLINE`, `UNAVAIL`, `SUSPENDED`, ...), kept verbatim
    Other(String),
}

impl PoolState {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "ONLINE" => PoolState::Online,
            "DEGRADED" => PoolState::Degraded,
            "FAULTED" => PoolState::Faulted,
            "MISSING" => PoolState::Missing,
            "" | "UNKNOWN" => PoolState::Unknown,
            other => PoolState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PoolState::Online => "ONLINE",
            PoolState::Degraded => "DEGRADED",
            PoolState::Faulted => "FAULTED",
            PoolState::Missing => "MISSING",
            PoolState::Unknown => "UNKNOWN",
            PoolState::Other(state) => state,
        }
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for PoolState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Snapshot of one pool's layout
///
/// Never cached: every caller that needs it issues a fresh status query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PoolTopology {
    pub state: PoolState,
    /// True only when a mirror vdev with at least two members was listed
    pub is_mirror: bool,
    /// Leaf device names from the vdev listing, in listing order
    pub vdev_disks: Vec<String>,
    /// First line of the `scan:` field
    pub scan: String,
}

impl PoolTopology {
    pub fn missing() -> Self {
        Self {
            state: PoolState::Missing,
            ..Self::default()
        }
    }

    /// Topology from the result of a `zpool status <pool>` command
    pub fn from_output(output: &CommandOutput) -> Self {
        if !output.success() {
            return Self::missing();
        }
        parse_pool_status(&output.stdout)
    }

    /// Any vdev member lives on `disk`
    pub fn contains_disk(&self, disk: &DiskId) -> bool {
        self.vdev_disks.iter().any(|name| disk.owns(name))
    }

    pub fn contains_partition(&self, disk: &DiskId, partition: PartitionIndex) -> bool {
        let name = disk.partition_name(partition);
        self.vdev_disks.iter().any(|member| *member == name)
    }

    /// Already a mirror that includes `disk`
    pub fn is_mirrored_with(&self, disk: &DiskId) -> bool {
        self.is_mirror && self.contains_disk(disk)
    }

    pub fn is_resilvering(&self) -> bool {
        self.scan.to_lowercase().contains("resilver in progress")
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scan.to_lowercase().contains("scrub in progress")
    }
}

/// Last path segment of a token, so `/dev/disk/by-id/x-part3` becomes `x-part3`
fn device_name(token: &str) -> &str {
    token.rsplit('/').next().unwrap_or(token)
}

/// Kind of a grouping vdev row name, e.g. `mirror` for `mirror-0`
fn group_kind(name: &str) -> Option<&str> {
    let (kind, index) = name.rsplit_once('-')?;
    let is_index = !index.is_empty() && index.chars().all(|c| c.is_ascii_digit());
    (is_index && GROUP_VDEV_KINDS.iter().any(|group| kind.starts_with(group))).then_some(kind)
}

/// Parse the text of `zpool status <pool>`
///
/// A vdev row is a name followed by a device state. The pool's own row and
/// grouping rows are not members; every other row is, whatever its naming
/// scheme. Unrecognized lines are ignored; garbage in gives the `UNKNOWN`
/// zero value.
pub fn parse_pool_status(text: &str) -> PoolTopology {
    let mut topology = PoolTopology::default();
    let mut pool_name = None;
    let mut saw_mirror_vdev = false;

    for line in text.lines().map(str::trim) {
        if let Some(pool) = line.strip_prefix("pool:") {
            pool_name = Some(pool.trim());
            continue;
        }
        if let Some(state) = line.strip_prefix("state:") {
            topology.state = PoolState::parse(state);
            continue;
        }
        if let Some(scan) = line.strip_prefix("scan:") {
            topology.scan = scan.trim().to_string();
            continue;
        }

        let mut tokens = line.split_whitespace();
        let (Some(name), Some(state)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        if !VDEV_STATES.contains(&state) || pool_name == Some(name) {
            continue;
        }
        match group_kind(name) {
            Some("mirror") => saw_mirror_vdev = true,
            Some(_) => {}
            None => topology.vdev_disks.push(device_name(name).to_string()),
        }
    }

    topology.is_mirror = saw_mirror_vdev && topology.vdev_disks.len() >= 2;
    topology
}

/// True if any token in a whole-system status dump names `disk` or one of its partitions
pub fn mentions_disk(text: &str, disk: &DiskId) -> bool {
    text.split_whitespace()
        .map(device_name)
        .any(|name| disk.owns(name))
}
