// components/zfs_mirror/src/preflight.rs
//! Pre-flight validation
//!
//! Seven read-only checks run before any stage touches a disk. All of them
//! always run so the report shows every problem at once.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::inspect::Inspector;
use crate::parse::{PoolState, PoolTopology};
use crate::types::{DiskId, MirrorSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    PoolOnline,
    ExistingDiskPresent,
    NewDiskPresent,
    NewDiskFree,
    DiskSizesMatch,
    RequiredTools,
    PoolNotBusy,
}

impl CheckName {
    pub const ALL: [CheckName; 7] = [
        CheckName::PoolOnline,
        CheckName::ExistingDiskPresent,
        CheckName::NewDiskPresent,
        CheckName::NewDiskFree,
        CheckName::DiskSizesMatch,
        CheckName::RequiredTools,
        CheckName::PoolNotBusy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::PoolOnline => "pool_online",
            CheckName::ExistingDiskPresent => "existing_disk_present",
            CheckName::NewDiskPresent => "new_disk_present",
            CheckName::NewDiskFree => "new_disk_free",
            CheckName::DiskSizesMatch => "disk_sizes_match",
            CheckName::RequiredTools => "required_tools",
            CheckName::PoolNotBusy => "pool_not_busy",
        }
    }

    /// Advisory checks may fail when the pool already shows the desired state
    pub fn is_advisory(&self) -> bool {
        matches!(self, CheckName::NewDiskFree)
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreflightCheck {
    #[serde(skip)]
    pub name: CheckName,
    pub passed: bool,
    pub detail: String,
}

impl PreflightCheck {
    fn new(name: CheckName, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed,
            detail: detail.into(),
        }
    }
}

/// Result of every check, keyed by name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct PreflightReport {
    checks: BTreeMap<CheckName, PreflightCheck>,
}

impl PreflightReport {
    fn insert(&mut self, check: PreflightCheck) {
        self.checks.insert(check.name, check);
    }

    pub fn get(&self, name: CheckName) -> Option<&PreflightCheck> {
        self.checks.get(&name)
    }

    pub fn passed(&self, name: CheckName) -> bool {
        self.get(name).is_some_and(|check| check.passed)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PreflightCheck> {
        self.checks.values()
    }

    /// Every check that did not pass
    pub fn failed(&self) -> Vec<CheckName> {
        self.iter()
            .filter(|check| !check.passed)
            .map(|check| check.name)
            .collect()
    }

    /// Failed checks that must stop the run
    ///
    /// An advisory failure is excused only when `topology` already lists
    /// `new_disk` as a member of this pool. A new disk that belongs to some
    /// other pool still blocks.
    pub fn blocking_failures(&self, topology: &PoolTopology, new_disk: &DiskId) -> Vec<CheckName> {
        let new_disk_in_this_pool = topology.contains_disk(new_disk);
        self.iter()
            .filter(|check| !check.passed)
            .map(|check| check.name)
            .filter(|name| !(name.is_advisory() && new_disk_in_this_pool))
            .collect()
    }

    pub fn all_passed(&self) -> bool {
        self.iter().all(|check| check.passed)
    }
}

/// Run every check for one mirror definition
pub async fn preflight(inspector: &Inspector<'_>, spec: &MirrorSpec) -> PreflightReport {
    let mut report = PreflightReport::default();

    let topology = inspector.pool_topology(&spec.pool).await;
    report.insert(PreflightCheck::new(
        CheckName::PoolOnline,
        topology.state == PoolState::Online,
        format!("state={}", topology.state),
    ));

    report.insert(PreflightCheck::new(
        CheckName::ExistingDiskPresent,
        inspector.disk_exists(&spec.existing_disk).await,
        spec.existing_disk.device_path(),
    ));
    report.insert(PreflightCheck::new(
        CheckName::NewDiskPresent,
        inspector.disk_exists(&spec.new_disk).await,
        spec.new_disk.device_path(),
    ));

    let in_pool = inspector.disk_in_any_pool(&spec.new_disk).await;
    report.insert(PreflightCheck::new(
        CheckName::NewDiskFree,
        !in_pool,
        if in_pool {
            "already in a pool"
        } else {
            "not in any pool"
        },
    ));

    let existing_size = inspector.disk_size(&spec.existing_disk).await;
    let new_size = inspector.disk_size(&spec.new_disk).await;
    let sizes_match = matches!((existing_size, new_size), (Some(a), Some(b)) if a == b);
    report.insert(PreflightCheck::new(
        CheckName::DiskSizesMatch,
        sizes_match,
        format!(
            "existing={} new={}",
            size_label(existing_size),
            size_label(new_size)
        ),
    ));

    let tools = inspector.required_tools_present().await;
    let missing: Vec<&str> = tools
        .iter()
        .filter(|(_, present)| !**present)
        .map(|(tool, _)| *tool)
        .collect();
    report.insert(PreflightCheck::new(
        CheckName::RequiredTools,
        missing.is_empty(),
        if missing.is_empty() {
            "all present".to_string()
        } else {
            format!("missing: {}", missing.join(", "))
        },
    ));

    let busy = inspector.pool_is_resilvering(&spec.pool).await
        || inspector.pool_is_scrubbing(&spec.pool).await;
    report.insert(PreflightCheck::new(
        CheckName::PoolNotBusy,
        !busy,
        if busy { "resilvering or scrubbing" } else { "idle" },
    ));

    for check in report.iter().filter(|check| !check.passed) {
        tracing::warn!(pool = %spec.pool, check = %check.name, detail = %check.detail, "pre-flight check failed");
    }

    report
}

fn size_label(size: Option<u64>) -> String {
    size.map_or_else(|| "unknown".to_string(), |bytes| bytes.to_string())
}
