// components/zfs_mirror/src/commands.rs
//! Remote command lines
//!
//! Every command this crate sends to a host is built here. Arguments are
//! validated identifiers (see [`crate::types`]) so nothing needs quoting.

use crate::types::{DiskId, PartitionIndex, PoolName};

pub const PARTITION_TOOL: &str = "sgdisk";
pub const BOOT_TOOL: &str = "proxmox-boot-tool";
pub const POOL_TOOL: &str = "zpool";

/// Tools that must resolve on the host before anything is changed
pub const REQUIRED_TOOLS: [&str; 3] = [PARTITION_TOOL, BOOT_TOOL, POOL_TOOL];

pub fn pool_status(pool: &PoolName) -> String {
    format!("{} status {}", POOL_TOOL, pool)
}

/// Status of every imported pool with full device paths
pub fn all_pools_status() -> String {
    format!("{} status -P", POOL_TOOL)
}

pub fn disk_exists(disk: &DiskId) -> String {
    format!("test -e {}", disk.device_path())
}

pub fn print_partition_table(disk: &DiskId) -> String {
    format!("{} -p {}", PARTITION_TOOL, disk.device_path())
}

/// Copy the partition table of `source` onto `target`
pub fn replicate_partition_table(source: &DiskId, target: &DiskId) -> String {
    format!(
        "{} -R {} {}",
        PARTITION_TOOL,
        target.device_path(),
        source.device_path()
    )
}

/// Regenerate the disk and partition GUIDs of `disk`
pub fn randomize_guids(disk: &DiskId) -> String {
    format!("{} -G {}", PARTITION_TOOL, disk.device_path())
}

pub fn boot_status() -> String {
    format!("{} status", BOOT_TOOL)
}

pub fn boot_format(disk: &DiskId, esp: PartitionIndex) -> String {
    format!("{} format {}", BOOT_TOOL, disk.partition_path(esp))
}

pub fn boot_init(disk: &DiskId, esp: PartitionIndex) -> String {
    format!("{} init {}", BOOT_TOOL, disk.partition_path(esp))
}

/// Size of the whole disk in bytes, no header
pub fn disk_size(disk: &DiskId) -> String {
    format!("lsblk -bndo SIZE {}", disk.device_path())
}

pub fn which(tool: &str) -> String {
    format!("which {}", tool)
}

/// Attach `new` to the vdev holding `existing`, turning it into a mirror
pub fn attach(
    pool: &PoolName,
    existing: &DiskId,
    new: &DiskId,
    partition: PartitionIndex,
) -> String {
    format!(
        "{} attach {} {} {}",
        POOL_TOOL,
        pool,
        existing.partition_path(partition),
        new.partition_path(partition)
    )
}
