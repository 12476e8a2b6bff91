// components/zfs_mirror/src/types.rs
//! Domain types for mirror definitions
//!
//! Every identifier here ends up inside a remote shell command line, so the
//! newtypes only admit a conservative character set. Construction goes
//! through the validating constructors (or serde, which calls them).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Directory holding the stable, hardware-derived disk links
pub const BY_ID_DIR: &str = "/dev/disk/by-id";

fn validate_chars(
    kind: &'static str,
    value: &str,
    allowed: impl Fn(char) -> bool,
) -> Result<(), ValidationError> {
    match value.chars().find(|c| !allowed(*c)) {
        Some(ch) => Err(ValidationError::InvalidCharacter {
            kind,
            value: value.to_string(),
            ch,
        }),
        None => Ok(()),
    }
}

// ============================================================================
// Pool name
// ============================================================================

/// Name of a storage pool, e.g. `rpool`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PoolName(String);

impl PoolName {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let Some(first) = name.chars().next() else {
            return Err(ValidationError::Empty { kind: "pool name" });
        };
        if !first.is_ascii_alphabetic() {
            return Err(ValidationError::InvalidStart {
                kind: "pool name",
                value: name,
                expected: "a letter",
            });
        }
        validate_chars("pool name", &name, |c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
        })?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PoolName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PoolName> for String {
    fn from(name: PoolName) -> Self {
        name.0
    }
}

// ============================================================================
// Disk identifier
// ============================================================================

/// Stable disk name under `/dev/disk/by-id`, e.g. `ata-T-FORCE_2TB_TPBF2211070040100214`
///
/// Transient names like `sda` are accepted by the type but defeat the point;
/// configuration should always use the by-id name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiskId(String);

impl DiskId {
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let Some(first) = id.chars().next() else {
            return Err(ValidationError::Empty { kind: "disk id" });
        };
        if !first.is_ascii_alphanumeric() {
            return Err(ValidationError::InvalidStart {
                kind: "disk id",
                value: id,
                expected: "a letter or digit",
            });
        }
        validate_chars("disk id", &id, |c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '+' | '@')
        })?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full device path, e.g. `/dev/disk/by-id/ata-X`
    pub fn device_path(&self) -> String {
        format!("{}/{}", BY_ID_DIR, self.0)
    }

    /// Partition name as it appears in pool listings, e.g. `ata-X-part3`
    pub fn partition_name(&self, index: PartitionIndex) -> String {
        format!("{}-part{}", self.0, index)
    }

    /// Full partition path, e.g. `/dev/disk/by-id/ata-X-part3`
    pub fn partition_path(&self, index: PartitionIndex) -> String {
        format!("{}/{}", BY_ID_DIR, self.partition_name(index))
    }

    /// True if `name` is this disk or one of its partitions
    pub fn owns(&self, name: &str) -> bool {
        match name.strip_prefix(self.0.as_str()) {
            Some("") => true,
            Some(rest) => rest
                .strip_prefix("-part")
                .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit())),
            None => false,
        }
    }
}

impl fmt::Display for DiskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DiskId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiskId> for String {
    fn from(id: DiskId) -> Self {
        id.0
    }
}

// ============================================================================
// Partition index
// ============================================================================

/// 1-based GPT partition number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PartitionIndex(u32);

impl PartitionIndex {
    pub const BIOS_BOOT: PartitionIndex = PartitionIndex(1);
    pub const EFI: PartitionIndex = PartitionIndex(2);
    pub const ZFS: PartitionIndex = PartitionIndex(3);

    pub fn new(index: u32) -> Result<Self, ValidationError> {
        if index == 0 {
            return Err(ValidationError::PartitionIndex(index));
        }
        Ok(Self(index))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PartitionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for PartitionIndex {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PartitionIndex> for u32 {
    fn from(index: PartitionIndex) -> Self {
        index.0
    }
}

// ============================================================================
// Mirror definition
// ============================================================================

/// One single-disk pool that should become a two-way mirror
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MirrorSpecConfig")]
pub struct MirrorSpec {
    pub pool: PoolName,
    pub existing_disk: DiskId,
    pub new_disk: DiskId,
    /// Partition holding the pool data
    pub zfs_partition: PartitionIndex,
    /// EFI system partition registered with the boot tool
    pub efi_partition: PartitionIndex,
    pub bios_boot_partition: PartitionIndex,
}

impl MirrorSpec {
    /// Mirror definition with the default Proxmox layout (1 = BIOS boot, 2 = ESP, 3 = ZFS)
    pub fn new(
        pool: PoolName,
        existing_disk: DiskId,
        new_disk: DiskId,
    ) -> Result<Self, ValidationError> {
        if existing_disk == new_disk {
            return Err(ValidationError::SameDisk(new_disk.0));
        }
        Ok(Self {
            pool,
            existing_disk,
            new_disk,
            zfs_partition: PartitionIndex::ZFS,
            efi_partition: PartitionIndex::EFI,
            bios_boot_partition: PartitionIndex::BIOS_BOOT,
        })
    }

    pub fn with_partitions(
        mut self,
        zfs: PartitionIndex,
        efi: PartitionIndex,
        bios_boot: PartitionIndex,
    ) -> Self {
        self.zfs_partition = zfs;
        self.efi_partition = efi;
        self.bios_boot_partition = bios_boot;
        self
    }
}

impl fmt::Display for MirrorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} + {}",
            self.pool, self.existing_disk, self.new_disk
        )
    }
}

/// Shape of a mirror entry in the cluster file
#[derive(Debug, Deserialize)]
struct MirrorSpecConfig {
    pool: PoolName,
    existing_disk: DiskId,
    new_disk: DiskId,
    #[serde(default = "default_zfs_partition")]
    zfs_partition: PartitionIndex,
    #[serde(default = "default_efi_partition")]
    efi_partition: PartitionIndex,
    #[serde(default = "default_bios_boot_partition")]
    bios_boot_partition: PartitionIndex,
}

fn default_zfs_partition() -> PartitionIndex {
    PartitionIndex::ZFS
}

fn default_efi_partition() -> PartitionIndex {
    PartitionIndex::EFI
}

fn default_bios_boot_partition() -> PartitionIndex {
    PartitionIndex::BIOS_BOOT
}

impl TryFrom<MirrorSpecConfig> for MirrorSpec {
    type Error = ValidationError;

    fn try_from(raw: MirrorSpecConfig) -> Result<Self, Self::Error> {
        Ok(MirrorSpec::new(raw.pool, raw.existing_disk, raw.new_disk)?.with_partitions(
            raw.zfs_partition,
            raw.efi_partition,
            raw.bios_boot_partition,
        ))
    }
}
