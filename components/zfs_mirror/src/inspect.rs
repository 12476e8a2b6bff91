// components/zfs_mirror/src/inspect.rs
//! Read-only state queries against a host
//!
//! Each query issues its own commands and parses the answer on the spot.
//! Nothing is remembered between calls, so a caller always sees the state
//! left behind by whatever ran before it.

use std::collections::BTreeMap;

use remote_exec::RemoteExecutor;

use crate::commands;
use crate::parse::{self, PartitionTable, PoolTopology};
use crate::types::{DiskId, PartitionIndex, PoolName};

pub struct Inspector<'a> {
    exec: &'a dyn RemoteExecutor,
}

impl<'a> Inspector<'a> {
    pub fn new(exec: &'a dyn RemoteExecutor) -> Self {
        Self { exec }
    }

    pub async fn pool_topology(&self, pool: &PoolName) -> PoolTopology {
        let output = self.exec.execute(&commands::pool_status(pool)).await;
        let topology = PoolTopology::from_output(&output);
        tracing::debug!(
            %pool,
            state = %topology.state,
            is_mirror = topology.is_mirror,
            disks = topology.vdev_disks.len(),
            "pool topology"
        );
        topology
    }

    pub async fn disk_exists(&self, disk: &DiskId) -> bool {
        self.exec
            .execute(&commands::disk_exists(disk))
            .await
            .success()
    }

    /// Partition table of `disk`; empty if it cannot be read
    pub async fn partition_table(&self, disk: &DiskId) -> PartitionTable {
        let output = self.exec.execute(&commands::print_partition_table(disk)).await;
        if !output.success() {
            tracing::debug!(%disk, stderr = %output.stderr, "cannot read partition table");
            return PartitionTable::default();
        }
        PartitionTable::parse(&output.stdout)
    }

    pub async fn partitions_match(&self, source: &DiskId, target: &DiskId) -> bool {
        let source = self.partition_table(source).await;
        let target = self.partition_table(target).await;
        source.same_layout(&target)
    }

    /// False unless both disk GUIDs are readable and different
    pub async fn guids_differ(&self, source: &DiskId, target: &DiskId) -> bool {
        let source = self.partition_table(source).await;
        let target = self.partition_table(target).await;
        source.guid_differs_from(&target)
    }

    pub async fn boot_configured(&self, disk: &DiskId, esp: PartitionIndex) -> bool {
        let output = self.exec.execute(&commands::boot_status()).await;
        output.success() && parse::lists_partition(&output.stdout, &disk.partition_path(esp))
    }

    pub async fn pool_is_resilvering(&self, pool: &PoolName) -> bool {
        self.pool_topology(pool).await.is_resilvering()
    }

    pub async fn pool_is_scrubbing(&self, pool: &PoolName) -> bool {
        self.pool_topology(pool).await.is_scrubbing()
    }

    /// Size in bytes, `None` if unknown
    pub async fn disk_size(&self, disk: &DiskId) -> Option<u64> {
        let output = self.exec.execute(&commands::disk_size(disk)).await;
        if !output.success() {
            return None;
        }
        parse::parse_size_bytes(&output.stdout)
    }

    /// True if any imported pool uses a partition of `disk`
    pub async fn disk_in_any_pool(&self, disk: &DiskId) -> bool {
        let output = self.exec.execute(&commands::all_pools_status()).await;
        output.success() && parse::mentions_disk(&output.stdout, disk)
    }

    pub async fn required_tools_present(&self) -> BTreeMap<&'static str, bool> {
        let mut tools = BTreeMap::new();
        for tool in commands::REQUIRED_TOOLS {
            let present = self.exec.execute(&commands::which(tool)).await.success();
            tools.insert(tool, present);
        }
        tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::PoolState;
    use crate::testing::fixtures::*;
    use crate::testing::{existing_disk, new_disk, rpool_spec, ScriptedExecutor};
    use remote_exec::CommandOutput;

    fn rpool() -> PoolName {
        PoolName::new("rpool").unwrap()
    }

    #[tokio::test]
    async fn topology_of_single_disk_pool() {
        let exec = ScriptedExecutor::single_disk_host();
        let topology = Inspector::new(&exec).pool_topology(&rpool()).await;

        assert_eq!(topology.state, PoolState::Online);
        assert!(!topology.is_mirror);
        assert!(topology.vdev_disks[0].contains(EXISTING_DISK));
    }

    #[tokio::test]
    async fn topology_of_missing_pool() {
        let exec = ScriptedExecutor::new().failing(
            "zpool status rpool",
            "cannot open 'rpool': no such pool",
            1,
        );
        let topology = Inspector::new(&exec).pool_topology(&rpool()).await;
        assert_eq!(topology.state, PoolState::Missing);
    }

    #[tokio::test]
    async fn disk_exists_follows_exit_code() {
        let exec = ScriptedExecutor::single_disk_host();
        let inspector = Inspector::new(&exec);
        let absent = DiskId::new("ata-nonexistent").unwrap();

        assert!(inspector.disk_exists(&existing_disk()).await);
        assert!(!inspector.disk_exists(&absent).await);
    }

    #[tokio::test]
    async fn disk_in_any_pool_finds_mmc_members() {
        let exec = ScriptedExecutor::new()
            .with(commands::all_pools_status(), ZPOOL_STATUS_MMC_ALL_POOLS);
        let inspector = Inspector::new(&exec);

        assert!(inspector.disk_in_any_pool(&DiskId::new(MMC_NEW_DISK).unwrap()).await);
        assert!(!inspector.disk_in_any_pool(&DiskId::new("mmc-SD32G_0x3333").unwrap()).await);
    }

    #[tokio::test]
    async fn partitions_match_after_clone() {
        let exec = ScriptedExecutor::single_disk_host();
        let inspector = Inspector::new(&exec);
        assert!(!inspector.partitions_match(&existing_disk(), &new_disk()).await);
        assert!(!inspector.partitions_match(&new_disk(), &existing_disk()).await);

        exec.respond(
            commands::print_partition_table(&new_disk()),
            CommandOutput::ok(SGDISK_NEW_CLONED_SAME_GUID),
        );
        assert!(inspector.partitions_match(&existing_disk(), &new_disk()).await);
        assert!(inspector.partitions_match(&new_disk(), &existing_disk()).await);
    }

    #[tokio::test]
    async fn unreadable_partition_table_never_matches() {
        let exec = ScriptedExecutor::single_disk_host().failing(
            commands::print_partition_table(&new_disk()),
            "Problem opening /dev/disk/by-id/x for reading!",
            2,
        );
        let inspector = Inspector::new(&exec);

        assert!(!inspector.partitions_match(&existing_disk(), &new_disk()).await);
        assert!(!inspector.guids_differ(&existing_disk(), &new_disk()).await);
    }

    #[tokio::test]
    async fn identical_guids_do_not_differ() {
        let exec = ScriptedExecutor::single_disk_host().with(
            commands::print_partition_table(&new_disk()),
            SGDISK_NEW_CLONED_SAME_GUID,
        );
        assert!(!Inspector::new(&exec).guids_differ(&existing_disk(), &new_disk()).await);
    }

    #[tokio::test]
    async fn randomized_guids_differ() {
        let exec = ScriptedExecutor::single_disk_host().with(
            commands::print_partition_table(&new_disk()),
            SGDISK_NEW_CLONED_DIFF_GUID,
        );
        assert!(Inspector::new(&exec).guids_differ(&existing_disk(), &new_disk()).await);
    }

    #[tokio::test]
    async fn boot_configured_needs_listed_esp() {
        let spec = rpool_spec();
        let exec = ScriptedExecutor::single_disk_host();
        let inspector = Inspector::new(&exec);
        assert!(!inspector.boot_configured(&spec.new_disk, spec.efi_partition).await);

        exec.respond(commands::boot_status(), CommandOutput::ok(BOOT_TOOL_STATUS_BOTH));
        assert!(inspector.boot_configured(&spec.new_disk, spec.efi_partition).await);
    }

    #[tokio::test]
    async fn boot_status_failure_is_not_configured() {
        let exec = ScriptedExecutor::new().failing(
            commands::boot_status(),
            "proxmox-boot-tool: command not found",
            127,
        );
        assert!(!Inspector::new(&exec)
            .boot_configured(&existing_disk(), PartitionIndex::EFI)
            .await);
    }

    #[tokio::test]
    async fn resilver_and_scrub_detection() {
        let exec = ScriptedExecutor::new().with("zpool status rpool", ZPOOL_STATUS_MIRROR);
        let inspector = Inspector::new(&exec);
        assert!(inspector.pool_is_resilvering(&rpool()).await);
        assert!(!inspector.pool_is_scrubbing(&rpool()).await);

        exec.respond(
            "zpool status rpool",
            CommandOutput::ok(ZPOOL_STATUS_SINGLE.replace(
                "scrub repaired 0B in 00:02:30 with 0 errors on Sun Jan 12 00:26:31 2026",
                "Scrub in progress since Sun Jan 12 00:24:01 2026",
            )),
        );
        assert!(!inspector.pool_is_resilvering(&rpool()).await);
        assert!(inspector.pool_is_scrubbing(&rpool()).await);
    }

    #[tokio::test]
    async fn disk_size_parses_bytes_or_gives_up() {
        let exec = ScriptedExecutor::single_disk_host()
            .with(commands::disk_size(&new_disk()), "garbage");
        let inspector = Inspector::new(&exec);

        assert_eq!(inspector.disk_size(&existing_disk()).await, Some(2_000_398_934_016));
        assert_eq!(inspector.disk_size(&new_disk()).await, None);
    }

    #[tokio::test]
    async fn disk_in_any_pool_uses_full_status() {
        let exec = ScriptedExecutor::single_disk_host();
        let inspector = Inspector::new(&exec);

        assert!(inspector.disk_in_any_pool(&existing_disk()).await);
        assert!(!inspector.disk_in_any_pool(&new_disk()).await);
    }

    #[tokio::test]
    async fn all_tools_probed() {
        let exec = ScriptedExecutor::single_disk_host().failing("which sgdisk", "", 1);
        let tools = Inspector::new(&exec).required_tools_present().await;

        assert_eq!(tools.len(), 3);
        assert_eq!(tools["sgdisk"], false);
        assert_eq!(tools["proxmox-boot-tool"], true);
        assert_eq!(tools["zpool"], true);
    }
}
