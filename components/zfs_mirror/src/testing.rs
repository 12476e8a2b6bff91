// components/zfs_mirror/src/testing.rs
//! Test support: captured tool output and a scripted executor

use async_trait::async_trait;
use parking_lot::Mutex;
use remote_exec::{CommandOutput, RemoteExecutor};

use crate::commands;
use crate::types::{DiskId, MirrorSpec, PoolName};

pub mod fixtures {
    pub const HOST: &str = "still-fawn";
    pub const EXISTING_DISK: &str = "ata-T-FORCE_2TB_TPBF2211070040100214";
    pub const NEW_DISK: &str = "ata-T-FORCE_2TB_TPBF2509220070101290";
    pub const DISK_SIZE: &str = "2000398934016";

    pub const ZPOOL_STATUS_SINGLE: &str = r#"  pool: rpool
 state: ONLINE
  scan: scrub repaired 0B in 00:02:30 with 0 errors on Sun Jan 12 00:26:31 2026
config:

	NAME                                                  STATE     READ WRITE CKSUM
	rpool                                                 ONLINE       0     0     0
	  ata-T-FORCE_2TB_TPBF2211070040100214-part3          ONLINE       0     0     0

errors: No known data errors
"#;

    pub const ZPOOL_STATUS_MIRROR: &str = r#"  pool: rpool
 state: ONLINE
  scan: resilver in progress since Fri Jan 31 10:00:00 2026
config:

	NAME                                                  STATE     READ WRITE CKSUM
	rpool                                                 ONLINE       0     0     0
	  mirror-0                                            ONLINE       0     0     0
	    ata-T-FORCE_2TB_TPBF2211070040100214-part3        ONLINE       0     0     0
	    ata-T-FORCE_2TB_TPBF2509220070101290-part3        ONLINE       0     0     0

errors: No known data errors
"#;

    pub const ZPOOL_STATUS_MIRROR_COMPLETE: &str = r#"  pool: rpool
 state: ONLINE
  scan: resilver completed on Fri Jan 31 12:00:00 2026
config:

	NAME                                                  STATE     READ WRITE CKSUM
	rpool                                                 ONLINE       0     0     0
	  mirror-0                                            ONLINE       0     0     0
	    ata-T-FORCE_2TB_TPBF2211070040100214-part3        ONLINE       0     0     0
	    ata-T-FORCE_2TB_TPBF2509220070101290-part3        ONLINE       0     0     0

errors: No known data errors
"#;

    /// `zpool status -P` on a host where only the existing disk is in use
    pub const ZPOOL_STATUS_ALL_POOLS: &str = r#"  pool: rpool
 state: ONLINE
  scan: scrub repaired 0B in 00:02:30 with 0 errors on Sun Jan 12 00:26:31 2026
config:

	NAME                                                                STATE     READ WRITE CKSUM
	rpool                                                               ONLINE       0     0     0
	  /dev/disk/by-id/ata-T-FORCE_2TB_TPBF2211070040100214-part3        ONLINE       0     0     0

errors: No known data errors
"#;

    /// SD cards show up under `mmc-` names
    pub const MMC_EXISTING_DISK: &str = "mmc-SD32G_0x1111";
    pub const MMC_NEW_DISK: &str = "mmc-SD32G_0x2222";

    pub const ZPOOL_STATUS_MMC_MIRROR: &str = r#"  pool: rpool
 state: ONLINE
  scan: resilvered 6.10G in 00:04:12 with 0 errors on Sat Feb  7 09:12:40 2026
config:

	NAME                        STATE     READ WRITE CKSUM
	rpool                       ONLINE       0     0     0
	  mirror-0                  ONLINE       0     0     0
	    mmc-SD32G_0x1111-part3  ONLINE       0     0     0
	    mmc-SD32G_0x2222-part3  ONLINE       0     0     0

errors: No known data errors
"#;

    /// `zpool status -P` with the second card already serving another pool
    pub const ZPOOL_STATUS_MMC_ALL_POOLS: &str = r#"  pool: rpool
 state: ONLINE
config:

	NAME                                          STATE     READ WRITE CKSUM
	rpool                                         ONLINE       0     0     0
	  /dev/disk/by-id/mmc-SD32G_0x1111-part3      ONLINE       0     0     0

errors: No known data errors

  pool: scratch
 state: ONLINE
config:

	NAME                                          STATE     READ WRITE CKSUM
	scratch                                       ONLINE       0     0     0
	  /dev/disk/by-id/mmc-SD32G_0x2222-part1      ONLINE       0     0     0

errors: No known data errors
"#;

    pub const SGDISK_EXISTING: &str = r#"Disk /dev/disk/by-id/ata-T-FORCE_2TB_TPBF2211070040100214: 3907029168 sectors, 1.8 TiB
Disk identifier (GUID): AAAA1111-2222-3333-4444-555566667777
Number  Start (sector)    End (sector)  Size       Code  Name
   1            2048         1048575   511.0 MiB   EF02  BIOS boot partition
   2         1048576         2097151   512.0 MiB   EF00  EFI System
   3         2097152      3907029134   1.8 TiB     BF00  zfs
"#;

    pub const SGDISK_NEW_EMPTY: &str = r#"Disk /dev/disk/by-id/ata-T-FORCE_2TB_TPBF2509220070101290: 3907029168 sectors, 1.8 TiB
Disk identifier (GUID): BBBB1111-2222-3333-4444-555566667777
Number  Start (sector)    End (sector)  Size       Code  Name
"#;

    pub const SGDISK_NEW_CLONED_SAME_GUID: &str = r#"Disk /dev/disk/by-id/ata-T-FORCE_2TB_TPBF2509220070101290: 3907029168 sectors, 1.8 TiB
Disk identifier (GUID): AAAA1111-2222-3333-4444-555566667777
Number  Start (sector)    End (sector)  Size       Code  Name
   1            2048         1048575   511.0 MiB   EF02  BIOS boot partition
   2         1048576         2097151   512.0 MiB   EF00  EFI System
   3         2097152      3907029134   1.8 TiB     BF00  zfs
"#;

    pub const SGDISK_NEW_CLONED_DIFF_GUID: &str = r#"Disk /dev/disk/by-id/ata-T-FORCE_2TB_TPBF2509220070101290: 3907029168 sectors, 1.8 TiB
Disk identifier (GUID): CCCC1111-2222-3333-4444-555566667777
Number  Start (sector)    End (sector)  Size       Code  Name
   1            2048         1048575   511.0 MiB   EF02  BIOS boot partition
   2         1048576         2097151   512.0 MiB   EF00  EFI System
   3         2097152      3907029134   1.8 TiB     BF00  zfs
"#;

    pub const BOOT_TOOL_STATUS_SINGLE: &str = r#"Re-executing '/usr/sbin/proxmox-boot-tool' in new private mount namespace..
System currently booted with uefi
E1AE: /dev/disk/by-id/ata-T-FORCE_2TB_TPBF2211070040100214-part2
"#;

    pub const BOOT_TOOL_STATUS_BOTH: &str = r#"Re-executing '/usr/sbin/proxmox-boot-tool' in new private mount namespace..
System currently booted with uefi
E1AE: /dev/disk/by-id/ata-T-FORCE_2TB_TPBF2211070040100214-part2
F2BF: /dev/disk/by-id/ata-T-FORCE_2TB_TPBF2509220070101290-part2
"#;
}

use fixtures::*;

pub fn existing_disk() -> DiskId {
    DiskId::new(EXISTING_DISK).unwrap()
}

pub fn new_disk() -> DiskId {
    DiskId::new(NEW_DISK).unwrap()
}

pub fn rpool_spec() -> MirrorSpec {
    MirrorSpec::new(PoolName::new("rpool").unwrap(), existing_disk(), new_disk()).unwrap()
}

/// Prefixes of every command that changes a disk or a pool
const MUTATING_PREFIXES: [&str; 5] = [
    "sgdisk -R",
    "sgdisk -G",
    "proxmox-boot-tool format",
    "proxmox-boot-tool init",
    "zpool attach",
];

/// In-memory executor answering from a script
///
/// Commands are matched exactly; the most recently added answer wins, so a
/// test can start from a baseline host and override single commands.
/// Unscripted commands fail with exit code 127.
#[derive(Default)]
pub struct ScriptedExecutor {
    script: Mutex<Vec<(String, CommandOutput)>>,
    log: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host with a healthy single-disk `rpool` and a blank, unused new disk
    pub fn single_disk_host() -> Self {
        let spec = rpool_spec();
        let existing = &spec.existing_disk;
        let new = &spec.new_disk;

        let exec = Self::new()
            .with(commands::pool_status(&spec.pool), ZPOOL_STATUS_SINGLE)
            .with(commands::all_pools_status(), ZPOOL_STATUS_ALL_POOLS)
            .with(commands::disk_exists(existing), "")
            .with(commands::disk_exists(new), "")
            .with(commands::print_partition_table(existing), SGDISK_EXISTING)
            .with(commands::print_partition_table(new), SGDISK_NEW_EMPTY)
            .with(commands::boot_status(), BOOT_TOOL_STATUS_SINGLE)
            .with(commands::disk_size(existing), DISK_SIZE)
            .with(commands::disk_size(new), DISK_SIZE)
            .with(commands::replicate_partition_table(existing, new), "The operation has completed successfully.")
            .with(commands::randomize_guids(new), "The operation has completed successfully.")
            .with(commands::boot_format(new, spec.efi_partition), "")
            .with(commands::boot_init(new, spec.efi_partition), "")
            .with(
                commands::attach(&spec.pool, existing, new, spec.zfs_partition),
                "",
            );

        commands::REQUIRED_TOOLS
            .iter()
            .fold(exec, |exec, tool| {
                exec.with(commands::which(tool), format!("/usr/sbin/{}", tool))
            })
    }

    /// Answer `command` with a successful `stdout`
    pub fn with(self, command: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.respond(command, CommandOutput::ok(stdout));
        self
    }

    /// Answer `command` with a failure
    pub fn failing(self, command: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        self.respond(command, CommandOutput::new("", stderr, exit_code));
        self
    }

    /// Change an answer after construction
    pub fn respond(&self, command: impl Into<String>, output: CommandOutput) {
        self.script.lock().push((command.into(), output));
    }

    /// Every command issued so far, in order
    pub fn commands(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn mutating_commands(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|command| MUTATING_PREFIXES.iter().any(|p| command.starts_with(p)))
            .collect()
    }

    pub fn count(&self, command: &str) -> usize {
        self.log.lock().iter().filter(|c| *c == command).count()
    }
}

#[async_trait]
impl RemoteExecutor for ScriptedExecutor {
    async fn execute(&self, command: &str) -> CommandOutput {
        self.log.lock().push(command.to_string());
        self.script
            .lock()
            .iter()
            .rev()
            .find(|(scripted, _)| scripted == command)
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::new("", format!("{}: command not found", command), 127))
    }
}
