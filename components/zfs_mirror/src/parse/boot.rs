// components/zfs_mirror/src/parse/boot.rs
//! `proxmox-boot-tool status` parsing

/// True if the status listing registers `partition_path` as an ESP
///
/// Entries look like `E1AE: /dev/disk/by-id/<disk>-part2`. The path has to
/// match a whole token so `-part2` does not also match `-part20`.
pub fn lists_partition(status: &str, partition_path: &str) -> bool {
    status
        .lines()
        .flat_map(str::split_whitespace)
        .any(|token| token == partition_path)
}
