// components/zfs_mirror/src/parse/mod.rs
//! Parsers for remote tool output
//!
//! The tools behind the inspectors print human-oriented text, so their
//! output is a loose protocol. All of it is interpreted here, one submodule
//! per tool. Parsers never fail: malformed input yields the value that
//! blocks progress (unknown state, no GUID, no size).

mod boot;
mod partition_table;
mod topology;

pub use boot::lists_partition;
pub use partition_table::PartitionTable;
pub use topology::{mentions_disk, parse_pool_status, PoolState, PoolTopology};

/// Byte count from `lsblk -bndo SIZE`
pub fn parse_size_bytes(text: &str) -> Option<u64> {
    text.lines().next()?.trim().parse().ok()
}
