// components/zfs_mirror/src/parse/partition_table.rs
//! `sgdisk -p` parsing

use serde::Serialize;

const GUID_HEADER: &str = "Disk identifier (GUID)";

/// The parts of a GPT listing that matter for mirroring
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PartitionTable {
    /// Disk GUID; `None` if the header was missing or malformed
    pub disk_guid: Option<String>,
    /// Numbered partition rows with whitespace runs collapsed
    pub entries: Vec<String>,
}

impl PartitionTable {
    pub fn parse(text: &str) -> Self {
        let mut table = PartitionTable::default();

        for line in text.lines().map(str::trim) {
            if line.contains(GUID_HEADER) {
                table.disk_guid = line
                    .rsplit(':')
                    .next()
                    .map(str::trim)
                    .filter(|guid| is_guid(guid))
                    .map(str::to_ascii_uppercase);
                continue;
            }
            if line.starts_with(|c: char| c.is_ascii_digit()) {
                table.entries.push(line.split_whitespace().collect::<Vec<_>>().join(" "));
            }
        }

        table
    }

    /// Same partitions in the same order; an empty table never matches
    pub fn same_layout(&self, other: &PartitionTable) -> bool {
        !self.entries.is_empty() && !other.entries.is_empty() && self.entries == other.entries
    }

    /// Both GUIDs are known and different
    pub fn guid_differs_from(&self, other: &PartitionTable) -> bool {
        match (&self.disk_guid, &other.disk_guid) {
            (Some(ours), Some(theirs)) => ours != theirs,
            _ => false,
        }
    }
}

/// 8-4-4-4-12 hex digits
fn is_guid(value: &str) -> bool {
    let groups: Vec<&str> = value.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit()))
}
