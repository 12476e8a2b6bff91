// components/zfs_mirror/src/stages/stage1_clone.rs
//! Stage 1: Copy the existing disk's partition table onto the new disk

use async_trait::async_trait;

use crate::commands;
use crate::inspect::Inspector;
use crate::stages::{MirrorStage, PlannedCommand, StageName};
use crate::types::MirrorSpec;

#[derive(Debug, Clone, Copy)]
pub struct ClonePartitions;

#[async_trait]
impl MirrorStage for ClonePartitions {
    fn name(&self) -> StageName {
        StageName::ClonePartitions
    }

    fn description(&self) -> &'static str {
        "Clone partition table onto the new disk"
    }

    async fn satisfied(&self, inspector: &Inspector<'_>, spec: &MirrorSpec) -> Option<String> {
        inspector
            .partitions_match(&spec.existing_disk, &spec.new_disk)
            .await
            .then(|| "already match".to_string())
    }

    fn plan(&self, spec: &MirrorSpec) -> Vec<PlannedCommand> {
        vec![PlannedCommand::new(
            "clone",
            commands::replicate_partition_table(&spec.existing_disk, &spec.new_disk),
        )]
    }
}
