// components/zfs_mirror/src/stages/stage2_guids.rs
//! Stage 2: Give the new disk its own GUIDs
//!
//! Cloning copies the disk and partition GUIDs verbatim. Two disks with the
//! same GUIDs on one host confuse both the pool and the boot loader, so the
//! new disk is re-stamped before it is used for either. The existing disk
//! is never touched.

use async_trait::async_trait;

use crate::commands;
use crate::inspect::Inspector;
use crate::stages::{MirrorStage, PlannedCommand, StageName};
use crate::types::MirrorSpec;

#[derive(Debug, Clone, Copy)]
pub struct RandomizeGuids;

#[async_trait]
impl MirrorStage for RandomizeGuids {
    fn name(&self) -> StageName {
        StageName::RandomizeGuids
    }

    fn description(&self) -> &'static str {
        "Randomize GUIDs on the new disk"
    }

    async fn satisfied(&self, inspector: &Inspector<'_>, spec: &MirrorSpec) -> Option<String> {
        inspector
            .guids_differ(&spec.existing_disk, &spec.new_disk)
            .await
            .then(|| "already differ".to_string())
    }

    fn plan(&self, spec: &MirrorSpec) -> Vec<PlannedCommand> {
        vec![PlannedCommand::new(
            "randomize",
            commands::randomize_guids(&spec.new_disk),
        )]
    }
}
