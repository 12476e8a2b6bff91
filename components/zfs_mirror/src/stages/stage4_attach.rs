// components/zfs_mirror/src/stages/stage4_attach.rs
//! Stage 4: Attach the new disk to the pool
//!
//! The only stage that changes the live pool. Everything before it works on
//! the new disk alone, so a run that stops earlier leaves the pool as it was.

use async_trait::async_trait;

use crate::commands;
use crate::inspect::Inspector;
use crate::stages::{MirrorStage, PlannedCommand, StageName};
use crate::types::MirrorSpec;

#[derive(Debug, Clone, Copy)]
pub struct AttachMirror;

#[async_trait]
impl MirrorStage for AttachMirror {
    fn name(&self) -> StageName {
        StageName::AttachMirror
    }

    fn description(&self) -> &'static str {
        "Attach the new disk as a mirror"
    }

    async fn satisfied(&self, inspector: &Inspector<'_>, spec: &MirrorSpec) -> Option<String> {
        let topology = inspector.pool_topology(&spec.pool).await;
        (topology.is_mirror && topology.contains_partition(&spec.new_disk, spec.zfs_partition))
            .then(|| "already mirrored".to_string())
    }

    fn plan(&self, spec: &MirrorSpec) -> Vec<PlannedCommand> {
        vec![PlannedCommand::new(
            "attach",
            commands::attach(
                &spec.pool,
                &spec.existing_disk,
                &spec.new_disk,
                spec.zfs_partition,
            ),
        )]
    }
}
