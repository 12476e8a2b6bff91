// components/zfs_mirror/src/stages/stage3_boot.rs
//! Stage 3: Make the new disk bootable

use async_trait::async_trait;

use crate::commands;
use crate::inspect::Inspector;
use crate::stages::{MirrorStage, PlannedCommand, StageName};
use crate::types::MirrorSpec;

#[derive(Debug, Clone, Copy)]
pub struct SetupBoot;

#[async_trait]
impl MirrorStage for SetupBoot {
    fn name(&self) -> StageName {
        StageName::SetupBoot
    }

    fn description(&self) -> &'static str {
        "Format and register the new disk's ESP"
    }

    async fn satisfied(&self, inspector: &Inspector<'_>, spec: &MirrorSpec) -> Option<String> {
        inspector
            .boot_configured(&spec.new_disk, spec.efi_partition)
            .await
            .then(|| "already configured".to_string())
    }

    /// Format must succeed before the ESP is registered
    fn plan(&self, spec: &MirrorSpec) -> Vec<PlannedCommand> {
        vec![
            PlannedCommand::new(
                "format",
                commands::boot_format(&spec.new_disk, spec.efi_partition),
            ),
            PlannedCommand::new(
                "init",
                commands::boot_init(&spec.new_disk, spec.efi_partition),
            ),
        ]
    }
}
