// components/zfs_mirror/src/stages/mod.rs
//! Mutation stages
//!
//! Four stages prepare the new disk and attach it. Each one re-reads the
//! host before acting and skips itself when its goal state already holds, so
//! a run can be repeated after any partial failure. The order lives in
//! [`MIRROR_STAGES`]; only the last stage touches the live pool.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use remote_exec::RemoteExecutor;

use crate::actions::ExecutionMode;
use crate::inspect::Inspector;
use crate::types::MirrorSpec;

mod stage1_clone;
mod stage2_guids;
mod stage3_boot;
mod stage4_attach;

pub use stage1_clone::ClonePartitions;
pub use stage2_guids::RandomizeGuids;
pub use stage3_boot::SetupBoot;
pub use stage4_attach::AttachMirror;

/// Every stage, in the only order they may run
pub const MIRROR_STAGES: [&dyn MirrorStage; 4] =
    [&ClonePartitions, &RandomizeGuids, &SetupBoot, &AttachMirror];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    ClonePartitions,
    RandomizeGuids,
    SetupBoot,
    AttachMirror,
}

impl StageName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::ClonePartitions => "clone_partitions",
            StageName::RandomizeGuids => "randomize_guids",
            StageName::SetupBoot => "setup_boot",
            StageName::AttachMirror => "attach_mirror",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Skipped,
    WouldExecute,
    Done,
    Failed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StageStatus::Skipped => "skipped",
            StageStatus::WouldExecute => "would_execute",
            StageStatus::Done => "done",
            StageStatus::Failed => "failed",
        };
        f.pad(label)
    }
}

/// Outcome of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResult {
    pub stage: StageName,
    pub status: StageStatus,
    /// Plan of a dry run, one command line per line, in the order they would run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Why the stage was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Captured stdout of the executed commands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl StageResult {
    fn new(stage: StageName, status: StageStatus) -> Self {
        Self {
            stage,
            status,
            command: None,
            error: None,
            reason: None,
            output: None,
        }
    }

    pub fn skipped(stage: StageName, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::new(stage, StageStatus::Skipped)
        }
    }

    pub fn would_execute(stage: StageName, command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::new(stage, StageStatus::WouldExecute)
        }
    }

    pub fn done(stage: StageName, output: Option<String>) -> Self {
        Self {
            output,
            ..Self::new(stage, StageStatus::Done)
        }
    }

    pub fn failed(stage: StageName, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(stage, StageStatus::Failed)
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == StageStatus::Failed
    }
}

/// One command of a stage, labelled for error messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCommand {
    pub label: &'static str,
    pub command: String,
}

impl PlannedCommand {
    pub fn new(label: &'static str, command: String) -> Self {
        Self { label, command }
    }
}

/// A single idempotent step towards a mirrored pool
#[async_trait]
pub trait MirrorStage: Send + Sync {
    fn name(&self) -> StageName;

    fn description(&self) -> &'static str;

    /// Reason to skip when the goal state already holds on the host
    async fn satisfied(&self, inspector: &Inspector<'_>, spec: &MirrorSpec) -> Option<String>;

    /// Commands that reach the goal state, run in order
    fn plan(&self, spec: &MirrorSpec) -> Vec<PlannedCommand>;
}

/// Check, then plan or run, one stage
///
/// Stops at the first failing command; with more than one command the
/// error is prefixed with the failing command's label.
pub async fn run_stage(
    stage: &dyn MirrorStage,
    exec: &dyn RemoteExecutor,
    spec: &MirrorSpec,
    mode: ExecutionMode,
) -> StageResult {
    let name = stage.name();
    let inspector = Inspector::new(exec);

    if let Some(reason) = stage.satisfied(&inspector, spec).await {
        tracing::info!(pool = %spec.pool, stage = %name, %reason, "stage skipped");
        return StageResult::skipped(name, reason);
    }

    let plan = stage.plan(spec);

    if mode.is_dry_run() {
        let command = plan
            .iter()
            .map(|step| step.command.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        tracing::info!(pool = %spec.pool, stage = %name, %command, "would execute");
        return StageResult::would_execute(name, command);
    }

    let labelled = plan.len() > 1;
    let mut outputs = Vec::new();

    for step in &plan {
        tracing::info!(pool = %spec.pool, stage = %name, command = %step.command, "executing");
        let output = exec.execute(&step.command).await;

        if !output.success() {
            let stderr = if output.stderr.is_empty() {
                format!("exit code {}", output.exit_code)
            } else {
                output.stderr
            };
            let error = if labelled {
                format!("{}: {}", step.label, stderr)
            } else {
                stderr
            };
            tracing::error!(pool = %spec.pool, stage = %name, %error, "stage failed");
            return StageResult::failed(name, error);
        }

        if !output.stdout.is_empty() {
            outputs.push(output.stdout);
        }
    }

    tracing::info!(pool = %spec.pool, stage = %name, "stage done");
    StageResult::done(name, (!outputs.is_empty()).then(|| outputs.join("\n")))
}
