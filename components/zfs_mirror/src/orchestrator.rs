// components/zfs_mirror/src/orchestrator.rs
//! Mirror orchestration for one host
//!
//! For every configured mirror: short-circuit if the pool is already
//! mirrored with the new disk, otherwise pre-flight, then the stages in
//! order until one fails, then a fresh look at the pool. Mirrors are handled
//! one after another over the host's single executor.

use serde::Serialize;
use tokio::sync::mpsc;

use remote_exec::RemoteExecutor;

use crate::actions::{ActionId, ExecutionMode, ExecutionProgress, ProgressSink};
use crate::config::NodeConfig;
use crate::inspect::Inspector;
use crate::parse::PoolTopology;
use crate::preflight::{preflight, CheckName, PreflightReport};
use crate::stages::{run_stage, StageResult, StageStatus, MIRROR_STAGES};
use crate::types::{DiskId, MirrorSpec, PoolName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyStatus {
    AlreadyMirrored,
    PreflightFailed,
    DryRun,
    Success,
    Failed,
}

impl ApplyStatus {
    /// Statuses that count towards host success
    pub fn is_ok(&self) -> bool {
        matches!(
            self,
            ApplyStatus::AlreadyMirrored | ApplyStatus::DryRun | ApplyStatus::Success
        )
    }
}

impl std::fmt::Display for ApplyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ApplyStatus::AlreadyMirrored => "already_mirrored",
            ApplyStatus::PreflightFailed => "preflight_failed",
            ApplyStatus::DryRun => "dry_run",
            ApplyStatus::Success => "success",
            ApplyStatus::Failed => "failed",
        };
        f.pad(label)
    }
}

/// Everything that happened to one mirror during `apply`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorApplyResult {
    pub pool: PoolName,
    pub existing_disk: DiskId,
    pub new_disk: DiskId,
    /// Absent when the pool was already mirrored
    pub preflight: Option<PreflightReport>,
    /// Checks that stopped the run; only set for `preflight_failed`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocking_checks: Vec<CheckName>,
    /// Stages attempted, in order; ends at the first failure
    pub stages: Vec<StageResult>,
    pub resilver: Option<PoolTopology>,
    pub status: ApplyStatus,
}

impl MirrorApplyResult {
    fn new(spec: &MirrorSpec, status: ApplyStatus) -> Self {
        Self {
            pool: spec.pool.clone(),
            existing_disk: spec.existing_disk.clone(),
            new_disk: spec.new_disk.clone(),
            preflight: None,
            blocking_checks: Vec::new(),
            stages: Vec::new(),
            resilver: None,
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostApplyResult {
    pub host: String,
    pub mirrors: Vec<MirrorApplyResult>,
    pub success: bool,
}

impl HostApplyResult {
    pub fn new(host: impl Into<String>, mirrors: Vec<MirrorApplyResult>) -> Self {
        let success = mirrors.iter().all(|mirror| mirror.status.is_ok());
        Self {
            host: host.into(),
            mirrors,
            success,
        }
    }
}

/// Runs the mirror pipeline for every mirror configured on one host
pub struct MirrorManager<E: RemoteExecutor> {
    host: String,
    mirrors: Vec<MirrorSpec>,
    exec: E,
    progress: ProgressSink,
}

impl<E: RemoteExecutor> MirrorManager<E> {
    pub fn new(host: impl Into<String>, mirrors: Vec<MirrorSpec>, exec: E) -> Self {
        Self {
            host: host.into(),
            mirrors,
            exec,
            progress: ProgressSink::default(),
        }
    }

    pub fn for_node(node: &NodeConfig, exec: E) -> Self {
        Self::new(node.name.clone(), node.zfs_mirrors.clone(), exec)
    }

    /// Publish progress events on `tx` while running
    pub fn with_progress(mut self, tx: mpsc::Sender<ExecutionProgress>) -> Self {
        self.progress = ProgressSink::new(tx);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn mirrors(&self) -> &[MirrorSpec] {
        &self.mirrors
    }

    pub fn executor(&self) -> &E {
        &self.exec
    }

    pub(crate) fn inspector(&self) -> Inspector<'_> {
        Inspector::new(&self.exec)
    }

    pub async fn apply(&self, mode: ExecutionMode) -> HostApplyResult {
        tracing::info!(host = %self.host, mirrors = self.mirrors.len(), %mode, "applying mirrors");

        let mut results = Vec::with_capacity(self.mirrors.len());
        for spec in &self.mirrors {
            results.push(self.apply_mirror(spec, mode).await);
        }

        let result = HostApplyResult::new(self.host.clone(), results);
        tracing::info!(host = %self.host, success = result.success, "apply finished");
        result
    }

    pub async fn apply_mirror(&self, spec: &MirrorSpec, mode: ExecutionMode) -> MirrorApplyResult {
        let inspector = self.inspector();

        let topology = inspector.pool_topology(&spec.pool).await;
        if topology.is_mirrored_with(&spec.new_disk) {
            tracing::info!(pool = %spec.pool, new_disk = %spec.new_disk, "already mirrored");
            self.progress
                .send(ExecutionProgress::Skipped {
                    id: ActionId::new(spec.pool.as_str()),
                    reason: "already mirrored".to_string(),
                })
                .await;
            return MirrorApplyResult {
                resilver: Some(topology),
                ..MirrorApplyResult::new(spec, ApplyStatus::AlreadyMirrored)
            };
        }

        let preflight_id = ActionId::new(format!("{}/preflight", spec.pool));
        self.progress
            .started(&preflight_id, format!("Pre-flight checks for {}", spec))
            .await;

        let report = preflight(&inspector, spec).await;
        let blocking = report.blocking_failures(&topology, &spec.new_disk);

        if !blocking.is_empty() && !mode.is_dry_run() {
            let names: Vec<&str> = blocking.iter().map(CheckName::as_str).collect();
            tracing::warn!(pool = %spec.pool, blocking = ?names, "pre-flight failed");
            self.progress
                .send(ExecutionProgress::Failed {
                    id: preflight_id,
                    error: format!("blocking checks failed: {}", names.join(", ")),
                })
                .await;
            return MirrorApplyResult {
                preflight: Some(report),
                blocking_checks: blocking,
                ..MirrorApplyResult::new(spec, ApplyStatus::PreflightFailed)
            };
        }
        self.progress
            .send(ExecutionProgress::Complete { id: preflight_id })
            .await;

        let mut stages = Vec::with_capacity(MIRROR_STAGES.len());
        for stage in MIRROR_STAGES {
            let id = ActionId::new(format!("{}/{}", spec.pool, stage.name()));
            self.progress.started(&id, stage.description()).await;

            let result = run_stage(stage, &self.exec, spec, mode).await;
            self.report_stage(id, &result).await;

            let failed = result.is_failed();
            stages.push(result);
            if failed {
                return MirrorApplyResult {
                    preflight: Some(report),
                    stages,
                    ..MirrorApplyResult::new(spec, ApplyStatus::Failed)
                };
            }
        }

        let resilver = inspector.pool_topology(&spec.pool).await;
        let status = if mode.is_dry_run() {
            ApplyStatus::DryRun
        } else {
            ApplyStatus::Success
        };
        tracing::info!(pool = %spec.pool, %status, scan = %resilver.scan, "mirror pipeline finished");

        MirrorApplyResult {
            preflight: Some(report),
            stages,
            resilver: Some(resilver),
            ..MirrorApplyResult::new(spec, status)
        }
    }

    async fn report_stage(&self, id: ActionId, result: &StageResult) {
        let event = match result.status {
            StageStatus::Skipped => ExecutionProgress::Skipped {
                id,
                reason: result.reason.clone().unwrap_or_default(),
            },
            StageStatus::WouldExecute => {
                self.progress
                    .progress(
                        &id,
                        format!("would run: {}", result.command.as_deref().unwrap_or_default()),
                    )
                    .await;
                ExecutionProgress::Complete { id }
            }
            StageStatus::Done => ExecutionProgress::Complete { id },
            StageStatus::Failed => ExecutionProgress::Failed {
                id,
                error: result.error.clone().unwrap_or_default(),
            },
        };
        self.progress.send(event).await;
    }

    /// Release the host connection
    pub async fn close(&self) {
        self.exec.close().await;
    }
}
