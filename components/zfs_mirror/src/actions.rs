// components/zfs_mirror/src/actions.rs
//! Execution mode and progress feedback shared by the stages and the orchestrator

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Identifier of one step in a run, e.g. `rpool/clone_partitions`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ActionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Execution mode for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Inspect and report the commands that would run
    DryRun,
    /// Run the commands
    Apply,
}

impl ExecutionMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            ExecutionMode::DryRun
        } else {
            ExecutionMode::Apply
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, ExecutionMode::DryRun)
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::DryRun => write!(f, "DRY RUN"),
            ExecutionMode::Apply => write!(f, "APPLY"),
        }
    }
}

/// Progress feedback during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ExecutionProgress {
    Started { id: ActionId, description: String },
    Progress { id: ActionId, message: String },
    Skipped { id: ActionId, reason: String },
    Complete { id: ActionId },
    Failed { id: ActionId, error: String },
}

/// Optional sender for [`ExecutionProgress`] events
///
/// A run without a listener uses the default, which drops every event. A
/// listener that goes away mid-run does not affect the run.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<mpsc::Sender<ExecutionProgress>>,
}

impl ProgressSink {
    pub fn new(tx: mpsc::Sender<ExecutionProgress>) -> Self {
        Self { tx: Some(tx) }
    }

    pub async fn send(&self, event: ExecutionProgress) {
        if let Some(tx) = &self.tx {
            if tx.send(event).await.is_err() {
                tracing::debug!("progress receiver dropped");
            }
        }
    }

    pub async fn started(&self, id: &ActionId, description: impl Into<String>) {
        self.send(ExecutionProgress::Started {
            id: id.clone(),
            description: description.into(),
        })
        .await;
    }

    pub async fn progress(&self, id: &ActionId, message: impl Into<String>) {
        self.send(ExecutionProgress::Progress {
            id: id.clone(),
            message: message.into(),
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_from_flag() {
        assert_eq!(ExecutionMode::from_dry_run(true), ExecutionMode::DryRun);
        assert_eq!(ExecutionMode::from_dry_run(false), ExecutionMode::Apply);
        assert!(ExecutionMode::DryRun.is_dry_run());
    }

    #[tokio::test]
    async fn sink_forwards_events() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = ProgressSink::new(tx);
        let id = ActionId::new("rpool/clone_partitions");

        sink.started(&id, "Clone partition table").await;
        sink.send(ExecutionProgress::Complete { id: id.clone() }).await;
        drop(sink);

        assert_eq!(
            rx.recv().await,
            Some(ExecutionProgress::Started {
                id: id.clone(),
                description: "Clone partition table".to_string(),
            })
        );
        assert_eq!(rx.recv().await, Some(ExecutionProgress::Complete { id }));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn closed_receiver_is_ignored() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        ProgressSink::new(tx)
            .progress(&ActionId::from("x"), "still running")
            .await;
        ProgressSink::default()
            .progress(&ActionId::from("x"), "nobody listening")
            .await;
    }

    #[test]
    fn progress_serializes_tagged() {
        let event = ExecutionProgress::Skipped {
            id: ActionId::new("rpool/setup_boot"),
            reason: "already configured".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Skipped");
        assert_eq!(json["data"]["id"], "rpool/setup_boot");
    }
}
