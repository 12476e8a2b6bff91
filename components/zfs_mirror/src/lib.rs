// components/zfs_mirror/src/lib.rs
//! Converting single-disk pools into two-way mirrors
//!
//! A [`MirrorManager`] drives every mirror configured for one host through
//! the same pipeline:
//!
//! 1. Look at the pool; stop if the new disk is already mirrored in.
//! 2. Run the pre-flight checks ([`preflight`]).
//! 3. Run the four stages of [`MIRROR_STAGES`], stopping at the first failure.
//! 4. Take a fresh look at the pool to report resilver progress.
//!
//! Every stage checks the host before acting, so re-running `apply` after a
//! failure picks up where the last run stopped. Nothing is rolled back.

pub mod actions;
pub mod commands;
pub mod config;
pub mod error;
pub mod inspect;
pub mod orchestrator;
pub mod parse;
pub mod preflight;
pub mod stages;
pub mod status;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use actions::{ActionId, ExecutionMode, ExecutionProgress, ProgressSink};
pub use config::{ClusterConfig, NodeConfig, DEFAULT_CONFIG_PATH};
pub use error::{ConfigError, Result, ValidationError};
pub use inspect::Inspector;
pub use orchestrator::{ApplyStatus, HostApplyResult, MirrorApplyResult, MirrorManager};
pub use parse::{PoolState, PoolTopology};
pub use preflight::{preflight, CheckName, PreflightCheck, PreflightReport};
pub use stages::{run_stage, MirrorStage, StageName, StageResult, StageStatus, MIRROR_STAGES};
pub use status::{HostStatus, MirrorStatus};
pub use types::{DiskId, MirrorSpec, PartitionIndex, PoolName};
