// components/zfs_mirror/src/status.rs
//! Read-only mirror status
//!
//! One pool status query per configured mirror and nothing else, so it is
//! safe to call from monitoring as often as needed.

use serde::Serialize;

use remote_exec::RemoteExecutor;

use crate::orchestrator::MirrorManager;
use crate::parse::{PoolState, PoolTopology};
use crate::types::{DiskId, MirrorSpec, PoolName};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorStatus {
    pub pool: PoolName,
    pub existing_disk: DiskId,
    pub new_disk: DiskId,
    pub is_mirror: bool,
    pub state: PoolState,
    pub scan: String,
    pub vdev_disks: Vec<String>,
}

impl MirrorStatus {
    pub fn new(spec: &MirrorSpec, topology: PoolTopology) -> Self {
        Self {
            pool: spec.pool.clone(),
            existing_disk: spec.existing_disk.clone(),
            new_disk: spec.new_disk.clone(),
            is_mirror: topology.is_mirror,
            state: topology.state,
            scan: topology.scan,
            vdev_disks: topology.vdev_disks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostStatus {
    pub host: String,
    pub mirrors: Vec<MirrorStatus>,
}

impl<E: RemoteExecutor> MirrorManager<E> {
    pub async fn status(&self) -> HostStatus {
        let inspector = self.inspector();
        let mut mirrors = Vec::with_capacity(self.mirrors().len());

        for spec in self.mirrors() {
            let topology = inspector.pool_topology(&spec.pool).await;
            mirrors.push(MirrorStatus::new(spec, topology));
        }

        HostStatus {
            host: self.host().to_string(),
            mirrors,
        }
    }
}
