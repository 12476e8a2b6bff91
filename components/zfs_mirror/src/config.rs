// components/zfs_mirror/src/config.rs
//! Cluster configuration
//!
//! Mirrors are declared per node in the shared cluster file. Only the keys
//! this crate needs are read; everything else in the file is ignored.

use serde::Deserialize;
use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::types::MirrorSpec;

/// Default location of the cluster file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/cluster.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    #[serde(default, alias = "address")]
    pub ip: Option<String>,
    #[serde(default)]
    pub fqdn: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub zfs_mirrors: Vec<MirrorSpec>,
}

fn default_enabled() -> bool {
    true
}

impl ClusterConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: ClusterConfig =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(
            path = %path.display(),
            nodes = config.nodes.len(),
            "loaded cluster config"
        );
        Ok(config)
    }

    /// Look up a node by name
    pub fn node(&self, name: &str) -> Result<&NodeConfig> {
        self.nodes
            .iter()
            .find(|node| node.name == name)
            .ok_or_else(|| ConfigError::HostNotFound(name.to_string()))
    }

    /// Enabled nodes that declare at least one mirror
    pub fn mirror_nodes(&self) -> impl Iterator<Item = &NodeConfig> {
        self.nodes
            .iter()
            .filter(|node| node.enabled && !node.zfs_mirrors.is_empty())
    }
}

impl NodeConfig {
    /// Addresses to try when connecting, most specific first
    pub fn addresses(&self) -> Vec<String> {
        let mut addresses = Vec::new();
        for candidate in [self.fqdn.as_deref(), self.ip.as_deref(), Some(self.name.as_str())]
            .into_iter()
            .flatten()
        {
            if !candidate.is_empty() && !addresses.iter().any(|a| a == candidate) {
                addresses.push(candidate.to_string());
            }
        }
        addresses
    }
}
