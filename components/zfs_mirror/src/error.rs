//! Error types for mirror configuration
//!
//! Only configuration problems are errors in this crate. Anything that goes
//! wrong on the remote host is captured in the result of the check or stage
//! that ran the command, so callers always get a full report back.

use std::path::PathBuf;
use thiserror::Error;

/// An identifier that cannot be safely used in a remote command line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    #[error("{kind} '{value}' contains invalid character {ch:?}")]
    InvalidCharacter {
        kind: &'static str,
        value: String,
        ch: char,
    },

    #[error("{kind} '{value}' must start with {expected}")]
    InvalidStart {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("partition index must be at least 1, got {0}")]
    PartitionIndex(u32),

    #[error("existing and new disk are both '{0}'")]
    SameDisk(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cluster config not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read cluster config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid cluster config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("host '{0}' not found in cluster config")]
    HostNotFound(String),

    #[error("no enabled host in cluster config has zfs_mirrors")]
    NoMirrorHosts,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
