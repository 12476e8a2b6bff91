// components/remote_exec/src/lib.rs
//! Remote command execution
//!
//! Everything that inspects or mutates a remote host goes through the
//! [`RemoteExecutor`] trait. A session is bound to exactly one host and
//! always answers with a [`CommandOutput`]; failures are reported through
//! the exit code and stderr, never as a Rust error. That keeps callers
//! simple: a command that could not even be delivered looks like any other
//! failed command.

mod error;
mod ssh;

use async_trait::async_trait;
use serde::Serialize;

pub use error::{Result, SshError};
pub use ssh::{SshSession, SshTarget};

/// Exit code reported when a command never reached the remote shell.
///
/// Matches what `ssh(1)` itself returns for connection failures.
pub const TRANSPORT_FAILURE_EXIT: i32 = 255;

/// Captured result of one remote command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Successful command with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::new(stdout, "", 0)
    }

    /// Command that could not be delivered to the host
    pub fn transport_failure(reason: impl Into<String>) -> Self {
        Self::new("", reason, TRANSPORT_FAILURE_EXIT)
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs shell command lines on the host a session is bound to
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn execute(&self, command: &str) -> CommandOutput;

    /// Release the underlying connection, if any.
    ///
    /// Later calls to `execute` may establish a new one.
    async fn close(&self) {}
}
