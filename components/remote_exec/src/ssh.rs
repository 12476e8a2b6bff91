// components/remote_exec/src/ssh.rs
//! OpenSSH-backed executor
//!
//! The first command starts a control master (`ssh -M`) in the background.
//! Every later command multiplexes over its control socket, so a whole run
//! against one host shares a single authenticated connection. The master is
//! shut down by [`RemoteExecutor::close`], or by `Drop` on any other path.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::error::{Result, SshError};
use crate::{CommandOutput, RemoteExecutor};

/// Where and as whom to connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    /// Host name used in log messages
    pub host: String,
    /// Candidate addresses, tried in order
    pub addresses: Vec<String>,
    pub user: String,
    pub identity: Option<PathBuf>,
    pub connect_timeout: Duration,
}

impl SshTarget {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            addresses: Vec::new(),
            user: user.into(),
            identity: None,
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Append a candidate address, ignoring duplicates and blanks
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        let address = address.into();
        if !address.trim().is_empty() && !self.addresses.contains(&address) {
            self.addresses.push(address);
        }
        self
    }

    pub fn with_identity(mut self, identity: impl Into<PathBuf>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Options shared by the master and every multiplexed command
    fn common_args(&self, socket: &Path) -> Vec<String> {
        let mut args = vec![
            "-S".to_string(),
            socket.display().to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-l".to_string(),
            self.user.clone(),
        ];
        if let Some(identity) = &self.identity {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        args
    }
}

#[derive(Debug)]
struct ControlMaster {
    address: String,
    socket: PathBuf,
    // Owns the directory holding the socket; removed on drop
    _dir: TempDir,
}

/// Lazily connected SSH session for one host
pub struct SshSession {
    target: SshTarget,
    master: Mutex<Option<ControlMaster>>,
}

impl SshSession {
    pub fn new(target: SshTarget) -> Self {
        Self {
            target,
            master: Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<ControlMaster> {
        if self.target.addresses.is_empty() {
            return Err(SshError::NoAddress {
                host: self.target.host.clone(),
            });
        }

        let dir = tempfile::Builder::new()
            .prefix("mirror-ssh-")
            .tempdir()
            .map_err(|e| SshError::io("create control socket directory", e))?;
        let socket = dir.path().join("control");
        let log = dir.path().join("master.log");

        let mut last_error = None;
        for address in &self.target.addresses {
            tracing::debug!(host = %self.target.host, %address, "starting ssh control master");

            // -f forks after authentication; the child keeps any inherited
            // pipes open, so its diagnostics go to a log file instead.
            let status = Command::new("ssh")
                .args(self.target.common_args(&socket))
                .args(["-M", "-f", "-N", "-o", "ControlPersist=yes", "-E"])
                .arg(&log)
                .arg(address)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .map_err(|source| SshError::Spawn { source })?;

            if status.success() {
                return Ok(ControlMaster {
                    address: address.clone(),
                    socket,
                    _dir: dir,
                });
            }

            let stderr = tokio::fs::read_to_string(&log)
                .await
                .unwrap_or_default()
                .trim()
                .to_string();
            tracing::debug!(%address, %stderr, "control master failed");
            last_error = Some(SshError::Connect {
                address: address.clone(),
                stderr,
            });
        }

        Err(last_error.unwrap_or(SshError::NoAddress {
            host: self.target.host.clone(),
        }))
    }

    async fn run(&self, master: &ControlMaster, command: &str) -> CommandOutput {
        let output = Command::new("ssh")
            .args(self.target.common_args(&master.socket))
            .args(["-o", "ControlMaster=no"])
            .arg(&master.address)
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) => CommandOutput {
                stdout: String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
                exit_code: output
                    .status
                    .code()
                    .unwrap_or(crate::TRANSPORT_FAILURE_EXIT),
            },
            Err(e) => CommandOutput::transport_failure(format!("failed to run ssh: {}", e)),
        }
    }

    fn exit_args(&self, master: &ControlMaster) -> Vec<String> {
        let mut args = self.target.common_args(&master.socket);
        args.extend(["-O".to_string(), "exit".to_string(), master.address.clone()]);
        args
    }
}

#[async_trait]
impl RemoteExecutor for SshSession {
    async fn execute(&self, command: &str) -> CommandOutput {
        let mut master = self.master.lock().await;

        if master.is_none() {
            match self.connect().await {
                Ok(connected) => {
                    tracing::info!(
                        host = %self.target.host,
                        address = %connected.address,
                        "ssh connection established"
                    );
                    *master = Some(connected);
                }
                Err(e) => {
                    tracing::warn!(host = %self.target.host, error = %e, "ssh connection failed");
                    return CommandOutput::transport_failure(e.to_string());
                }
            }
        }

        let Some(connected) = master.as_ref() else {
            return CommandOutput::transport_failure("ssh connection unavailable");
        };

        tracing::debug!(host = %self.target.host, %command, "remote exec");
        let output = self.run(connected, command).await;
        tracing::trace!(exit_code = output.exit_code, stdout = %output.stdout, stderr = %output.stderr);
        output
    }

    async fn close(&self) {
        if let Some(connected) = self.master.lock().await.take() {
            let result = Command::new("ssh")
                .args(self.exit_args(&connected))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            if let Err(e) = result {
                tracing::warn!(host = %self.target.host, error = %e, "failed to stop ssh control master");
            }
            tracing::debug!(host = %self.target.host, "ssh connection closed");
        }
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if let Some(connected) = self.master.get_mut().take() {
            tracing::debug!(
                host = %self.target.host,
                address = %connected.address,
                "session dropped without close, stopping control master"
            );
            let _ = std::process::Command::new("ssh")
                .args(self.exit_args(&connected))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }
    }
}
