// bases/mirror_ctl/src/app.rs
use color_eyre::Result;
use remote_exec::{SshSession, SshTarget};
use tokio::sync::mpsc;
use zfs_mirror::{ClusterConfig, ConfigError, ExecutionMode, MirrorManager, NodeConfig};

use crate::args::{Cli, Command};
use crate::output::{self, OutputHandler};

pub struct App {
    cli: Cli,
    output: OutputHandler,
}

impl App {
    pub fn new(cli: Cli) -> Self {
        let output = OutputHandler::new(cli.verbose);
        Self { cli, output }
    }

    /// Run the selected command; `Ok(false)` means some host did not succeed
    pub async fn run(&self) -> Result<bool> {
        let config = ClusterConfig::load(&self.cli.config)?;
        let nodes = select_nodes(&config, self.cli.command.host())?;

        let json = self.cli.command.json();
        match self.cli.command {
            Command::Apply { .. } => self.apply(&nodes, self.cli.mode(), json).await,
            Command::Status { .. } => self.status(&nodes, json).await,
        }
    }

    async fn apply(&self, nodes: &[&NodeConfig], mode: ExecutionMode, json: bool) -> Result<bool> {
        let mut results = Vec::with_capacity(nodes.len());

        for node in nodes {
            let manager = MirrorManager::for_node(node, self.session(node));
            let (manager, printer) = if self.output.verbose() && !json {
                let (tx, rx) = mpsc::channel(32);
                (
                    manager.with_progress(tx),
                    Some(tokio::spawn(output::print_progress(rx))),
                )
            } else {
                (manager, None)
            };

            let result = manager.apply(mode).await;
            manager.close().await;
            drop(manager);
            if let Some(printer) = printer {
                printer.await?;
            }

            if !json {
                self.output.print_apply(&result, mode);
            }
            results.push(result);
        }

        if json {
            match results.as_slice() {
                [single] => self.output.print_json(single)?,
                all => self.output.print_json(&all)?,
            }
        }

        Ok(results.iter().all(|result| result.success))
    }

    async fn status(&self, nodes: &[&NodeConfig], json: bool) -> Result<bool> {
        let mut statuses = Vec::with_capacity(nodes.len());

        for node in nodes {
            let manager = MirrorManager::for_node(node, self.session(node));
            let status = manager.status().await;
            manager.close().await;

            if !json {
                self.output.print_status(&status);
            }
            statuses.push(status);
        }

        if json {
            match statuses.as_slice() {
                [single] => self.output.print_json(single)?,
                all => self.output.print_json(&all)?,
            }
        }

        Ok(true)
    }

    fn session(&self, node: &NodeConfig) -> SshSession {
        let target = ssh_target(node, &self.cli.ssh_user, self.cli.identity())
            .with_connect_timeout(self.cli.connect_timeout());
        SshSession::new(target)
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        self.output.print_error(error);
    }
}

/// The named host, or every enabled host that has mirrors
fn select_nodes<'c>(config: &'c ClusterConfig, host: Option<&str>) -> Result<Vec<&'c NodeConfig>> {
    match host {
        Some(host) => Ok(vec![config.node(host)?]),
        None => {
            let nodes: Vec<_> = config.mirror_nodes().collect();
            if nodes.is_empty() {
                return Err(ConfigError::NoMirrorHosts.into());
            }
            Ok(nodes)
        }
    }
}

fn ssh_target(node: &NodeConfig, user: &str, identity: Option<std::path::PathBuf>) -> SshTarget {
    let target = node
        .addresses()
        .into_iter()
        .fold(SshTarget::new(node.name.clone(), user), |target, address| {
            target.with_address(address)
        });
    match identity {
        Some(identity) => target.with_identity(identity),
        None => target,
    }
}
