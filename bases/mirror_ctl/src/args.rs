// bases/mirror_ctl/src/args.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use zfs_mirror::{ExecutionMode, DEFAULT_CONFIG_PATH};

/// Convert single-disk ZFS pools into two-way mirrors
#[derive(Parser, Debug)]
#[command(name = "mirror-ctl", author, version, about, long_about = None)]
pub struct Cli {
    /// Cluster configuration file
    #[arg(long, global = true, env = "MIRROR_CTL_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// User to log in as on the hosts
    #[arg(long, global = true, env = "SSH_USER", default_value = "root")]
    pub ssh_user: String,

    /// Private key for the hosts (defaults to ~/.ssh/id_rsa when present)
    #[arg(long, global = true, env = "SSH_KEY_PATH")]
    pub ssh_key: Option<PathBuf>,

    /// Seconds to wait for each ssh connection attempt
    #[arg(long, global = true, env = "SSH_CONNECT_TIMEOUT", default_value_t = 10)]
    pub connect_timeout: u64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run pre-flight checks and every pending stage
    Apply {
        /// Host to work on; all enabled hosts with mirrors if omitted
        #[arg(long)]
        host: Option<String>,

        /// Show what would be done without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the current state of every configured mirror
    Status {
        /// Host to query; all enabled hosts with mirrors if omitted
        #[arg(long)]
        host: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Command {
    pub fn host(&self) -> Option<&str> {
        match self {
            Command::Apply { host, .. } | Command::Status { host, .. } => host.as_deref(),
        }
    }

    pub fn json(&self) -> bool {
        match self {
            Command::Apply { json, .. } | Command::Status { json, .. } => *json,
        }
    }
}

impl Cli {
    /// Key to authenticate with; `None` lets ssh pick its defaults
    pub fn identity(&self) -> Option<PathBuf> {
        self.ssh_key.clone().or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".ssh").join("id_rsa"))
                .filter(|path| path.exists())
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn mode(&self) -> ExecutionMode {
        match &self.command {
            Command::Apply { dry_run, .. } => ExecutionMode::from_dry_run(*dry_run),
            Command::Status { .. } => ExecutionMode::DryRun,
        }
    }
}
