//! Command line argument parsing
//!
//! `edgectl [COMMAND] [OUTPUT] [--container-name NAME] [--config PATH]`
//!
//! Without a command the interactive menu runs; with one, a single operation
//! runs and the process exits.

use super::config::{ManagerConfig, OutputFormat};
use crate::manager::{Command, ListFilter};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Interactive menu loop
    Menu,
    /// Run one command and exit
    SingleShot(Command),
}

impl ExecutionMode {
    /// Output format used when neither the command line nor the
    /// configuration picks one.
    pub fn default_output(&self) -> OutputFormat {
        match self {
            ExecutionMode::Menu => OutputFormat::Table,
            ExecutionMode::SingleShot(_) => OutputFormat::Json,
        }
    }
}

/// Commands accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CommandArg {
    /// List the currently installed containers
    List,
    /// Install a new container
    Install,
    /// Download the latest container image (OEM use only)
    Download,
    /// Kill a running container
    Stop,
    /// Restart a container & update to the latest version
    Restart,
    /// Remove a container and its volume
    Remove,
    /// Migrate legacy containers and check for image updates
    Update,
    /// Print the logs of a container
    Logs,
    /// Open an interactive shell in a running container
    Shell,
    /// Start the auto-update watcher
    StartWatchtower,
}

impl CommandArg {
    fn into_command(self, target: Option<String>) -> Command {
        match self {
            CommandArg::List => Command::List(ListFilter::All),
            CommandArg::Install => Command::Install,
            CommandArg::Download => Command::Download,
            CommandArg::Stop => Command::Stop(target),
            CommandArg::Restart => Command::Restart(target),
            CommandArg::Remove => Command::Remove(target),
            CommandArg::Update => Command::Update,
            CommandArg::Logs => Command::Logs(target),
            CommandArg::Shell => Command::Shell(target),
            CommandArg::StartWatchtower => Command::StartWatchtower,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "edgectl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Install, update and manage the edge gateway container on this host")]
#[command(long_about = None)]
pub struct Args {
    /// Command to run; omit for the interactive menu
    #[arg(value_enum)]
    pub command: Option<CommandArg>,

    /// Output format
    #[arg(value_enum)]
    pub output: Option<OutputFormat>,

    /// Target container for stop, restart, remove, logs and shell
    #[arg(long = "container-name", value_name = "NAME")]
    pub container_name: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn mode(&self) -> ExecutionMode {
        match self.command {
            Some(command) => {
                ExecutionMode::SingleShot(command.into_command(self.container_name.clone()))
            }
            None => ExecutionMode::Menu,
        }
    }

    /// Positional argument, then configuration, then the mode default.
    pub fn output_format(&self, config: &ManagerConfig) -> OutputFormat {
        self.output
            .unwrap_or_else(|| config.output_format_or(self.mode().default_output()))
    }
}
