//! # edgectl
//!
//! Lifecycle management for a containerized edge gateway on a single host.
//! `edgectl` installs, lists, restarts, stops, removes and updates one gateway
//! container plus a companion auto-update watcher, delegating the real work
//! to a Docker-compatible container runtime.
//!
//! ## Architecture Overview
//!
//! - **[`manager`]**: The lifecycle controller and the command model
//! - **[`container`]**: Container runtime seam and its bollard implementation
//! - **[`platform`]**: Host architecture, firmware and driver queries, GPU policy
//! - **[`watchtower`]**: The auto-update watcher and its HTTP trigger
//! - **[`cli`]**: Arguments, configuration, output rendering and the menu loop
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgectl::cli::{ManagerConfig, OutputFormat, Reporter};
//! use edgectl::container::ContainerOrchestrator;
//! use edgectl::manager::{Command, LifecycleController, ListFilter, StdinPrompt};
//! use edgectl::platform::SystemInventory;
//! use edgectl::watchtower::WatchtowerClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ManagerConfig::load(None)?;
//!     let runtime = ContainerOrchestrator::new().await?;
//!     let host = SystemInventory::new();
//!     let watcher = WatchtowerClient::new(&config.watchtower_url, config.watchtower_token.clone())?;
//!     let prompt = StdinPrompt::new();
//!
//!     let mut controller = LifecycleController::new(
//!         &config,
//!         &runtime,
//!         &host,
//!         &watcher,
//!         &prompt,
//!         Reporter::stdout(OutputFormat::Table),
//!     );
//!     controller.execute(Command::List(ListFilter::All)).await?;
//!     Ok(())
//! }
//! ```

/// Command line interface.
///
/// Argument parsing, configuration discovery, table/JSON output and the
/// interactive menu loop.
pub mod cli;

/// Container runtime layer.
pub mod container;

/// Environment constants and path utilities.
///
/// Centralizes label keys, names, images, ports and environment variable
/// names used throughout the application.
pub mod env;

/// Lifecycle operations on the gateway container.
pub mod manager;

/// Host platform inventory and GPU policy.
pub mod platform;

/// Companion auto-update watcher.
pub mod watchtower;

pub use cli::{ManagerConfig, OutputFormat, Reporter};
pub use manager::{Command, LifecycleController, ManagerError};
