//! CLI-specific functionality for the edge container manager
//!
//! This module contains argument parsing, configuration discovery, output
//! rendering and the interactive menu.

pub mod args;
pub mod config;
pub mod menu;
pub mod output;

pub use args::{Args, CommandArg, ExecutionMode};
pub use config::{ConfigDiscovery, ConfigError, FileConfig, ManagerConfig, OutputFormat};
pub use menu::{run_menu, run_menu_until};
pub use output::{Reporter, Status};
