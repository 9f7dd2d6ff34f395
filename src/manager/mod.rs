//! Lifecycle management of the edge gateway container.
//!
//! [`LifecycleController`] maps each [`Command`] to a fixed sequence of calls
//! against the container runtime and the host inventory, reporting results
//! through a [`Reporter`](crate::cli::Reporter).

mod command;
mod controller;
mod prompt;

pub use command::{Command, ListFilter, USAGE, UnknownCommand};
pub use controller::{LifecycleController, gateway_config};
pub use prompt::{Prompt, StdinPrompt};

use crate::container::ContainerError;
use crate::platform::PlatformError;
use crate::watchtower::WatchtowerError;

/// Lifecycle operation errors.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Watchtower(#[from] WatchtowerError),

    /// The operator's choice did not name a listed container
    #[error("{0}")]
    Selection(String),

    /// A target container vanished before it could be used
    #[error("Container not found")]
    ContainerNotFound(String),

    /// The host is not fit for the operation
    #[error("{0}")]
    Precondition(String),

    /// Install target name is taken
    #[error("Error: A container with name '{0}' already exists")]
    AlreadyExists(String),

    /// Writing output or reading input failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ManagerError {
    /// Soft failures: reported to the operator, never fatal.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ManagerError::Selection(_)
                | ManagerError::ContainerNotFound(_)
                | ManagerError::Precondition(_)
                | ManagerError::AlreadyExists(_)
        )
    }
}

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, ManagerError>;
