//! The container runtime seam.
//!
//! Everything the lifecycle controller needs from the external runtime goes
//! through [`ContainerRuntime`]. The production implementation is
//! [`ContainerOrchestrator`](super::ContainerOrchestrator); tests substitute an
//! in-memory recorder.

use super::{ContainerConfig, PortMap, Result};
use crate::manager::Prompt;
use async_trait::async_trait;
use std::collections::HashMap;

/// One row of a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    /// Container name without the leading `/`
    pub name: String,
    /// Runtime state (`created`, `running`, `exited`, ...)
    pub state: String,
    /// Container labels (image labels included)
    pub labels: HashMap<String, String>,
    /// Image reference the container was created from
    pub image: String,
}

impl ContainerRecord {
    /// Value of a label, if present.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

/// The subset of `docker inspect` that a restart carries over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerDetails {
    pub name: String,
    pub network_mode: Option<String>,
    pub port_bindings: PortMap,
    pub labels: HashMap<String, String>,
    pub binds: Vec<String>,
    pub privileged: bool,
    pub ipc_mode: Option<String>,
    pub pid_mode: Option<String>,
}

/// Operations consumed from the container runtime.
///
/// All calls are awaited one at a time by the controller; implementations do
/// not need to coordinate concurrent callers.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List containers, `all` including stopped ones.
    ///
    /// `label_filters` are `key=value` pairs handed to the runtime's native
    /// filter. The runtime cannot filter on key presence alone; callers do
    /// that on the returned records.
    async fn list_containers(
        &self,
        all: bool,
        label_filters: &[String],
    ) -> Result<Vec<ContainerRecord>>;

    /// Whether a container with exactly this name exists (any state).
    async fn container_exists(&self, name: &str) -> Result<bool>;

    /// Inspect a container by name.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::NotFound`](super::ContainerError::NotFound)
    /// when no such container exists.
    async fn inspect_container(&self, name: &str) -> Result<ContainerDetails>;

    /// Pull an image from its registry.
    async fn pull_image(&self, image: &str) -> Result<()>;

    /// Create a container under `name` and start it. Returns the container ID.
    async fn run_container(&self, name: &str, config: &ContainerConfig) -> Result<String>;

    /// Send SIGKILL to a container.
    async fn kill_container(&self, name: &str) -> Result<()>;

    /// Remove a container.
    async fn remove_container(&self, name: &str, force: bool) -> Result<()>;

    /// Remove a named volume.
    async fn remove_volume(&self, name: &str, force: bool) -> Result<()>;

    /// Host mount point of a named volume.
    async fn volume_mountpoint(&self, name: &str) -> Result<String>;

    /// Full stdout and stderr log of a container.
    async fn logs(&self, name: &str) -> Result<String>;

    /// Attach an interactive shell to a running container until it exits,
    /// feeding it lines from `input`.
    async fn open_shell(&self, name: &str, input: &dyn Prompt) -> Result<()>;
}
