//! Container runtime layer.
//!
//! The lifecycle controller only sees [`ContainerRuntime`]. The
//! [`ContainerOrchestrator`] implements it over the Engine API with bollard,
//! against Docker or a Podman socket.
//!
//! ## Example
//!
//! ```rust,no_run
//! use edgectl::container::{ContainerConfig, ContainerOrchestrator, ContainerRuntime};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ContainerOrchestrator::new().await?;
//!
//!     let config = ContainerConfig::builder()
//!         .image("alpine:latest")
//!         .cmd(["sleep", "infinity"])
//!         .label("edge.gateway_id", "demo")
//!         .build()?;
//!
//!     runtime.pull_image("alpine:latest").await?;
//!     runtime.run_container("demo", &config).await?;
//!
//!     for record in runtime.list_containers(true, &[]).await? {
//!         println!("{} {}", record.name, record.state);
//!     }
//!
//!     runtime.remove_container("demo", true).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod image;
mod interactive;
mod orchestrator;
mod runtime;
mod volume;

pub use bollard::models::{DeviceRequest, PortBinding};
pub use client::ContainerClient;
pub use config::{ContainerConfig, ContainerConfigBuilder, PortMap};
pub use image::ImagePuller;
pub use interactive::InteractiveSession;
pub use orchestrator::ContainerOrchestrator;
pub use runtime::{ContainerDetails, ContainerRecord, ContainerRuntime};
pub use volume::{VolumeInfo, VolumeManager};

/// Failures talking to the container daemon.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("Runtime request failed: {0}")]
    ApiError(#[from] bollard::errors::Error),

    /// The named container (or image) does not exist
    #[error("No such container: {0}")]
    NotFound(String),

    /// Rejected by [`ContainerConfigBuilder::build`]
    #[error("Invalid container settings: {0}")]
    ConfigError(String),

    /// The shell exec could not be attached
    #[error("Exec failed: {0}")]
    ExecutionError(String),

    #[error("Volume lookup failed: {0}")]
    VolumeError(String),

    /// Terminal forwarding during a shell session
    #[error("Terminal I/O failed: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl ContainerError {
    /// Map a bollard error, turning a 404 into [`ContainerError::NotFound`].
    pub(crate) fn from_lookup(name: &str, err: bollard::errors::Error) -> Self {
        match err {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            } => ContainerError::NotFound(name.to_string()),
            e => ContainerError::ApiError(e),
        }
    }
}

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;
