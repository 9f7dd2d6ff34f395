//! Connection to the local container daemon.
//!
//! The gateway host normally runs Docker; rootless and system Podman sockets
//! are tried as fallbacks so the tool also works on Podman-based images.

use crate::container::{ContainerError, Result};
use bollard::Docker;
use bollard::query_parameters::InspectContainerOptions;
use std::sync::Arc;
use tracing::{debug, info};

/// Socket timeout, in seconds, for the Podman fallbacks.
const SOCKET_TIMEOUT_SECS: u64 = 120;

/// Shared handle to the daemon.
#[derive(Clone)]
pub struct ContainerClient {
    docker: Arc<Docker>,
}

impl ContainerClient {
    /// Connect and verify the daemon answers.
    ///
    /// # Errors
    ///
    /// Returns error if no daemon socket accepts a connection or the daemon
    /// does not answer a ping.
    pub async fn new() -> Result<Self> {
        let client = Self {
            docker: Arc::new(Self::connect()?),
        };

        client.docker.ping().await.map_err(|e| {
            ContainerError::Other(format!("Container daemon did not answer: {}", e))
        })?;
        debug!("Container daemon ping successful");

        Ok(client)
    }

    /// `DOCKER_HOST` or the default socket first, then the Podman sockets.
    fn connect() -> Result<Docker> {
        match Docker::connect_with_local_defaults() {
            Ok(docker) => {
                info!("Connected to container daemon via local defaults");
                return Ok(docker);
            }
            Err(e) => debug!("Local defaults failed: {}", e),
        }

        for socket in podman_sockets() {
            debug!("Trying Podman socket: {}", socket);
            match Docker::connect_with_socket(&socket, SOCKET_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION) {
                Ok(docker) => {
                    info!("Connected to Podman via {}", socket);
                    return Ok(docker);
                }
                Err(e) => debug!("Podman socket {} failed: {}", socket, e),
            }
        }

        Err(ContainerError::Other(
            "Failed to connect to Docker or Podman. Is the daemon running?".to_string(),
        ))
    }

    /// The bollard handle.
    pub fn docker(&self) -> &Docker {
        &self.docker
    }

    /// Whether a container with exactly this name exists.
    ///
    /// The Engine API's `name` list filter matches substrings, so this goes
    /// through inspect instead.
    ///
    /// # Errors
    ///
    /// Returns error if inspection fails for reasons other than not found.
    pub async fn container_exists(&self, name: &str) -> Result<bool> {
        match self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match ContainerError::from_lookup(name, e) {
                ContainerError::NotFound(_) => Ok(false),
                e => Err(e),
            },
        }
    }
}

/// Rootless socket (when `XDG_RUNTIME_DIR` is set) then the system socket.
fn podman_sockets() -> Vec<String> {
    let mut sockets = Vec::new();
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        sockets.push(format!("unix://{}/podman/podman.sock", runtime_dir));
    }
    sockets.push("unix:///run/podman/podman.sock".to_string());
    sockets
}
