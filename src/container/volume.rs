//! Container volume management.
//!
//! Gateway state (provisioning credentials, configuration) lives in a named
//! volume that outlives container replacement. This module inspects and
//! removes those volumes.

use crate::container::{ContainerError, Result};
use bollard::Docker;
use bollard::query_parameters::RemoveVolumeOptionsBuilder;
use tracing::{debug, info};

/// Named-volume operations needed by update audits and teardown.
pub struct VolumeManager {
    docker: Docker,
}

impl VolumeManager {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Look a volume up by name.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::VolumeError`] if the volume does not exist.
    pub async fn inspect_volume(&self, volume_name: &str) -> Result<VolumeInfo> {
        debug!("Inspecting volume: {}", volume_name);

        let volume = self
            .docker
            .inspect_volume(volume_name)
            .await
            .map_err(|e| match ContainerError::from_lookup(volume_name, e) {
                ContainerError::NotFound(name) => {
                    ContainerError::VolumeError(format!("No such volume: {}", name))
                }
                e => e,
            })?;

        Ok(VolumeInfo {
            name: volume.name,
            driver: volume.driver,
            mountpoint: volume.mountpoint,
        })
    }

    /// Delete a volume; `force` also drops it while referenced.
    ///
    /// # Errors
    ///
    /// Any daemon error, including a missing volume.
    pub async fn remove_volume(&self, volume_name: &str, force: bool) -> Result<()> {
        debug!("Removing volume: {}", volume_name);

        self.docker
            .remove_volume(
                volume_name,
                Some(RemoveVolumeOptionsBuilder::default().force(force).build()),
            )
            .await?;

        info!("Removed volume: {}", volume_name);
        Ok(())
    }
}

/// Subset of the inspect response the controller reads.
#[derive(Debug, Clone)]
pub struct VolumeInfo {
    pub name: String,
    pub driver: String,
    /// Host path backing the volume
    pub mountpoint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires Docker/Podman
    async fn test_missing_volume_is_volume_error() {
        let docker = Docker::connect_with_local_defaults().unwrap();
        let manager = VolumeManager::new(docker);

        let result = manager.inspect_volume("edgectl-volume-that-does-not-exist").await;
        assert!(matches!(result, Err(ContainerError::VolumeError(_))));
    }
}
