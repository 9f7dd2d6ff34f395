//! Bollard-backed container runtime.
//!
//! Implements [`ContainerRuntime`] on top of [`ContainerClient`], delegating
//! image pulls to [`ImagePuller`], volume calls to [`VolumeManager`] and
//! shells to [`InteractiveSession`].

use crate::container::{
    ContainerClient, ContainerConfig, ContainerDetails, ContainerError, ContainerRecord,
    ContainerRuntime, ImagePuller, InteractiveSession, Result, VolumeManager,
};
use crate::manager::Prompt;
use async_trait::async_trait;
use bollard::models::ContainerSummary;
use bollard::query_parameters::{
    CreateContainerOptionsBuilder, InspectContainerOptions, KillContainerOptions,
    ListContainersOptionsBuilder, LogsOptionsBuilder, RemoveContainerOptionsBuilder,
    StartContainerOptions,
};
use futures::stream::StreamExt;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Container runtime backed by a Docker/Podman daemon.
pub struct ContainerOrchestrator {
    client: ContainerClient,
}

impl ContainerOrchestrator {
    /// Connect to the local daemon.
    ///
    /// # Errors
    ///
    /// Returns error if connection to container runtime fails.
    pub async fn new() -> Result<Self> {
        let client = ContainerClient::new().await?;
        Ok(Self { client })
    }

    fn volumes(&self) -> VolumeManager {
        VolumeManager::new(self.client.docker().clone())
    }
}

/// Convert a listing row, stripping the `/` the Engine API prefixes names with.
fn record_from_summary(summary: ContainerSummary) -> ContainerRecord {
    let name = summary
        .names
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_default();

    ContainerRecord {
        name,
        state: summary.state.map(|s| s.to_string()).unwrap_or_default(),
        labels: summary.labels.unwrap_or_default(),
        image: summary.image.unwrap_or_default(),
    }
}

#[async_trait]
impl ContainerRuntime for ContainerOrchestrator {
    async fn list_containers(
        &self,
        all: bool,
        label_filters: &[String],
    ) -> Result<Vec<ContainerRecord>> {
        let mut filters: HashMap<&str, Vec<&str>> = HashMap::new();
        if !label_filters.is_empty() {
            filters.insert("label", label_filters.iter().map(String::as_str).collect());
        }

        let options = ListContainersOptionsBuilder::default()
            .all(all)
            .filters(&filters)
            .build();

        let containers = self
            .client
            .docker()
            .list_containers(Some(options))
            .await?;

        debug!("Runtime returned {} containers", containers.len());
        Ok(containers.into_iter().map(record_from_summary).collect())
    }

    async fn container_exists(&self, name: &str) -> Result<bool> {
        self.client.container_exists(name).await
    }

    async fn inspect_container(&self, name: &str) -> Result<ContainerDetails> {
        let inspect = self
            .client
            .docker()
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
            .map_err(|e| ContainerError::from_lookup(name, e))?;

        let host = inspect.host_config.unwrap_or_default();
        let labels = inspect
            .config
            .and_then(|config| config.labels)
            .unwrap_or_default();

        Ok(ContainerDetails {
            name: name.to_string(),
            network_mode: host.network_mode,
            port_bindings: host.port_bindings.unwrap_or_default(),
            labels,
            binds: host.binds.unwrap_or_default(),
            privileged: host.privileged.unwrap_or(false),
            ipc_mode: host.ipc_mode,
            pid_mode: host.pid_mode,
        })
    }

    async fn pull_image(&self, image: &str) -> Result<()> {
        ImagePuller::new(self.client.docker().clone())
            .pull_image(image)
            .await
    }

    async fn run_container(&self, name: &str, config: &ContainerConfig) -> Result<String> {
        debug!("Creating container: {}", name);

        let options = CreateContainerOptionsBuilder::default().name(name).build();
        let response = self
            .client
            .docker()
            .create_container(Some(options), config.to_create_body())
            .await?;

        for warning in &response.warnings {
            warn!("Runtime warning while creating {}: {}", name, warning);
        }

        self.client
            .docker()
            .start_container(name, None::<StartContainerOptions>)
            .await?;

        info!("Started container: {} ({})", name, response.id);
        Ok(response.id)
    }

    async fn kill_container(&self, name: &str) -> Result<()> {
        debug!("Killing container: {}", name);

        self.client
            .docker()
            .kill_container(name, None::<KillContainerOptions>)
            .await
            .map_err(|e| ContainerError::from_lookup(name, e))?;

        info!("Killed container: {}", name);
        Ok(())
    }

    async fn remove_container(&self, name: &str, force: bool) -> Result<()> {
        debug!("Removing container: {}", name);

        self.client
            .docker()
            .remove_container(
                name,
                Some(RemoveContainerOptionsBuilder::default().force(force).build()),
            )
            .await
            .map_err(|e| ContainerError::from_lookup(name, e))?;

        info!("Removed container: {}", name);
        Ok(())
    }

    async fn remove_volume(&self, name: &str, force: bool) -> Result<()> {
        self.volumes().remove_volume(name, force).await
    }

    async fn volume_mountpoint(&self, name: &str) -> Result<String> {
        Ok(self.volumes().inspect_volume(name).await?.mountpoint)
    }

    async fn logs(&self, name: &str) -> Result<String> {
        let options = LogsOptionsBuilder::default()
            .stdout(true)
            .stderr(true)
            .tail("all")
            .build();

        let mut stream = self.client.docker().logs(name, Some(options));
        let mut output = String::new();

        while let Some(result) = stream.next().await {
            let log = result.map_err(|e| ContainerError::from_lookup(name, e))?;
            output.push_str(&log.to_string());
        }

        Ok(output)
    }

    async fn open_shell(&self, name: &str, input: &dyn Prompt) -> Result<()> {
        InteractiveSession::new(self.client.docker().clone(), name)
            .start_shell(input)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_summary_strips_slash() {
        let summary = ContainerSummary {
            names: Some(vec!["/edge-gateway-container".to_string()]),
            image: Some("seeedcloud/edge-gateway:latest".to_string()),
            labels: Some(HashMap::from([(
                "edge.gateway_id".to_string(),
                "gw".to_string(),
            )])),
            ..Default::default()
        };

        let record = record_from_summary(summary);
        assert_eq!(record.name, "edge-gateway-container");
        assert_eq!(record.image, "seeedcloud/edge-gateway:latest");
        assert_eq!(record.label("edge.gateway_id"), Some("gw"));
        assert_eq!(record.state, "");
    }

    #[tokio::test]
    #[ignore] // Requires Docker/Podman
    async fn test_list_containers() {
        let orchestrator = ContainerOrchestrator::new().await.unwrap();
        let containers = orchestrator.list_containers(true, &[]).await.unwrap();
        println!("Found {} containers", containers.len());
    }
}
