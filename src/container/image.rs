//! Image pulls.

use crate::container::{ContainerError, Result};
use bollard::Docker;
use bollard::query_parameters::CreateImageOptionsBuilder;
use futures::stream::StreamExt;
use tracing::{debug, info};

/// Pulls images from their registries.
pub struct ImagePuller {
    docker: Docker,
}

impl ImagePuller {
    /// Create a new image puller.
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Pull an image from a registry.
    ///
    /// A reference without a tag pulls `latest`.
    ///
    /// # Errors
    ///
    /// Returns error if the registry or daemon reports a failure.
    pub async fn pull_image(&self, image: &str) -> Result<()> {
        info!("Pulling image: {}", image);

        let (name, tag) = split_reference(image);
        let mut options = CreateImageOptionsBuilder::default().from_image(name);
        if !tag.is_empty() {
            options = options.tag(tag);
        }

        let mut stream = self.docker.create_image(Some(options.build()), None, None);

        while let Some(result) = stream.next().await {
            let info = result.map_err(ContainerError::ApiError)?;
            if let Some(status) = info.status {
                debug!("Pull: {}", status);
            }
            if let Some(message) = info.error_detail.and_then(|detail| detail.message) {
                return Err(ContainerError::Other(format!("Pull failed: {}", message)));
            }
        }

        info!("Successfully pulled image: {}", image);
        Ok(())
    }
}

/// Split an image reference into repository and tag.
///
/// The tag separator is the last `:` after the last `/`, so registry ports
/// (`host:5000/repo`) are not mistaken for tags. Digests (`@sha256:...`) are
/// passed through as the repository with an empty tag.
pub(crate) fn split_reference(image: &str) -> (&str, &str) {
    if image.contains('@') {
        return (image, "");
    }
    let name_start = image.rfind('/').map(|i| i + 1).unwrap_or(0);
    match image[name_start..].rfind(':') {
        Some(i) => {
            let split = name_start + i;
            (&image[..split], &image[split + 1..])
        }
        None => (image, "latest"),
    }
}
