//! Companion auto-update watcher.
//!
//! The watcher is a singleton `containrrr/watchtower` container that polls the
//! registry for newer images of every container labelled
//! `com.centurylinklabs.watchtower.enable=true` and recreates them. It also
//! exposes an HTTP endpoint that triggers an immediate check; `update` calls
//! it and does not wait for the resulting cycle.

use crate::container::{self, ContainerConfig};
use crate::env::{self, labels, watchtower};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, info};
use url::Url;

/// Watcher errors.
#[derive(Debug, thiserror::Error)]
pub enum WatchtowerError {
    /// The endpoint URL is malformed
    #[error("Invalid watchtower URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    /// The HTTP request failed to complete
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The watcher answered with a non-success status
    #[error("Watchtower responded with status {0}")]
    Status(reqwest::StatusCode),
}

/// Result type for watcher operations.
pub type Result<T> = std::result::Result<T, WatchtowerError>;

/// Something that can ask the watcher to check for image updates.
#[async_trait]
pub trait UpdateTrigger: Send + Sync {
    /// Request an immediate update check.
    async fn trigger_update(&self) -> Result<()>;
}

/// HTTP client for the watcher's update endpoint.
#[derive(Debug, Clone)]
pub struct WatchtowerClient {
    http: reqwest::Client,
    url: Url,
    token: String,
}

impl WatchtowerClient {
    /// Client for the given endpoint and bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`WatchtowerError::InvalidUrl`] if `url` does not parse.
    pub fn new(url: &str, token: impl Into<String>) -> Result<Self> {
        let url = Url::parse(url).map_err(|source| WatchtowerError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        // The watcher is local; never route through a proxy
        let http = reqwest::Client::builder().no_proxy().build()?;

        Ok(Self {
            http,
            url,
            token: token.into(),
        })
    }

    /// Endpoint this client calls.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl UpdateTrigger for WatchtowerClient {
    async fn trigger_update(&self) -> Result<()> {
        debug!("Triggering watchtower update at {}", self.url);

        let response = self
            .http
            .get(self.url.clone())
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WatchtowerError::Status(status));
        }

        info!("Watchtower accepted update request");
        Ok(())
    }
}

/// Container configuration for the watcher.
///
/// # Errors
///
/// Only fails if the builder rejects the configuration.
pub fn companion_config(token: &str) -> container::Result<ContainerConfig> {
    let interval = watchtower::POLL_INTERVAL_SECS.to_string();

    ContainerConfig::builder()
        .image(watchtower::IMAGE)
        .cmd([
            "--http-api-update",
            "--http-api-token",
            token,
            "--label-enable",
            "--include-stopped",
            "--cleanup",
            "--interval",
            interval.as_str(),
        ])
        .bind("/var/run/docker.sock:/var/run/docker.sock")
        .restart_always()
        .port_binding(watchtower::CONTAINER_PORT, watchtower::HOST_PORT)
        .label(labels::CONTAINER_VERSION, watchtower::VERSION)
        .label(labels::CONTAINER_TYPE, watchtower::CONTAINER_TYPE)
        .build()
}

/// Whether a container name is the watcher.
pub fn is_watchtower(name: &str) -> bool {
    name == env::watchtower::CONTAINER_NAME
}
