//! Typed creation settings for gateway and watcher containers.
//!
//! Binds, environment, labels, host namespaces and GPU access are collected
//! by [`ContainerConfigBuilder`] and handed to the Engine API as-is.

use crate::container::{ContainerError, Result};
use bollard::models::{
    ContainerCreateBody, DeviceRequest, HostConfig, PortBinding, RestartPolicy,
    RestartPolicyNameEnum,
};
use std::collections::HashMap;

/// Port bindings keyed by `port/protocol`, as the Engine API reports them.
pub type PortMap = HashMap<String, Option<Vec<PortBinding>>>;

/// Accumulates creation settings; [`build`](Self::build) validates them.
#[derive(Debug, Default)]
pub struct ContainerConfigBuilder {
    image: Option<String>,
    cmd: Option<Vec<String>>,
    hostname: Option<String>,
    env: Vec<String>,
    labels: HashMap<String, String>,
    binds: Vec<String>,
    network_mode: Option<String>,
    ipc_mode: Option<String>,
    pid_mode: Option<String>,
    port_bindings: PortMap,
    privileged: bool,
    restart_always: bool,
    runtime: Option<String>,
    device_requests: Vec<DeviceRequest>,
}

impl ContainerConfigBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Image reference to create from.
    pub fn image<S: Into<String>>(mut self, image: S) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Override the image entrypoint arguments.
    pub fn cmd<I, S>(mut self, cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd = Some(cmd.into_iter().map(|s| s.into()).collect());
        self
    }

    pub fn hostname<S: Into<String>>(mut self, hostname: S) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Append `key=value` to the environment.
    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.env.push(format!("{}={}", key.into(), value.into()));
        self
    }

    /// Set one label.
    pub fn label<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add every label of a map, overwriting keys already set.
    pub fn labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels.extend(labels);
        self
    }

    /// Add a bind mount (`source:target[:mode]`). Duplicates are ignored.
    pub fn bind<S: Into<String>>(mut self, bind: S) -> Self {
        let bind = bind.into();
        if !self.binds.contains(&bind) {
            self.binds.push(bind);
        }
        self
    }

    /// Network namespace; the gateway always uses `host`.
    pub fn network_mode<S: Into<String>>(mut self, mode: S) -> Self {
        self.network_mode = Some(mode.into());
        self
    }

    /// Set the IPC namespace mode.
    pub fn ipc_mode<S: Into<String>>(mut self, mode: S) -> Self {
        self.ipc_mode = Some(mode.into());
        self
    }

    /// Set the PID namespace mode.
    pub fn pid_mode<S: Into<String>>(mut self, mode: S) -> Self {
        self.pid_mode = Some(mode.into());
        self
    }

    /// Publish `port/protocol` on a host port, all interfaces.
    pub fn port_binding<S: Into<String>>(mut self, container_port: S, host_port: u16) -> Self {
        self.port_bindings.insert(
            container_port.into(),
            Some(vec![PortBinding {
                host_ip: None,
                host_port: Some(host_port.to_string()),
            }]),
        );
        self
    }

    /// Replace all port bindings with an existing map.
    pub fn port_bindings(mut self, bindings: PortMap) -> Self {
        self.port_bindings = bindings;
        self
    }

    pub fn privileged(mut self, enable: bool) -> Self {
        self.privileged = enable;
        self
    }

    /// Restart the container whenever it exits, including after reboots.
    pub fn restart_always(mut self) -> Self {
        self.restart_always = true;
        self
    }

    /// Select a named OCI runtime (e.g. `nvidia`).
    pub fn runtime<S: Into<String>>(mut self, runtime: S) -> Self {
        self.runtime = Some(runtime.into());
        self
    }

    /// Attach a device request (e.g. all GPUs).
    pub fn device_request(mut self, request: DeviceRequest) -> Self {
        self.device_requests.push(request);
        self
    }

    /// Validate and freeze.
    ///
    /// # Errors
    ///
    /// [`ContainerError::ConfigError`] when the image is blank or an
    /// environment entry has no name.
    pub fn build(self) -> Result<ContainerConfig> {
        let image = self
            .image
            .filter(|image| !image.trim().is_empty())
            .ok_or_else(|| ContainerError::ConfigError("Image is required".to_string()))?;

        if let Some(bad) = self.env.iter().find(|e| e.starts_with('=')) {
            return Err(ContainerError::ConfigError(format!(
                "Environment variable without a name: {}",
                bad
            )));
        }

        let host_config = HostConfig {
            binds: (!self.binds.is_empty()).then_some(self.binds),
            network_mode: self.network_mode,
            ipc_mode: self.ipc_mode,
            pid_mode: self.pid_mode,
            port_bindings: (!self.port_bindings.is_empty()).then_some(self.port_bindings),
            privileged: Some(self.privileged),
            restart_policy: self.restart_always.then(|| RestartPolicy {
                name: Some(RestartPolicyNameEnum::ALWAYS),
                maximum_retry_count: Some(0),
            }),
            runtime: self.runtime,
            device_requests: (!self.device_requests.is_empty()).then_some(self.device_requests),
            ..Default::default()
        };

        Ok(ContainerConfig {
            image,
            cmd: self.cmd,
            hostname: self.hostname,
            env: (!self.env.is_empty()).then_some(self.env),
            labels: (!self.labels.is_empty()).then_some(self.labels),
            host_config,
        })
    }
}

/// Everything needed to create one container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerConfig {
    /// Image reference
    pub image: String,
    /// Entrypoint arguments
    pub cmd: Option<Vec<String>>,
    /// Hostname inside the container
    pub hostname: Option<String>,
    /// Environment variables (`KEY=value`)
    pub env: Option<Vec<String>>,
    pub labels: Option<HashMap<String, String>>,
    /// Binds, namespaces, restart policy and GPU settings
    pub host_config: HostConfig,
}

impl ContainerConfig {
    pub fn builder() -> ContainerConfigBuilder {
        ContainerConfigBuilder::new()
    }

    /// Value of an environment variable, if set.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env.as_ref()?.iter().find_map(|entry| {
            entry
                .split_once('=')
                .filter(|(k, _)| *k == key)
                .map(|(_, v)| v)
        })
    }

    /// Value of a label, if set.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.as_ref()?.get(key).map(String::as_str)
    }

    /// Bind mounts, empty if none.
    pub fn binds(&self) -> &[String] {
        self.host_config.binds.as_deref().unwrap_or_default()
    }

    /// Convert into the Engine API create body.
    pub fn to_create_body(&self) -> ContainerCreateBody {
        ContainerCreateBody {
            image: Some(self.image.clone()),
            cmd: self.cmd.clone(),
            hostname: self.hostname.clone(),
            env: self.env.clone(),
            labels: self.labels.clone(),
            host_config: Some(self.host_config.clone()),
            ..Default::default()
        }
    }
}
