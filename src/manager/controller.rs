//! The lifecycle controller.

use super::{Command, ListFilter, ManagerError, Prompt, Result};
use crate::cli::{ManagerConfig, Reporter, Status};
use crate::container::{ContainerConfig, ContainerError, ContainerRecord, ContainerRuntime};
use crate::env::{self, labels, watchtower};
use crate::platform::{self, GpuAccess, GpuHost, HostInventory, UpgradeCheck};
use crate::watchtower::{UpdateTrigger, companion_config, is_watchtower};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

const LIST_TITLE: &str = "\nList of containers installed:";
const LIST_HEADERS: [&str; 6] = ["Index", "Name", "Status", "Gateway ID", "Version", "Image"];
const UPDATE_TAG: &str = "[edge-container-update]";

/// Binds every gateway container gets besides its state volume.
const HOST_BINDS: [&str; 3] = [
    "/dev:/dev",
    "/tmp/.X11-unix/:/tmp/.X11-unix",
    "/var/run/dbus/system_bus_socket:/var/run/dbus/system_bus_socket",
];

/// Configuration for a freshly installed gateway container named `name`.
///
/// # Errors
///
/// Only fails if the builder rejects the configuration.
pub fn gateway_config(
    config: &ManagerConfig,
    name: &str,
    gpu: &GpuAccess,
) -> crate::container::Result<ContainerConfig> {
    let web_port = env::EDGE_WEB_PORT.to_string();
    let state_path = |dir: &str| format!("{}/{}", env::EDGE_STATE_DIR, dir);

    let mut builder = ContainerConfig::builder()
        .image(&config.image)
        .hostname(name)
        .bind(env::state_volume_bind(name))
        .privileged(true)
        .restart_always()
        .network_mode("host")
        .ipc_mode("host")
        .pid_mode("host")
        .env("DISPLAY", ":0")
        .env("EDGEAI_WEB_DIST_PATH", "/usr/bin/dist/")
        .env("EDGEAI_PORT", web_port)
        .env("EDGEAI_MODELS_PATH", state_path("models"))
        .env("EDGEAI_SOURCES_PATH", state_path("sources"))
        .env("EDGEAI_CONFIGS_PATH", state_path("configs"))
        .env("CONTAINER_MODEL", format!("Container {}", config.image))
        .label(labels::GATEWAY_ID, name)
        .label(labels::CONTAINER_TYPE, &config.image)
        .label(labels::CONTAINER_VERSION, env::EDGE_CONTAINER_VERSION)
        .label(labels::WATCHTOWER_ENABLE, "true");

    for bind in HOST_BINDS {
        builder = builder.bind(bind);
    }
    if let Some(environment) = &config.environment {
        builder = builder.env(env::vars::EDGE_ENVIRONMENT, environment);
    }
    if let Some((app_id, api_key)) = config.provisioning() {
        builder = builder
            .env(env::vars::EDGE_API_KEY, api_key)
            .env(env::vars::EDGE_APP_ID, app_id);
    }

    gpu.apply(builder).build()
}

/// Whether a container is a managed edge container.
fn is_managed(record: &ContainerRecord) -> bool {
    record.labels.contains_key(labels::GATEWAY_ID)
}

/// Runs lifecycle commands against a runtime and host.
pub struct LifecycleController<'a> {
    config: &'a ManagerConfig,
    runtime: &'a dyn ContainerRuntime,
    host: &'a dyn HostInventory,
    updater: &'a dyn UpdateTrigger,
    prompt: &'a dyn Prompt,
    reporter: Reporter,
}

impl<'a> LifecycleController<'a> {
    pub fn new(
        config: &'a ManagerConfig,
        runtime: &'a dyn ContainerRuntime,
        host: &'a dyn HostInventory,
        updater: &'a dyn UpdateTrigger,
        prompt: &'a dyn Prompt,
        reporter: Reporter,
    ) -> Self {
        Self {
            config,
            runtime,
            host,
            updater,
            prompt,
            reporter,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        self.config
    }

    pub fn reporter(&mut self) -> &mut Reporter {
        &mut self.reporter
    }

    /// Run one command. Recoverable failures are reported and swallowed;
    /// anything else is returned.
    pub async fn execute(&mut self, command: Command) -> Result<()> {
        debug!("Executing command: {:?}", command);

        let result = match command {
            Command::List(filter) => self.list(filter).await.map(|_| ()),
            Command::Install => self.install().await,
            Command::Download => self.download().await,
            Command::Stop(target) => self.stop(target).await,
            Command::Restart(target) => self.restart(target).await,
            Command::Remove(target) => self.remove(target).await,
            Command::Update => self.update().await,
            Command::Logs(target) => self.logs(target).await,
            Command::Shell(target) => self.shell(target).await,
            Command::StartWatchtower => self.start_watchtower().await,
        };

        match result {
            Err(e) if e.is_recoverable() => {
                warn!("{}", e);
                self.reporter.message(Status::Error, &e.to_string())?;
                Ok(())
            }
            other => other,
        }
    }

    /// Managed containers, optionally restricted to one version label.
    pub async fn managed_containers(
        &self,
        filter: ListFilter,
        version: Option<&str>,
    ) -> Result<Vec<ContainerRecord>> {
        let label_filters: Vec<String> = version
            .map(|v| format!("{}={}", labels::CONTAINER_VERSION, v))
            .into_iter()
            .collect();

        let records = self
            .runtime
            .list_containers(filter.includes_stopped(), &label_filters)
            .await?;

        Ok(records.into_iter().filter(is_managed).collect())
    }

    /// Report managed containers and return their names in listing order.
    pub async fn list(&mut self, filter: ListFilter) -> Result<Vec<String>> {
        let records = self.managed_containers(filter, None).await?;

        if records.is_empty() {
            self.reporter
                .titled_message(LIST_TITLE, Status::Info, "No edge containers found")?;
            return Ok(Vec::new());
        }

        let rows: Vec<Vec<Value>> = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                vec![
                    json!(i + 1),
                    json!(record.name),
                    json!(record.state),
                    json!(record.label(labels::GATEWAY_ID).unwrap_or_default()),
                    json!(record.label(labels::CONTAINER_VERSION).unwrap_or_default()),
                    json!(record.image),
                ]
            })
            .collect();

        self.reporter.table(LIST_TITLE, &LIST_HEADERS, &rows)?;
        Ok(records.into_iter().map(|record| record.name).collect())
    }

    /// Resolve the container an operation acts on.
    ///
    /// An explicit target is used as is. Otherwise the matching containers
    /// are listed and the operator picks one by 1-based index or name.
    /// `Ok(None)` means there is nothing to act on.
    async fn select(
        &mut self,
        filter: ListFilter,
        target: Option<String>,
        action: &str,
    ) -> Result<Option<String>> {
        if let Some(name) = target {
            return Ok(Some(name));
        }
        if self.config.no_prompt {
            return Err(ManagerError::Selection(format!(
                "No container given to {} and prompting is disabled",
                action
            )));
        }

        let names = self.list(filter).await?;
        if names.is_empty() {
            return Ok(None);
        }

        self.reporter.prompt(&format!(
            "Insert the index or the name of the container to {}:",
            action
        ))?;
        let Some(line) = self.prompt.read_line().await? else {
            return Ok(None);
        };
        let choice = line.trim();

        if let Ok(index) = choice.parse::<i64>() {
            return usize::try_from(index)
                .ok()
                .filter(|i| (1..=names.len()).contains(i))
                .map(|i| Some(names[i - 1].clone()))
                .ok_or_else(|| ManagerError::Selection("Invalid index".to_string()));
        }

        if names.iter().any(|name| name == choice) {
            Ok(Some(choice.to_string()))
        } else {
            Err(ManagerError::Selection("Container not found".to_string()))
        }
    }

    async fn pull_image(&self) -> Result<()> {
        info!("Pulling image {}", self.config.image);
        self.runtime.pull_image(&self.config.image).await?;
        Ok(())
    }

    /// Pull the image and create the gateway container unless the name is taken.
    pub async fn install(&mut self) -> Result<()> {
        self.reporter.note(
            "Start downloading and running the edge gateway program, which may take 5 to 30 minutes.",
        )?;
        self.pull_image().await?;

        let name = self.config.container_name().to_string();
        if self.runtime.container_exists(&name).await? {
            return Err(ManagerError::AlreadyExists(name));
        }

        if self.config.provisioning().is_some() {
            self.reporter.note(&format!(
                "Performing the provision of edge container '{}' using the provided EDGE_APP_ID & EDGE_API_KEY",
                name
            ))?;
        }

        let gpu = GpuHost::detect(self.host).await?.access()?;
        let container_config = gateway_config(self.config, &name, &gpu)?;
        let id = self.runtime.run_container(&name, &container_config).await?;
        info!("Installed {} ({})", name, id);

        self.reporter.message(Status::Success, "Container started! ")?;

        if self.config.website {
            match platform::local_ip() {
                Some(ip) => self.reporter.note(&format!(
                    "Edge AI Website========>: http://{}:{}",
                    ip,
                    env::EDGE_WEB_PORT
                ))?,
                None => warn!("Could not determine the local IP address"),
            }
        }
        Ok(())
    }

    /// Pull the image only.
    pub async fn download(&mut self) -> Result<()> {
        self.pull_image().await?;
        self.reporter
            .message(Status::Success, "Latest container version downloaded.")?;
        Ok(())
    }

    /// Replace a container with one created from the latest image.
    pub async fn restart(&mut self, target: Option<String>) -> Result<()> {
        let gpu_host = GpuHost::detect(self.host).await?;
        if let UpgradeCheck::Blocked(reason) = gpu_host.restart_check() {
            return Err(ManagerError::Precondition(reason));
        }

        let Some(name) = self.select(ListFilter::All, target, "restart").await? else {
            return Ok(());
        };

        self.replace_container(&name, &gpu_host).await
    }

    /// Recreate `name` from the configured image, carrying over its host
    /// settings and labels and advancing the version label.
    async fn replace_container(&mut self, name: &str, gpu_host: &GpuHost) -> Result<()> {
        self.pull_image().await?;

        let details = match self.runtime.inspect_container(name).await {
            Ok(details) => details,
            Err(ContainerError::NotFound(_)) => {
                return Err(ManagerError::ContainerNotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut container_labels = details.labels;
        container_labels.insert(
            labels::CONTAINER_VERSION.to_string(),
            env::EDGE_CONTAINER_VERSION.to_string(),
        );

        let mut builder = ContainerConfig::builder()
            .image(&self.config.image)
            .hostname(name)
            .bind(env::state_volume_bind(name))
            .port_bindings(details.port_bindings)
            .labels(container_labels)
            .privileged(details.privileged)
            .restart_always();
        for bind in details.binds {
            builder = builder.bind(bind);
        }
        if let Some(mode) = details.network_mode {
            builder = builder.network_mode(mode);
        }
        if let Some(mode) = details.ipc_mode {
            builder = builder.ipc_mode(mode);
        }
        if let Some(mode) = details.pid_mode {
            builder = builder.pid_mode(mode);
        }

        let container_config = gpu_host.access()?.apply(builder).build()?;

        self.runtime.remove_container(name, true).await?;
        let id = self.runtime.run_container(name, &container_config).await?;
        info!("Recreated {} ({})", name, id);

        self.reporter
            .message(Status::Success, &format!("Container {} restarted!", name))?;
        Ok(())
    }

    /// Kill a running container.
    pub async fn stop(&mut self, target: Option<String>) -> Result<()> {
        let Some(name) = self.select(ListFilter::Running, target, "stop").await? else {
            return Ok(());
        };

        self.runtime.kill_container(&name).await?;
        self.reporter.message(Status::Success, "Container stopped!")?;
        Ok(())
    }

    /// Force-remove a container and its volume.
    pub async fn remove(&mut self, target: Option<String>) -> Result<()> {
        let Some(name) = self.select(ListFilter::All, target, "remove").await? else {
            return Ok(());
        };

        self.runtime.remove_container(&name, true).await?;
        self.runtime.remove_volume(&name, true).await?;
        self.reporter.message(Status::Success, "Container removed!")?;
        Ok(())
    }

    /// Audit volumes, migrate legacy containers and ask the watcher for an
    /// image update check.
    pub async fn update(&mut self) -> Result<()> {
        self.audit_volumes().await?;

        let gpu_host = GpuHost::detect(self.host).await?;
        if let UpgradeCheck::Blocked(reason) = gpu_host.update_check(self.host).await {
            return Err(ManagerError::Precondition(reason));
        }

        let legacy = self
            .managed_containers(ListFilter::All, Some(env::LEGACY_CONTAINER_VERSION))
            .await?;
        for record in legacy {
            info!("Migrating legacy container {}", record.name);
            self.replace_container(&record.name, &gpu_host).await?;
        }

        self.reporter.note(&format!(
            "{} Checking for updates in Edge containers images",
            UPDATE_TAG
        ))?;
        if let Err(e) = self.updater.trigger_update().await {
            warn!("Watchtower trigger failed: {}", e);
            self.reporter
                .message(Status::Error, &format!("{} Exception: {}", UPDATE_TAG, e))?;
        }
        Ok(())
    }

    /// Inspect the state volume of every managed container. Failures are
    /// reported and never abort.
    async fn audit_volumes(&mut self) -> Result<()> {
        let records = match self.managed_containers(ListFilter::All, None).await {
            Ok(records) => records,
            Err(e) => {
                self.reporter
                    .message(Status::Error, &format!("{} Exception: {}", UPDATE_TAG, e))?;
                return Ok(());
            }
        };

        for record in records.iter().filter(|r| !is_watchtower(&r.name)) {
            match self.runtime.volume_mountpoint(&record.name).await {
                Ok(mountpoint) => debug!("Volume {} mounted at {}", record.name, mountpoint),
                Err(e) => self
                    .reporter
                    .message(Status::Error, &format!("{} Exception: {}", UPDATE_TAG, e))?,
            }
        }
        Ok(())
    }

    /// Print the full log of a container.
    pub async fn logs(&mut self, target: Option<String>) -> Result<()> {
        let Some(name) = self.select(ListFilter::All, target, "print logs").await? else {
            return Ok(());
        };

        let output = self.runtime.logs(&name).await?;
        self.reporter.text(&output)?;
        Ok(())
    }

    /// Attach an interactive shell to a running container.
    pub async fn shell(&mut self, target: Option<String>) -> Result<()> {
        let Some(name) = self
            .select(ListFilter::Running, target, "access with interactive shell")
            .await?
        else {
            return Ok(());
        };

        self.runtime.open_shell(&name, self.prompt).await?;
        Ok(())
    }

    /// Run the watcher unless it already exists.
    pub async fn start_watchtower(&mut self) -> Result<()> {
        if self.runtime.container_exists(watchtower::CONTAINER_NAME).await? {
            self.reporter
                .message(Status::Info, "Watchtower is already present")?;
            return Ok(());
        }

        let watcher_config = companion_config(&self.config.watchtower_token)?;
        self.runtime.pull_image(watchtower::IMAGE).await?;
        self.runtime
            .run_container(watchtower::CONTAINER_NAME, &watcher_config)
            .await?;

        self.reporter.message(Status::Success, "Watchtower started!")?;
        Ok(())
    }
}
