//! In-memory collaborators for driving the lifecycle controller in tests.

#![allow(dead_code)]

use async_trait::async_trait;
use edgectl::cli::{ManagerConfig, OutputFormat, Reporter};
use edgectl::container::{
    self, ContainerConfig, ContainerDetails, ContainerError, ContainerRecord, ContainerRuntime,
};
use edgectl::manager::{LifecycleController, Prompt};
use edgectl::platform::{self, Architecture, HostInventory, PackageVersion, PlatformError};
use edgectl::watchtower::{self, UpdateTrigger, WatchtowerError};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const IMAGE: &str = "registry.local/edge-gateway:2.0";

/// A container known to [`FakeRuntime`].
#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub record: ContainerRecord,
    pub details: ContainerDetails,
}

#[derive(Debug, Default)]
pub struct RuntimeState {
    pub containers: Vec<FakeContainer>,
    pub volumes: HashMap<String, String>,
    pub logs: HashMap<String, String>,
    pub calls: Vec<String>,
    pub created: Vec<(String, ContainerConfig)>,
    pub shell_input: Vec<String>,
}

/// Records every call and keeps containers and volumes in memory.
#[derive(Debug, Default)]
pub struct FakeRuntime {
    state: Mutex<RuntimeState>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a container with its same-named volume.
    pub fn with_container(self, name: &str, state: &str, labels: &[(&str, &str)]) -> Self {
        let labels: HashMap<String, String> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let details = ContainerDetails {
            name: name.to_string(),
            network_mode: Some("host".to_string()),
            labels: labels.clone(),
            binds: vec![format!("{}:/var/lib/edge", name)],
            ..Default::default()
        };
        self.with_details(name, state, details)
    }

    /// Add a container with explicit inspect details.
    pub fn with_details(self, name: &str, state: &str, details: ContainerDetails) -> Self {
        {
            let mut guard = self.state.lock().unwrap();
            guard.containers.push(FakeContainer {
                record: ContainerRecord {
                    name: name.to_string(),
                    state: state.to_string(),
                    labels: details.labels.clone(),
                    image: "seeedcloud/edge-gateway:1.0".to_string(),
                },
                details,
            });
            guard
                .volumes
                .insert(name.to_string(), format!("/var/lib/docker/volumes/{}/_data", name));
        }
        self
    }

    pub fn without_volume(self, name: &str) -> Self {
        self.state.lock().unwrap().volumes.remove(name);
        self
    }

    pub fn with_logs(self, name: &str, logs: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .logs
            .insert(name.to_string(), logs.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls other than listings and lookups.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("list") && !c.starts_with("exists") && !c.starts_with("inspect"))
            .collect()
    }

    pub fn created(&self) -> Vec<(String, ContainerConfig)> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .containers
            .iter()
            .map(|c| c.record.name.clone())
            .collect()
    }

    /// Lines typed into shells.
    pub fn shell_input(&self) -> Vec<String> {
        self.state.lock().unwrap().shell_input.clone()
    }

    pub fn has_volume(&self, name: &str) -> bool {
        self.state.lock().unwrap().volumes.contains_key(name)
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_containers(
        &self,
        all: bool,
        label_filters: &[String],
    ) -> container::Result<Vec<ContainerRecord>> {
        self.record(format!("list all={} filters={:?}", all, label_filters));
        let guard = self.state.lock().unwrap();
        Ok(guard
            .containers
            .iter()
            .map(|c| c.record.clone())
            .filter(|r| all || r.state == "running")
            .filter(|r| {
                label_filters.iter().all(|filter| match filter.split_once('=') {
                    Some((key, value)) => r.label(key) == Some(value),
                    None => r.labels.contains_key(filter.as_str()),
                })
            })
            .collect())
    }

    async fn container_exists(&self, name: &str) -> container::Result<bool> {
        self.record(format!("exists {}", name));
        Ok(self.container_names().iter().any(|n| n == name))
    }

    async fn inspect_container(&self, name: &str) -> container::Result<ContainerDetails> {
        self.record(format!("inspect {}", name));
        self.state
            .lock()
            .unwrap()
            .containers
            .iter()
            .find(|c| c.record.name == name)
            .map(|c| c.details.clone())
            .ok_or_else(|| ContainerError::NotFound(name.to_string()))
    }

    async fn pull_image(&self, image: &str) -> container::Result<()> {
        self.record(format!("pull {}", image));
        Ok(())
    }

    async fn run_container(&self, name: &str, config: &ContainerConfig) -> container::Result<String> {
        self.record(format!("run {}", name));
        let labels = config.labels.clone().unwrap_or_default();
        let host = &config.host_config;
        let details = ContainerDetails {
            name: name.to_string(),
            network_mode: host.network_mode.clone(),
            port_bindings: host.port_bindings.clone().unwrap_or_default(),
            labels: labels.clone(),
            binds: host.binds.clone().unwrap_or_default(),
            privileged: host.privileged.unwrap_or(false),
            ipc_mode: host.ipc_mode.clone(),
            pid_mode: host.pid_mode.clone(),
        };

        let mut guard = self.state.lock().unwrap();
        guard.created.push((name.to_string(), config.clone()));
        guard.containers.push(FakeContainer {
            record: ContainerRecord {
                name: name.to_string(),
                state: "running".to_string(),
                labels,
                image: config.image.clone(),
            },
            details,
        });
        guard
            .volumes
            .entry(name.to_string())
            .or_insert_with(|| format!("/var/lib/docker/volumes/{}/_data", name));
        Ok(format!("id-{}", name))
    }

    async fn kill_container(&self, name: &str) -> container::Result<()> {
        self.record(format!("kill {}", name));
        let mut guard = self.state.lock().unwrap();
        let container = guard
            .containers
            .iter_mut()
            .find(|c| c.record.name == name)
            .ok_or_else(|| ContainerError::NotFound(name.to_string()))?;
        container.record.state = "exited".to_string();
        Ok(())
    }

    async fn remove_container(&self, name: &str, force: bool) -> container::Result<()> {
        self.record(format!("remove {} force={}", name, force));
        self.state
            .lock()
            .unwrap()
            .containers
            .retain(|c| c.record.name != name);
        Ok(())
    }

    async fn remove_volume(&self, name: &str, force: bool) -> container::Result<()> {
        self.record(format!("remove-volume {} force={}", name, force));
        self.state.lock().unwrap().volumes.remove(name);
        Ok(())
    }

    async fn volume_mountpoint(&self, name: &str) -> container::Result<String> {
        self.record(format!("volume {}", name));
        self.state
            .lock()
            .unwrap()
            .volumes
            .get(name)
            .cloned()
            .ok_or_else(|| ContainerError::VolumeError(format!("no such volume: {}", name)))
    }

    async fn logs(&self, name: &str) -> container::Result<String> {
        self.record(format!("logs {}", name));
        Ok(self
            .state
            .lock()
            .unwrap()
            .logs
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    /// Consumes one line as the shell's input, then the shell exits.
    async fn open_shell(&self, name: &str, input: &dyn Prompt) -> container::Result<()> {
        self.record(format!("shell {}", name));
        if let Some(line) = input.read_line().await? {
            self.state.lock().unwrap().shell_input.push(line);
        }
        Ok(())
    }
}

/// Host with a fixed architecture, firmware and driver. Counts firmware
/// queries.
#[derive(Debug)]
pub struct FakeHost {
    pub arch: Architecture,
    pub firmware: Option<String>,
    pub driver: Option<u32>,
    firmware_queries: AtomicUsize,
}

impl FakeHost {
    fn new(arch: Architecture, firmware: Option<&str>, driver: Option<u32>) -> Self {
        Self {
            arch,
            firmware: firmware.map(str::to_string),
            driver,
            firmware_queries: AtomicUsize::new(0),
        }
    }

    pub fn jetson(firmware: &str) -> Self {
        Self::new(Architecture::Aarch64, Some(firmware), None)
    }

    pub fn x86(driver: Option<u32>) -> Self {
        Self::new(Architecture::X86_64, None, driver)
    }

    pub fn other(machine: &str) -> Self {
        Self::new(Architecture::Other(machine.to_string()), None, None)
    }

    pub fn firmware_queries(&self) -> usize {
        self.firmware_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostInventory for FakeHost {
    fn architecture(&self) -> Architecture {
        self.arch.clone()
    }

    async fn firmware_version(&self) -> platform::Result<PackageVersion> {
        self.firmware_queries.fetch_add(1, Ordering::SeqCst);
        match &self.firmware {
            Some(version) => version.parse(),
            None => Err(PlatformError::ToolMissing("dpkg-query".to_string())),
        }
    }

    async fn gpu_driver_major(&self) -> platform::Result<u32> {
        self.driver
            .ok_or_else(|| PlatformError::ToolMissing("nvidia-smi".to_string()))
    }
}

/// Counts update requests; optionally fails them.
#[derive(Debug, Default)]
pub struct FakeTrigger {
    pub fail: bool,
    requests: AtomicUsize,
}

impl FakeTrigger {
    pub fn failing() -> Self {
        Self {
            fail: true,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpdateTrigger for FakeTrigger {
    async fn trigger_update(&self) -> watchtower::Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(WatchtowerError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE));
        }
        Ok(())
    }
}

/// Replays canned input lines, then reports end of input.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    lines: Mutex<VecDeque<String>>,
    reads: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: Mutex::new(lines.iter().map(|l| l.to_string()).collect()),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prompt for ScriptedPrompt {
    async fn read_line(&self) -> io::Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.lines.lock().unwrap().pop_front())
    }
}

/// Cloneable in-memory output sink.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    /// Every non-empty output line parsed as JSON.
    pub fn envelopes(&self) -> Vec<Value> {
        self.contents()
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// Messages of every envelope with the given status.
    pub fn messages(&self, status: &str) -> Vec<String> {
        self.envelopes()
            .into_iter()
            .filter(|e| e["status"] == status)
            .filter_map(|e| e["message"].as_str().map(str::to_string))
            .collect()
    }
}

/// Everything a controller borrows, owned in one place.
pub struct Harness {
    pub config: ManagerConfig,
    pub runtime: FakeRuntime,
    pub host: FakeHost,
    pub trigger: FakeTrigger,
    pub prompt: ScriptedPrompt,
    pub out: SharedBuffer,
}

impl Harness {
    pub fn new(runtime: FakeRuntime, host: FakeHost) -> Self {
        Self {
            config: ManagerConfig::new(IMAGE),
            runtime,
            host,
            trigger: FakeTrigger::default(),
            prompt: ScriptedPrompt::default(),
            out: SharedBuffer::default(),
        }
    }

    pub fn with_input(mut self, lines: &[&str]) -> Self {
        self.prompt = ScriptedPrompt::new(lines);
        self
    }

    pub fn controller(&self, format: OutputFormat) -> LifecycleController<'_> {
        LifecycleController::new(
            &self.config,
            &self.runtime,
            &self.host,
            &self.trigger,
            &self.prompt,
            Reporter::new(format, Box::new(self.out.clone())),
        )
    }

    /// Controller writing JSON envelopes.
    pub fn json_controller(&self) -> LifecycleController<'_> {
        self.controller(OutputFormat::Json)
    }
}
