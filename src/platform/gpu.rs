//! GPU access policy and upgrade preconditions.
//!
//! | platform | firmware       | GPU access                               |
//! |----------|----------------|------------------------------------------|
//! | aarch64  | below 35.1     | device request: all GPUs, `gpu` capability |
//! | aarch64  | 35.1 and above | `nvidia` runtime                         |
//! | x86_64   | any            | `nvidia` runtime                         |

use super::{Architecture, HostInventory, PackageVersion, PlatformError, Result};
use crate::container::{ContainerConfigBuilder, DeviceRequest};
use crate::env;
use tracing::debug;

/// How a container gets access to the GPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuAccess {
    /// `--gpus all`: a device request for every GPU
    AllGpus,
    /// `--runtime <name>`
    Runtime(String),
}

impl GpuAccess {
    /// The device request used by [`GpuAccess::AllGpus`].
    pub fn all_gpus_request() -> DeviceRequest {
        DeviceRequest {
            count: Some(-1),
            capabilities: Some(vec![vec!["gpu".to_string()]]),
            ..Default::default()
        }
    }

    /// Apply to a container configuration.
    pub fn apply(&self, builder: ContainerConfigBuilder) -> ContainerConfigBuilder {
        match self {
            GpuAccess::AllGpus => builder.device_request(Self::all_gpus_request()),
            GpuAccess::Runtime(name) => builder.runtime(name.clone()),
        }
    }
}

fn runtime_threshold() -> PackageVersion {
    PackageVersion::new(env::host::L4T_RUNTIME_THRESHOLD.to_vec())
}

/// Whether the L4T firmware predates the `nvidia` runtime requirement.
fn firmware_is_outdated(version: &PackageVersion) -> bool {
    *version < runtime_threshold()
}

/// The host facts the GPU policy branches on, read once per operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuHost {
    /// aarch64 with its installed L4T firmware version
    Jetson(PackageVersion),
    /// x86_64 with a discrete GPU
    Discrete,
    /// Any other architecture
    Unsupported(String),
}

impl GpuHost {
    /// Read the host. Only aarch64 queries the firmware version.
    ///
    /// # Errors
    ///
    /// Propagates a failed firmware query on aarch64.
    pub async fn detect(host: &dyn HostInventory) -> Result<Self> {
        Ok(match host.architecture() {
            Architecture::Aarch64 => {
                let firmware = host.firmware_version().await?;
                debug!("L4T firmware {}", firmware);
                GpuHost::Jetson(firmware)
            }
            Architecture::X86_64 => GpuHost::Discrete,
            Architecture::Other(machine) => GpuHost::Unsupported(machine),
        })
    }

    /// How containers on this host get the GPU.
    ///
    /// # Errors
    ///
    /// [`PlatformError::UnsupportedPlatform`] outside aarch64 and x86_64.
    pub fn access(&self) -> Result<GpuAccess> {
        match self {
            GpuHost::Jetson(firmware) if firmware_is_outdated(firmware) => Ok(GpuAccess::AllGpus),
            GpuHost::Jetson(_) | GpuHost::Discrete => {
                Ok(GpuAccess::Runtime(env::host::NVIDIA_RUNTIME.to_string()))
            }
            GpuHost::Unsupported(machine) => {
                Err(PlatformError::UnsupportedPlatform(machine.clone()))
            }
        }
    }

    /// Precondition for `restart`: Jetsons need firmware 35.1 or newer.
    pub fn restart_check(&self) -> UpgradeCheck {
        match self {
            GpuHost::Jetson(firmware) if firmware_is_outdated(firmware) => UpgradeCheck::Blocked(
                "Couldn't restart the container because JetPack is outdated. Please, update JetPack or contact Edge support.".to_string(),
            ),
            _ => UpgradeCheck::Ready,
        }
    }

    /// Precondition for migrating legacy containers during `update`.
    ///
    /// Jetsons need firmware 35.1 or newer; x86_64 needs a dGPU driver with
    /// major version 515 or newer, which is queried here. An unreadable
    /// driver version blocks too.
    pub async fn update_check(&self, host: &dyn HostInventory) -> UpgradeCheck {
        match self {
            GpuHost::Jetson(firmware) if firmware_is_outdated(firmware) => UpgradeCheck::Blocked(
                "Skipping v1 containers restart because JetPack is outdated".to_string(),
            ),
            GpuHost::Discrete => match host.gpu_driver_major().await {
                Ok(major) if major < env::host::DGPU_DRIVER_THRESHOLD => UpgradeCheck::Blocked(
                    "Skipping v1 containers restart because NVIDIA dGPU driver is outdated"
                        .to_string(),
                ),
                Ok(_) => UpgradeCheck::Ready,
                Err(e) => {
                    debug!("dGPU driver query failed: {}", e);
                    UpgradeCheck::Blocked(
                        "[edge-container-update] Can't check dGPU driver version. Please make sure GPU drivers and nvidia-smi are installed".to_string(),
                    )
                }
            },
            _ => UpgradeCheck::Ready,
        }
    }
}

/// Result of an upgrade precondition check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeCheck {
    /// The host may be upgraded
    Ready,
    /// The host must not be upgraded; the message says why
    Blocked(String),
}
