//! Host inventory backed by `dpkg-query` and `nvidia-smi`.

use super::{Architecture, HostInventory, PackageVersion, PlatformError, Result};
use crate::env;
use async_trait::async_trait;
use std::net::{IpAddr, UdpSocket};
use tokio::process::Command;
use tracing::debug;

const DPKG_QUERY: &str = "dpkg-query";
const NVIDIA_SMI: &str = "nvidia-smi";

/// Queries the real host.
#[derive(Debug, Clone)]
pub struct SystemInventory {
    architecture: Architecture,
}

impl SystemInventory {
    /// Inventory of the machine this binary runs on.
    pub fn new() -> Self {
        Self {
            architecture: Architecture::current(),
        }
    }

    /// Run a host tool and return its trimmed stdout.
    async fn run(tool: &str, args: &[&str]) -> Result<String> {
        let program =
            which::which(tool).map_err(|_| PlatformError::ToolMissing(tool.to_string()))?;

        debug!("Running host query: {} {:?}", tool, args);
        let output = Command::new(program).args(args).output().await?;

        if !output.status.success() {
            return Err(PlatformError::ToolFailed {
                tool: tool.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for SystemInventory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostInventory for SystemInventory {
    fn architecture(&self) -> Architecture {
        self.architecture.clone()
    }

    async fn firmware_version(&self) -> Result<PackageVersion> {
        let raw = Self::run(DPKG_QUERY, &["-W", "-f=${Version}", env::host::L4T_PACKAGE]).await?;
        let version = raw.parse()?;
        debug!("{} version: {}", env::host::L4T_PACKAGE, version);
        Ok(version)
    }

    async fn gpu_driver_major(&self) -> Result<u32> {
        let raw = Self::run(
            NVIDIA_SMI,
            &["--query-gpu=driver_version", "--format=csv,noheader"],
        )
        .await?;
        let major = parse_driver_major(&raw)?;
        debug!("NVIDIA driver major version: {}", major);
        Ok(major)
    }
}

/// Major version from `nvidia-smi` output; one line per GPU, first one wins.
pub(crate) fn parse_driver_major(output: &str) -> Result<u32> {
    let line = output.lines().next().unwrap_or_default().trim();
    line.split('.')
        .next()
        .and_then(|major| major.trim().parse().ok())
        .ok_or_else(|| PlatformError::InvalidVersion(line.to_string()))
}

/// The address this host uses for outbound traffic, printed as the web UI
/// address after install.
///
/// Connecting a UDP socket only selects a route; nothing is sent. `None`
/// without a default route.
pub fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}
