//! Host platform inventory and the GPU access policy.
//!
//! The lifecycle controller branches on three host facts: the CPU
//! architecture, the installed Jetson L4T firmware version (aarch64) and the
//! NVIDIA dGPU driver major version (x86_64). [`HostInventory`] is the seam
//! through which they are read; [`SystemInventory`] queries the real host.

mod gpu;
mod inventory;
mod version;

pub use gpu::{GpuAccess, GpuHost, UpgradeCheck};
pub use inventory::{SystemInventory, local_ip};
pub use version::PackageVersion;

use async_trait::async_trait;
use std::fmt;

/// CPU architecture of the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Architecture {
    /// Jetson boards
    Aarch64,
    /// dGPU workstations and servers
    X86_64,
    /// Anything else; no GPU policy exists for it
    Other(String),
}

impl Architecture {
    /// Architecture of the running binary.
    pub fn current() -> Self {
        Self::from_machine(std::env::consts::ARCH)
    }

    /// Parse a `uname -m` style machine name.
    pub fn from_machine(machine: &str) -> Self {
        match machine {
            "aarch64" | "arm64" => Architecture::Aarch64,
            "x86_64" | "amd64" => Architecture::X86_64,
            other => Architecture::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::Aarch64 => write!(f, "aarch64"),
            Architecture::X86_64 => write!(f, "x86_64"),
            Architecture::Other(machine) => write!(f, "{}", machine),
        }
    }
}

/// Host inventory errors.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// No GPU policy for this architecture
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// A host utility is not installed
    #[error("Required tool not found: {0}")]
    ToolMissing(String),

    /// A host utility ran but failed
    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// A version string could not be parsed
    #[error("Invalid version string: '{0}'")]
    InvalidVersion(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for platform queries.
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Read-only queries against the host.
#[async_trait]
pub trait HostInventory: Send + Sync {
    /// CPU architecture.
    fn architecture(&self) -> Architecture;

    /// Installed L4T firmware version (`nvidia-l4t-core` package).
    async fn firmware_version(&self) -> Result<PackageVersion>;

    /// Major version of the installed NVIDIA dGPU driver.
    async fn gpu_driver_major(&self) -> Result<u32>;
}
