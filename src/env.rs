//! Environment constants for the edge container manager.
//!
//! This module centralizes the label keys, container names, image references,
//! host paths and environment variable names used throughout the application,
//! making them easier to maintain and modify.

use std::path::{Path, PathBuf};

/// Container version written by this release.
///
/// Version history:
/// 1. Initial version
/// 2. GPU access chosen per platform (named runtime vs device request)
pub const EDGE_CONTAINER_VERSION: &str = "2";

/// Container version that `update` migrates away from.
pub const LEGACY_CONTAINER_VERSION: &str = "1";

/// Default name of the gateway container (and its volume).
pub const EDGE_NAME_PREFIX: &str = "edge-gateway-container";

/// Image used on aarch64 hosts when `EDGE_IMAGE` is not set.
pub const DEFAULT_AARCH64_IMAGE: &str = "seeedcloud/edge-gateway:latest";

/// Container-side mount point of the gateway state volume.
pub const EDGE_STATE_DIR: &str = "/var/lib/edge";

/// Port served by the gateway web UI.
pub const EDGE_WEB_PORT: u16 = 46654;

/// Label keys attached to managed containers
pub mod labels {
    /// Classification key: a container is managed iff it carries this key
    pub const GATEWAY_ID: &str = "edge.gateway_id";

    /// Image reference the container was created from
    pub const CONTAINER_TYPE: &str = "edge.container_type";

    /// Upgrade marker, only advanced by restart
    pub const CONTAINER_VERSION: &str = "edge.container_version";

    /// Opt-in label read by the watcher
    pub const WATCHTOWER_ENABLE: &str = "com.centurylinklabs.watchtower.enable";
}

/// Companion auto-update watcher
pub mod watchtower {
    /// Singleton container name
    pub const CONTAINER_NAME: &str = "edge-watchtower";

    /// Watcher image
    pub const IMAGE: &str = "containrrr/watchtower:1.4.0";

    /// Value of the `edge.container_type` label on the watcher
    pub const CONTAINER_TYPE: &str = "containrrr/watchtower";

    /// Value of the `edge.container_version` label on the watcher
    pub const VERSION: &str = "1";

    /// Bearer token accepted by the watcher HTTP API
    pub const API_TOKEN: &str = "edge-container-update-watchtower-token";

    /// Host port the watcher HTTP API is published on
    pub const HOST_PORT: u16 = 46655;

    /// Container port of the watcher HTTP API
    pub const CONTAINER_PORT: &str = "8080/tcp";

    /// Update trigger endpoint
    pub const UPDATE_URL: &str = "http://localhost:46655/v1/update";

    /// Seconds between watcher polls
    pub const POLL_INTERVAL_SECS: u32 = 300;
}

/// Host firmware and driver inventory
pub mod host {
    /// Debian package carrying the Jetson L4T firmware version
    pub const L4T_PACKAGE: &str = "nvidia-l4t-core";

    /// First L4T release (JetPack 5.0) that requires the `nvidia` runtime
    pub const L4T_RUNTIME_THRESHOLD: [u64; 2] = [35, 1];

    /// Minimum NVIDIA dGPU driver major version for x86_64 upgrades
    pub const DGPU_DRIVER_THRESHOLD: u32 = 515;

    /// Name of the GPU container runtime
    pub const NVIDIA_RUNTIME: &str = "nvidia";
}

/// Environment variables read at startup
pub mod vars {
    pub const EDGE_IMAGE: &str = "EDGE_IMAGE";
    pub const EDGE_APP_ID: &str = "EDGE_APP_ID";
    pub const EDGE_API_KEY: &str = "EDGE_API_KEY";
    pub const EDGE_ENVIRONMENT: &str = "EDGE_ENVIRONMENT";
    pub const EDGE_GATEWAY_NAME: &str = "EDGE_GATEWAY_NAME";
    pub const OUTPUT_FORMAT: &str = "OUTPUT_FORMAT";
    pub const NO_PROMPT: &str = "NO_PROMPT";
    pub const NO_PROVISION: &str = "NO_PROVISION";
    pub const WEBSITE_ENV: &str = "WEBSITE_ENV";
}

/// Configuration directory name (hidden directory like .git, .vscode)
pub const CONFIG_DIR_NAME: &str = ".edgectl";

/// Configuration file name inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration file name in the current directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "edgectl.toml";

/// System-wide configuration file
pub const SYSTEM_CONFIG_FILE: &str = "/etc/edgectl/config.toml";

/// Bind string mounting the gateway volume at [`EDGE_STATE_DIR`]
pub fn state_volume_bind(container_name: &str) -> String {
    format!("{}:{}", container_name, EDGE_STATE_DIR)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    home_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
}

/// Build local config file path in current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    current_dir.join(LOCAL_CONFIG_FILE_NAME)
}
