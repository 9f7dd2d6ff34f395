//! Configuration discovery and loading
//!
//! [`ManagerConfig`] is built once at startup and passed by reference to every
//! operation. Values are layered:
//! 1. Built-in defaults
//! 2. A TOML file: `--config PATH`, else the first of ./edgectl.toml,
//!    ~/.edgectl/config.toml, /etc/edgectl/config.toml
//! 3. Environment variables (`EDGE_IMAGE`, `EDGE_APP_ID`, ...)

use crate::env;
use crate::platform::Architecture;
use serde::{Deserialize, Serialize};
use std::env as std_env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for [`FileConfig`]
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// No image configured and no default exists for this architecture
    #[error("Unsupported platform: {0} (set EDGE_IMAGE to choose an image)")]
    UnsupportedPlatform(String),

    /// A variable holds a value outside its domain
    #[error("Invalid value '{value}' for {name}")]
    InvalidValue { name: String, value: String },
}

/// Rendering mode for command output.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Title plus a box-drawn grid
    #[default]
    Table,
    /// One JSON envelope per report
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Values accepted in a configuration file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub image: Option<String>,
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub environment: Option<String>,
    pub gateway_name: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub no_prompt: Option<bool>,
    pub no_provision: Option<bool>,
    pub website: Option<bool>,
    pub watchtower_url: Option<String>,
    pub watchtower_token: Option<String>,
}

impl FileConfig {
    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolved configuration for one invocation.
#[derive(Clone, PartialEq)]
pub struct ManagerConfig {
    /// Gateway image reference
    pub image: String,
    /// Application to auto-provision into
    pub app_id: Option<String>,
    /// API key used for auto-provisioning
    pub api_key: Option<String>,
    /// Deployment environment tag passed to the gateway
    pub environment: Option<String>,
    /// Container (and volume) name override
    pub gateway_name: Option<String>,
    /// Output format override; `None` lets the mode decide
    pub output_format: Option<OutputFormat>,
    /// Never prompt for a container; a missing target is an error
    pub no_prompt: bool,
    /// On first boot, only pull the image instead of installing
    pub no_provision: bool,
    /// Print the web UI address after install
    pub website: bool,
    /// Watcher update endpoint
    pub watchtower_url: String,
    /// Watcher API token
    pub watchtower_token: String,
}

impl fmt::Debug for ManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerConfig")
            .field("image", &self.image)
            .field("app_id", &self.app_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("environment", &self.environment)
            .field("gateway_name", &self.gateway_name)
            .field("output_format", &self.output_format)
            .field("no_prompt", &self.no_prompt)
            .field("no_provision", &self.no_provision)
            .field("website", &self.website)
            .field("watchtower_url", &self.watchtower_url)
            .finish_non_exhaustive()
    }
}

/// Interpret a flag variable: set unless empty, `0`, `false` or `no`.
pub fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "" | "0" | "false" | "no"
    )
}

/// Treat empty strings as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ManagerConfig {
    /// Configuration with built-in defaults for the given image.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            app_id: None,
            api_key: None,
            environment: None,
            gateway_name: None,
            output_format: None,
            no_prompt: false,
            no_provision: false,
            website: false,
            watchtower_url: env::watchtower::UPDATE_URL.to_string(),
            watchtower_token: env::watchtower::API_TOKEN.to_string(),
        }
    }

    /// Discover, load and resolve configuration for this process.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration file is unreadable or invalid, or if
    /// no image can be chosen for this platform.
    pub fn load(explicit_file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit_file {
            Some(path) => {
                info!("Loading configuration from: {:?}", path);
                FileConfig::from_toml_file(path)?
            }
            None => ConfigDiscovery::discover_config()?,
        };

        Self::resolve(
            file,
            |name| std_env::var(name).ok(),
            &Architecture::current(),
        )
    }

    /// Layer environment variables over file values.
    ///
    /// `lookup` returns the value of an environment variable.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedPlatform`] when no image is configured on a
    /// platform without a default image; [`ConfigError::InvalidValue`] for an
    /// unknown `OUTPUT_FORMAT`.
    pub fn resolve<F>(file: FileConfig, lookup: F, arch: &Architecture) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| non_empty(lookup(name));
        let flag = |name: &str, file_value: Option<bool>| match lookup(name) {
            Some(value) => parse_flag(&value),
            None => file_value.unwrap_or(false),
        };

        let image = match var(env::vars::EDGE_IMAGE).or(non_empty(file.image)) {
            Some(image) => image,
            None if *arch == Architecture::Aarch64 => env::DEFAULT_AARCH64_IMAGE.to_string(),
            None => return Err(ConfigError::UnsupportedPlatform(arch.to_string())),
        };

        let output_format = match var(env::vars::OUTPUT_FORMAT) {
            Some(value) => Some(value.parse().map_err(|_| ConfigError::InvalidValue {
                name: env::vars::OUTPUT_FORMAT.to_string(),
                value,
            })?),
            None => file.output_format,
        };

        let defaults = Self::new(image);
        let config = Self {
            app_id: var(env::vars::EDGE_APP_ID).or(non_empty(file.app_id)),
            api_key: var(env::vars::EDGE_API_KEY).or(non_empty(file.api_key)),
            environment: var(env::vars::EDGE_ENVIRONMENT).or(non_empty(file.environment)),
            gateway_name: var(env::vars::EDGE_GATEWAY_NAME).or(non_empty(file.gateway_name)),
            output_format,
            no_prompt: flag(env::vars::NO_PROMPT, file.no_prompt),
            no_provision: flag(env::vars::NO_PROVISION, file.no_provision),
            website: flag(env::vars::WEBSITE_ENV, file.website),
            watchtower_url: non_empty(file.watchtower_url).unwrap_or(defaults.watchtower_url.clone()),
            watchtower_token: non_empty(file.watchtower_token)
                .unwrap_or(defaults.watchtower_token.clone()),
            ..defaults
        };

        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    /// Name of the gateway container and its volume.
    pub fn container_name(&self) -> &str {
        self.gateway_name
            .as_deref()
            .unwrap_or(env::EDGE_NAME_PREFIX)
    }

    /// Provisioning credentials, if both app id and API key are present.
    pub fn provisioning(&self) -> Option<(&str, &str)> {
        match (self.app_id.as_deref(), self.api_key.as_deref()) {
            (Some(app_id), Some(api_key)) => Some((app_id, api_key)),
            _ => None,
        }
    }

    /// Output format, falling back to the mode's default.
    pub fn output_format_or(&self, mode_default: OutputFormat) -> OutputFormat {
        self.output_format.unwrap_or(mode_default)
    }
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Discover and load configuration using the hierarchy
    pub fn discover_config() -> Result<FileConfig, ConfigError> {
        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return FileConfig::from_toml_file(config_path);
        }

        debug!("No configuration file found, using defaults");
        Ok(FileConfig::default())
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        Self::get_config_candidates().into_iter().find(|candidate| {
            debug!("Checking for config file: {:?}", candidate);
            candidate.is_file()
        })
    }

    /// Get list of configuration file candidates in priority order
    fn get_config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        // 1. Current directory: ./edgectl.toml
        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(env::local_config_file_path(&current_dir));
        }

        // 2. User config: ~/.edgectl/config.toml
        if let Some(home_dir) = std_env::var_os("HOME").map(PathBuf::from) {
            candidates.push(env::user_config_file_path(&home_dir));
        }

        // 3. System config
        candidates.push(PathBuf::from(env::SYSTEM_CONFIG_FILE));

        candidates
    }
}
