//! Settings for cfgload
//!
//! Handles loading settings from multiple sources, later sources winning:
//! - Default values
//! - Settings file (`--settings`, `$CFGLOAD_SETTINGS`, or
//!   `<config dir>/cfgload/settings.toml`)
//! - Environment variables
//! - Command-line arguments (applied by the CLI)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::connection::{ConnectOptions, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};

/// Environment variable naming the settings file
pub const SETTINGS_ENV: &str = "CFGLOAD_SETTINGS";

/// Main settings structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Connection settings
    pub connection: ConnectionSettings,

    /// Output settings
    pub output: OutputSettings,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// Connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Port used when the credentials do not name one
    pub port: u16,

    /// Connect timeout in seconds
    pub connect_timeout: u64,

    /// Host key verification policy
    pub host_key_checking: HostKeyChecking,

    /// known_hosts file (`~` is expanded)
    pub known_hosts_file: Option<String>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            host_key_checking: HostKeyChecking::default(),
            known_hosts_file: None,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Enable colored output
    pub color: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { color: true }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level when neither `-v` nor `RUST_LOG` is given
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// How unknown or changed SSH host keys are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyChecking {
    /// Accept and record unknown hosts, reject changed keys
    #[default]
    AcceptNew,
    /// Reject hosts missing from known_hosts
    Strict,
    /// Accept every key
    Off,
}

impl FromStr for HostKeyChecking {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept-new" | "accept_new" => Ok(Self::AcceptNew),
            "strict" | "yes" => Ok(Self::Strict),
            "off" | "no" => Ok(Self::Off),
            other => Err(format!(
                "invalid host key checking '{}' (expected accept-new, strict or off)",
                other
            )),
        }
    }
}

impl fmt::Display for HostKeyChecking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcceptNew => write!(f, "accept-new"),
            Self::Strict => write!(f, "strict"),
            Self::Off => write!(f, "off"),
        }
    }
}

/// `~/.ssh/known_hosts`, or a relative fallback without a home directory.
pub fn default_known_hosts_file() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".ssh").join("known_hosts"))
        .unwrap_or_else(|| PathBuf::from(".ssh/known_hosts"))
}

impl Settings {
    /// Load settings from all sources
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut settings = match Self::settings_path(explicit_path) {
            Some(path) => Self::from_file(&path)?,
            None => Settings::default(),
        };

        // Apply environment variable overrides
        settings.apply_env_overrides()?;

        Ok(settings)
    }

    /// Pick the settings file to read, if any.
    ///
    /// An explicit or environment-named file must exist; the per-user
    /// default is optional.
    fn settings_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit_path {
            return Some(path.to_path_buf());
        }

        if let Ok(env_path) = std::env::var(SETTINGS_ENV) {
            if !env_path.is_empty() {
                return Some(PathBuf::from(shellexpand::tilde(&env_path).into_owned()));
            }
        }

        dirs::config_dir()
            .map(|dir| dir.join("cfgload").join("settings.toml"))
            .filter(|path| path.exists())
    }

    /// Load from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // CFGLOAD_PORT
        if let Ok(port) = std::env::var("CFGLOAD_PORT") {
            self.connection.port = port
                .parse()
                .with_context(|| format!("Invalid CFGLOAD_PORT: {}", port))?;
        }

        // CFGLOAD_CONNECT_TIMEOUT
        if let Ok(timeout) = std::env::var("CFGLOAD_CONNECT_TIMEOUT") {
            self.connection.connect_timeout = timeout
                .parse()
                .with_context(|| format!("Invalid CFGLOAD_CONNECT_TIMEOUT: {}", timeout))?;
        }

        // CFGLOAD_HOST_KEY_CHECKING
        if let Ok(policy) = std::env::var("CFGLOAD_HOST_KEY_CHECKING") {
            self.connection.host_key_checking =
                policy.parse().map_err(anyhow::Error::msg)?;
        }

        // NO_COLOR
        if std::env::var_os("NO_COLOR").is_some() {
            self.output.color = false;
        }

        Ok(())
    }

    /// Effective known_hosts file
    pub fn known_hosts_file(&self) -> PathBuf {
        self.connection
            .known_hosts_file
            .as_deref()
            .map(|raw| PathBuf::from(shellexpand::tilde(raw).into_owned()))
            .unwrap_or_else(default_known_hosts_file)
    }

    /// Connection options handed to the connector
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            port: self.connection.port,
            timeout: Duration::from_secs(self.connection.connect_timeout),
            host_key_checking: self.connection.host_key_checking,
            known_hosts_file: self.known_hosts_file(),
        }
    }
}
