//! Application configuration management.
//!
//! Handles loading, saving, and validating beaconwatch configuration:
//! which adapter to drive, the deduplication grace period, and the HTTP
//! server bind address.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading, saving or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found at: {}", .0.display())]
    NotFound(PathBuf),

    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Path that failed to write.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file exists but is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The configuration parsed but contains an invalid value.
    #[error("configuration validation failed: {field}: {message}")]
    Validation {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Radio adapter selection.
    pub adapter: AdapterConfig,

    /// Scan engine settings.
    pub scanner: ScannerConfig,

    /// HTTP server settings.
    pub server: ServerConfig,
}

/// Radio adapter selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Adapter name (e.g. `hci0`); the system default when unset.
    pub name: Option<String>,
}

/// Scan engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Grace period in milliseconds during which a seen beacon is not
    /// re-announced. `0` disables deduplication entirely.
    pub grace_period_ms: u64,

    /// Start scanning when the server boots.
    pub autostart: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 10_000,
            autostart: false,
        }
    }
}

impl ScannerConfig {
    /// The grace period as a [`Duration`].
    #[must_use]
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the given path.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is missing, unreadable, not valid
    /// TOML, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults when the file does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns an error when an existing file is unreadable or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(&path) {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Saves configuration to the given path, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks field values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Validation {
                field: "server.bind",
                message: format!("'{}' is not a valid socket address", self.server.bind),
            });
        }
        let grace = self.scanner.grace_period_ms;
        if grace != 0 && grace < 100 {
            return Err(ConfigError::Validation {
                field: "scanner.grace_period_ms",
                message: "must be 0 (deduplication disabled) or at least 100".to_string(),
            });
        }
        Ok(())
    }

    /// The default configuration file location.
    ///
    /// `/etc/beaconwatch/config.toml` on Linux deployments, the platform
    /// configuration directory elsewhere.
    #[must_use]
    pub fn default_path() -> PathBuf {
        #[cfg(target_os = "linux")]
        {
            PathBuf::from("/etc/beaconwatch/config.toml")
        }
        #[cfg(not(target_os = "linux"))]
        {
            directories::ProjectDirs::from("", "", "beaconwatch")
                .map(|dirs| dirs.config_dir().join("config.toml"))
                .unwrap_or_else(|| PathBuf::from("beaconwatch.toml"))
        }
    }
}
