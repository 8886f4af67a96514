//! Viewer configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::server::DEFAULT_PORT;
use crate::store::{CONSOLE_CAPACITY, NETWORK_CAPACITY};

/// Configuration loaded from a TOML file and/or CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Root directories scanned for session logs.
    pub roots: Vec<PathBuf>,
    /// Host address to bind to.
    pub host: String,
    /// Preferred port; successive ports are tried on conflict.
    pub port: u16,
    /// Rescan interval for roots without filesystem notifications.
    pub poll_interval_secs: u64,
    /// Console history capacity.
    pub console_capacity: usize,
    /// Network history capacity.
    pub network_capacity: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            poll_interval_secs: 2,
            console_capacity: CONSOLE_CAPACITY,
            network_capacity: NETWORK_CAPACITY,
        }
    }
}

/// Errors loading a configuration file.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ViewerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Roots scanned when none are configured: the per-user log directory
    /// and the system temp location producers fall back to.
    #[must_use]
    pub fn default_roots() -> Vec<PathBuf> {
        let mut roots = Vec::new();
        if let Some(home) = dirs::home_dir() {
            roots.push(home.join(".logscope").join("logs"));
        }
        roots.push(std::env::temp_dir().join("logscope"));
        roots
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
