use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Package id of the host application
pub const DEFAULT_HOST_PACKAGE: &str = "com.example.flow_app";

/// Get the local data directory for flow.
///
/// # Errors
///
/// Returns an error if the local data directory cannot be determined.
pub fn get_data_dir() -> Result<PathBuf> {
    let mut path =
        dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("Failed to get local data dir"))?;
    path.push("flow");
    Ok(path)
}

/// Get the default config file path (`<config_dir>/flow/config.toml`).
///
/// # Errors
///
/// Returns an error if the config directory cannot be determined.
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Failed to get config dir"))?;
    path.push("flow");
    path.push("config.toml");
    Ok(path)
}

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Package id of the host app; its own windows are never blocked
    pub host_package: String,
    /// Delay between presenting the overlay and sending the user home
    pub home_redirect_delay_ms: u64,
    /// Settling delay before a buffered notification action is flushed
    pub action_settle_delay_ms: u64,
    /// Per-package overlay suppression window; 0 re-triggers on every event
    pub overlay_cooldown_ms: u64,
    /// Whether the desktop host grants Do-Not-Disturb access
    pub dnd_access_granted: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            host_package: String::from(DEFAULT_HOST_PACKAGE),
            home_redirect_delay_ms: 100,
            action_settle_delay_ms: 1500,
            overlay_cooldown_ms: 0,
            dnd_access_granted: true,
        }
    }
}

impl FlowConfig {
    /// Load configuration from a TOML file, falling back to defaults when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration from the default location
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory is unknown or the file is malformed
    pub fn load_default() -> Result<Self> {
        Self::load(&default_config_path()?)
    }

    #[must_use]
    pub const fn home_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.home_redirect_delay_ms)
    }

    #[must_use]
    pub const fn action_settle_delay(&self) -> Duration {
        Duration::from_millis(self.action_settle_delay_ms)
    }

    #[must_use]
    pub const fn overlay_cooldown(&self) -> Duration {
        Duration::from_millis(self.overlay_cooldown_ms)
    }
}
