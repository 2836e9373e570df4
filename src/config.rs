//! Configuration loaded from `config.toml`.
//!
//! # Configuration file format
//!
//! Looked up at `<config dir>/waktu/config.toml` (e.g.
//! `~/.config/waktu/config.toml` on Linux) unless `--config` is given.
//!
//! ```toml
//! # Zone descriptor, `CODE - Area, Area`. Required.
//! zone = "JHR04 - Batu Pahat, Muar, Segamat, Gemas Johor, Tangkak"
//!
//! # Minutes before each prayer to send the early reminder. Required.
//! timer = 10
//!
//! # Schedule provider (optional).
//! [provider]
//! base_url     = "https://api.waktusolat.app/v2/solat"
//! timeout_secs = 15
//!
//! # Desktop notifications (optional, default: on).
//! [notifications]
//! desktop = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::zone::{Zone, ZoneDescriptor};

/// Raw file contents. `zone` and `timer` are optional here so a missing
/// one is reported as [`ConfigError::Incomplete`] rather than a TOML error.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    zone: Option<String>,

    #[serde(default)]
    timer: Option<u32>,

    #[serde(default)]
    provider: ProviderConfig,

    #[serde(default)]
    notifications: NotificationConfig,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Zone resolved from the descriptor.
    pub zone: Zone,
    /// Pre-event reminder lead time, in minutes. Always non-zero.
    pub timer: u32,
    /// Schedule provider settings.
    pub provider: ProviderConfig,
    /// Notification settings.
    pub notifications: NotificationConfig,
}

/// Schedule provider settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Base URL; the zone code is appended as the last path segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Notification settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
    /// Raise desktop notifications in addition to terminal output.
    #[serde(default = "default_desktop")]
    pub desktop: bool,
}

fn default_base_url() -> String {
    "https://api.waktusolat.app/v2/solat".into()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_desktop() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            desktop: default_desktop(),
        }
    }
}

/// Default config path, `<config dir>/waktu/config.toml`.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("waktu")
        .join("config.toml")
}

impl Config {
    /// Load and validate the config at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let raw: RawConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_raw(raw)
    }

    /// Parse and validate config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source: e,
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let zone = raw.zone.filter(|z| !z.trim().is_empty());
        let timer = raw.timer.filter(|&t| t > 0);
        let (Some(zone), Some(timer)) = (zone, timer) else {
            return Err(ConfigError::Incomplete);
        };

        let zone = ZoneDescriptor::parse(&zone)?.primary();

        if raw.provider.timeout_secs == 0 {
            tracing::warn!("provider.timeout_secs is 0, requests will fail immediately");
        }

        Ok(Self {
            zone,
            timer,
            provider: raw.provider,
            notifications: raw.notifications,
        })
    }
}
