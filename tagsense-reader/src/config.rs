//! Configuration management for tagsense-reader
//!
//! Bootstrap configuration comes from a TOML file; every value has a
//! built-in default so the service also starts with no file at all.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--port, --driver, ...)
//! 2. Environment variables (bound to the same arguments by clap)
//! 3. TOML configuration file (`--config` / `TAGSENSE_CONFIG` / platform dirs)
//! 4. Built-in defaults (code constants)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::reader::{BaudRate, InventoryParams, BROADCAST_ADDRESS};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "TAGSENSE_CONFIG";

/// Directory name used under the platform config directories
pub const CONFIG_APP_DIR: &str = "tagsense";

/// Endpoint notified when the threshold is reached
pub const DEFAULT_NOTIFICATION_URL: &str = "http://81.213.79.71/barfas/rfid/sayac.php?=ok";

/// Message published with NotificationSent ("enough tags have been read")
pub const DEFAULT_NOTIFICATION_MESSAGE: &str = "Yeterli Sayıda Etiket Okunmuştur";

/// Complete application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub reader: ReaderConfig,
    pub session: SessionConfig,
    pub notification: NotificationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Events buffered per subscriber before the slowest one starts lagging
    pub event_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5000,
            event_capacity: 100,
        }
    }
}

/// Which reader adapter the process uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReaderDriver {
    /// No hardware driver linked; sessions run on the fallback source
    #[default]
    Disconnected,
    /// In-process simulated reader
    Simulated,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub driver: ReaderDriver,
    /// Serial port number (1 = COM1)
    pub com_port: u8,
    pub baud_rate: BaudRate,
    /// Reader address; 0xFF opens with broadcast discovery
    pub address: u8,
    pub poll_interval_ms: u64,
    /// Upper bound of tags one simulated inventory round stages
    pub simulated_tags_per_round: usize,
    pub inventory: InventoryParams,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            driver: ReaderDriver::default(),
            com_port: 1,
            baud_rate: BaudRate::B57600,
            address: BROADCAST_ADDRESS,
            poll_interval_ms: 500,
            simulated_tags_per_round: 2,
            inventory: InventoryParams::default(),
        }
    }
}

impl ReaderConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub initial_threshold: u32,
    /// Pause between stop and start during a reset
    pub reset_pause_ms: u64,
    /// Start reading as soon as the service is up
    pub autostart: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_threshold: 10,
            reset_pause_ms: 500,
            autostart: false,
        }
    }
}

impl SessionConfig {
    pub fn reset_pause(&self) -> Duration {
        Duration::from_millis(self.reset_pause_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Empty string disables the outbound call
    pub url: String,
    pub timeout_secs: u64,
    pub message: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_NOTIFICATION_URL.to_string(),
            timeout_secs: 10,
            message: DEFAULT_NOTIFICATION_MESSAGE.to_string(),
        }
    }
}

impl NotificationConfig {
    /// Configured URL, `None` when notifications are disabled
    pub fn url(&self) -> Option<&str> {
        let url = self.url.trim();
        (!url.is_empty()).then_some(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; RUST_LOG takes precedence
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "tagsense_reader=info,tower_http=info".to_string(),
        }
    }
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub driver: Option<ReaderDriver>,
    pub threshold: Option<u32>,
    pub notify_url: Option<String>,
}

impl Config {
    /// Load configuration from the resolved TOML file (if any) and apply
    /// command-line overrides
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        let path = tagsense_common::config::resolve_config_file(
            overrides.config_path.as_deref(),
            CONFIG_ENV_VAR,
            CONFIG_APP_DIR,
        )?;

        let mut config = match path {
            Some(path) => {
                let config = Self::from_file(&path)?;
                info!("Loaded TOML configuration from {:?}", path);
                config
            }
            None => {
                info!("No configuration file found, using built-in defaults");
                Self::default()
            }
        };

        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(tagsense_common::config::load_toml(path)?)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind) = overrides.bind {
            self.server.bind = bind;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(driver) = overrides.driver {
            self.reader.driver = driver;
        }
        if let Some(threshold) = overrides.threshold {
            self.session.initial_threshold = threshold;
        }
        if let Some(url) = overrides.notify_url {
            self.notification.url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.session.initial_threshold == 0 {
            return Err(Error::Config(
                "session.initial_threshold must be greater than 0".to_string(),
            ));
        }
        if self.reader.poll_interval_ms == 0 {
            return Err(Error::Config(
                "reader.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.server.event_capacity == 0 {
            return Err(Error::Config(
                "server.event_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
