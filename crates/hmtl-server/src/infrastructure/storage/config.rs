//! TOML configuration file for the relay server.
//!
//! Every field is optional; anything missing takes the default shown here.
//! Command-line flags override values read from the file.
//!
//! ```toml
//! [serial]
//! device = "/dev/ttyUSB0"
//! baud = 57600
//! ready_timeout_ms = 10000
//! ack_timeout_ms = 10000
//!
//! [relay]
//! address = "127.0.0.1"
//! port = 6000
//! data_wait_ms = 250
//!
//! [scanner]
//! enabled = false
//! first_address = 120
//! last_address = 150
//! scan_period_secs = 60
//! address_period_ms = 250
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::scan_devices::ScannerConfig;
use crate::infrastructure::relay::RelayServerConfig;
use crate::infrastructure::transport::SessionConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid relay address '{0}'")]
    InvalidAddress(String),

    #[error("scanner range {first}..{last} is empty")]
    EmptyScanRange { first: u16, last: u16 },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerFileConfig {
    #[serde(default)]
    pub serial: SerialSection,
    #[serde(default)]
    pub relay: RelaySection,
    #[serde(default)]
    pub scanner: ScannerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialSection {
    /// Serial device path, e.g. `/dev/ttyUSB0` or `COM3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default = "default_baud")]
    pub baud: u32,
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelaySection {
    /// IP address to listen on.
    #[serde(default = "default_relay_address")]
    pub address: String,
    #[serde(default = "default_relay_port")]
    pub port: u16,
    /// How long a data request waits for a module message.
    #[serde(default = "default_data_wait_ms")]
    pub data_wait_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScannerSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_first_address")]
    pub first_address: u16,
    /// Exclusive upper bound.
    #[serde(default = "default_last_address")]
    pub last_address: u16,
    #[serde(default = "default_scan_period_secs")]
    pub scan_period_secs: u64,
    #[serde(default = "default_address_period_ms")]
    pub address_period_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_baud() -> u32 {
    57_600
}
fn default_ready_timeout_ms() -> u64 {
    10_000
}
fn default_ack_timeout_ms() -> u64 {
    10_000
}
fn default_relay_address() -> String {
    "127.0.0.1".to_string()
}
fn default_relay_port() -> u16 {
    crate::infrastructure::relay::DEFAULT_RELAY_PORT
}
fn default_data_wait_ms() -> u64 {
    250
}
fn default_first_address() -> u16 {
    120
}
fn default_last_address() -> u16 {
    150
}
fn default_scan_period_secs() -> u64 {
    60
}
fn default_address_period_ms() -> u64 {
    250
}

impl Default for SerialSection {
    fn default() -> Self {
        Self {
            device: None,
            baud: default_baud(),
            ready_timeout_ms: default_ready_timeout_ms(),
            ack_timeout_ms: default_ack_timeout_ms(),
        }
    }
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            address: default_relay_address(),
            port: default_relay_port(),
            data_wait_ms: default_data_wait_ms(),
        }
    }
}

impl Default for ScannerSection {
    fn default() -> Self {
        Self {
            enabled: false,
            first_address: default_first_address(),
            last_address: default_last_address(),
            scan_period_secs: default_scan_period_secs(),
            address_period_ms: default_address_period_ms(),
        }
    }
}

// ── Conversions into runtime configuration ────────────────────────────────────

impl ServerFileConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            ready_timeout: Duration::from_millis(self.serial.ready_timeout_ms),
            ack_timeout: Duration::from_millis(self.serial.ack_timeout_ms),
            data_wait: Duration::from_millis(self.relay.data_wait_ms),
            ..SessionConfig::default()
        }
    }

    /// # Errors
    ///
    /// [`ConfigError::InvalidAddress`] if `relay.address` is not an IP address.
    pub fn relay_config(&self) -> Result<RelayServerConfig, ConfigError> {
        let ip: IpAddr = self
            .relay
            .address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.relay.address.clone()))?;
        Ok(RelayServerConfig {
            bind_addr: SocketAddr::new(ip, self.relay.port),
            data_wait: Duration::from_millis(self.relay.data_wait_ms),
            ack_timeout: Duration::from_millis(self.serial.ack_timeout_ms),
        })
    }

    /// # Errors
    ///
    /// [`ConfigError::EmptyScanRange`] if the address range holds no addresses.
    pub fn scanner_config(&self) -> Result<ScannerConfig, ConfigError> {
        let s = &self.scanner;
        if s.first_address >= s.last_address {
            return Err(ConfigError::EmptyScanRange {
                first: s.first_address,
                last: s.last_address,
            });
        }
        Ok(ScannerConfig {
            scan_period: Duration::from_secs(s.scan_period_secs),
            address_period: Duration::from_millis(s.address_period_ms),
            addresses: s.first_address..s.last_address,
            data_wait: Duration::from_millis(self.relay.data_wait_ms),
            ack_timeout: Duration::from_millis(self.serial.ack_timeout_ms),
        })
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads the configuration at `path`, returning defaults if the file does not
/// exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<ServerFileConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ServerFileConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &ServerFileConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
