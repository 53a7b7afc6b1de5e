//! # Configuration Management
//!
//! Immutable startup configuration for the relay and the capture tap.
//!
//! A [`ProxyConfig`] is built once when the process starts and then handed by
//! reference to the relay and the tap. Nothing reads configuration from globals
//! and nothing changes it at runtime.
//!
//! ## Configuration Sources
//! Later sources override earlier ones:
//! 1. Built-in defaults (`tcp://127.0.0.1:6000` in, `tcp://127.0.0.1:7000` out, CSP v2)
//! 2. TOML files via [`ProxyConfig::from_file`]
//! 3. Environment variables via [`ProxyConfig::apply_env`]
//! 4. Command-line flags (see `main.rs`)

use crate::error::{ProxyError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{warn, Level};

/// Default ingress (producer-facing, subscribe side) endpoint
pub const DEFAULT_INGRESS: &str = "tcp://127.0.0.1:6000";

/// Default egress (consumer-facing, publish side) endpoint
pub const DEFAULT_EGRESS: &str = "tcp://127.0.0.1:7000";

/// CSP header version used when none is given
pub const DEFAULT_CSP_VERSION: u8 = 2;

/// Frames shorter than this cannot carry a CSP header and are never decoded
pub const MIN_FRAME_LEN: usize = 5;

/// Largest frame the tap accepts by default (matches the 1024 byte packet buffer of CSP hosts)
pub const MAX_FRAME_SIZE: usize = 1024;

/// Upper bound for `max_frame_size`: CSP lengths are 16 bit
const FRAME_SIZE_CEILING: usize = u16::MAX as usize;

/// Environment variable names understood by [`ProxyConfig::apply_env`]
pub const ENV_INGRESS: &str = "ZMQPROXY_INGRESS";
pub const ENV_EGRESS: &str = "ZMQPROXY_EGRESS";
pub const ENV_CSP_VERSION: &str = "ZMQPROXY_CSP_VERSION";
pub const ENV_LOG_FILE: &str = "ZMQPROXY_LOG_FILE";
pub const ENV_DEBUG: &str = "ZMQPROXY_DEBUG";

/// Top-level configuration for a proxy process
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct ProxyConfig {
    /// Bus endpoints served by the relay
    #[serde(default)]
    pub bus: BusConfig,

    /// Capture tap settings
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Diagnostic logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProxyConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProxyError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProxyError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProxyError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Defaults overridden by the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `ZMQPROXY_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ingress) = lookup(ENV_INGRESS) {
            self.bus.ingress = ingress;
        }

        if let Some(egress) = lookup(ENV_EGRESS) {
            self.bus.egress = egress;
        }

        if let Some(version) = lookup(ENV_CSP_VERSION) {
            match version.parse::<u8>() {
                Ok(val) => self.capture.version = val,
                Err(_) => warn!(var = ENV_CSP_VERSION, value = %version, "Ignoring invalid value"),
            }
        }

        if let Some(path) = lookup(ENV_LOG_FILE) {
            if !path.is_empty() {
                self.capture.log_file = Some(PathBuf::from(path));
            }
        }

        if let Some(flag) = lookup(ENV_DEBUG) {
            match flag.as_str() {
                "1" | "true" | "yes" | "on" => self.capture.debug = true,
                "0" | "false" | "no" | "off" => self.capture.debug = false,
                _ => warn!(var = ENV_DEBUG, value = %flag, "Ignoring invalid value"),
            }
        }
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.bus.validate());
        errors.extend(self.capture.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProxyError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Relay endpoints
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BusConfig {
    /// Endpoint producers publish into (e.g., "tcp://127.0.0.1:6000")
    pub ingress: String,

    /// Endpoint consumers subscribe to (e.g., "tcp://127.0.0.1:7000")
    pub egress: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            ingress: String::from(DEFAULT_INGRESS),
            egress: String::from(DEFAULT_EGRESS),
        }
    }
}

impl BusConfig {
    /// Validate bus configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(err) = check_endpoint("Ingress", &self.ingress) {
            errors.push(err);
        }
        if let Some(err) = check_endpoint("Egress", &self.egress) {
            errors.push(err);
        }

        // Port 0 asks for an ephemeral port, so identical strings do not collide.
        let ephemeral = self.ingress.ends_with(":0");
        if !self.ingress.is_empty() && self.ingress == self.egress && !ephemeral {
            errors.push(format!(
                "Ingress and egress endpoints must differ (both are '{}')",
                self.ingress
            ));
        }

        errors
    }
}

/// Check one endpoint string; `None` means it looks usable.
fn check_endpoint(label: &str, endpoint: &str) -> Option<String> {
    if endpoint.is_empty() {
        return Some(format!("{label} endpoint cannot be empty"));
    }

    if let Some(rest) = endpoint.strip_prefix("tcp://") {
        let valid = rest
            .rsplit_once(':')
            .map(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
            .unwrap_or(false);
        if !valid {
            return Some(format!(
                "Invalid {} endpoint: '{endpoint}' (expected format: 'tcp://127.0.0.1:6000')",
                label.to_lowercase()
            ));
        }
        return None;
    }

    if let Some(path) = endpoint.strip_prefix("ipc://") {
        if path.is_empty() {
            return Some(format!("{label} ipc endpoint needs a socket path"));
        }
        return None;
    }

    Some(format!(
        "Unsupported {} endpoint transport: '{endpoint}' (use tcp:// or ipc://)",
        label.to_lowercase()
    ))
}

/// Capture tap configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// CSP header version tag used to decode frames (1 or 2)
    pub version: u8,

    /// Emit hex dumps of every decoded frame
    pub debug: bool,

    /// Append raw frames to this file when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Frames longer than this are discarded by the tap
    pub max_frame_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_CSP_VERSION,
            debug: false,
            log_file: None,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

impl CaptureConfig {
    /// Validate capture configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(1..=2).contains(&self.version) {
            errors.push(format!(
                "Unsupported CSP version: {} (valid versions: 1, 2)",
                self.version
            ));
        }

        if self.max_frame_size < MIN_FRAME_LEN {
            errors.push(format!(
                "Max frame size too small: {} (minimum: {MIN_FRAME_LEN})",
                self.max_frame_size
            ));
        } else if self.max_frame_size > FRAME_SIZE_CEILING {
            errors.push(format!(
                "Max frame size too large: {} (maximum: {FRAME_SIZE_CEILING})",
                self.max_frame_size
            ));
        }

        if let Some(ref path) = self.log_file {
            if path.as_os_str().is_empty() {
                errors.push("Log file path cannot be empty".to_string());
            } else if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    errors.push(format!(
                        "Log file directory does not exist: {}",
                        parent.display()
                    ));
                }
            }
        }

        errors
    }
}

/// Diagnostic logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
