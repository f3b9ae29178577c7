//! Engine configuration and TOML loading.
//!
//! One `EngineConfig` per process: hardware variant, cycle timing, the
//! optional global safety configuration and the per-group profiles.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dout_common::config::{ConfigError, EngineConfig};
//! use std::path::Path;
//!
//! # fn run() -> Result<(), ConfigError> {
//! let config = EngineConfig::load_validated(Path::new("dout.toml"))?;
//! assert!(config.cycle_time_ms >= 1);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::channel::{GroupProfiles, HardwareVariant};
use crate::consts::{
    CYCLE_TIME_MS_MAX, CYCLE_TIME_MS_MIN, DEFAULT_CYCLE_TIME_MS, DEFAULT_SPI_REFRESH_MS,
    SPI_REFRESH_MS_MAX, SPI_REFRESH_MS_MIN,
};

/// Failure to obtain a usable [`EngineConfig`].
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("config file missing")]
    FileNotFound,

    /// Unreadable file or malformed TOML.
    #[error("config parse failed: {0}")]
    ParseError(String),

    /// Well-formed but out of bounds.
    #[error("config rejected: {0}")]
    ValidationError(String),
}

/// Default log verbosity of the simulator, lowercase in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const fn as_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

/// Common configuration fields shared across applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "dout-sim-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Instance name used in log output.
    pub service_name: String,
}

impl SharedConfig {
    /// Rejects an empty `service_name`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "shared.service_name is empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: "dout".to_string(),
        }
    }
}

/// Read a TOML file into any deserializable type.
///
/// A missing file is [`ConfigError::FileNotFound`]; every other read or
/// syntax failure is [`ConfigError::ParseError`].
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;
        debug!("loaded {} bytes from {}", content.len(), path.display());

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── Engine Config ──────────────────────────────────────────────────

/// Global safety configuration supplied at process start.
///
/// Safety-relevant outputs refuse to initialise without it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSafetyConfig {
    /// Safety-relevant outputs must be initialised with a safety link.
    #[serde(default)]
    pub require_link: bool,
}

/// Top-level engine configuration.
///
/// # TOML Example
///
/// ```toml
/// variant = "extended"
/// cycle_time_ms = 1
///
/// [shared]
/// service_name = "dout-01"
///
/// [safety]
/// require_link = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub shared: SharedConfig,

    /// Populated hardware variant.
    #[serde(default)]
    pub variant: HardwareVariant,

    /// Cycle period [ms] (default: 1).
    #[serde(default = "default_cycle_time_ms")]
    pub cycle_time_ms: u32,

    /// SPI shift-register refresh period [ms] (default: 10).
    #[serde(default = "default_spi_refresh_ms")]
    pub spi_refresh_ms: u32,

    /// Global safety configuration. Absent means never supplied.
    #[serde(default)]
    pub safety: Option<GlobalSafetyConfig>,

    /// Per-group hardware profiles.
    #[serde(default)]
    pub groups: GroupProfiles,
}

fn default_cycle_time_ms() -> u32 {
    DEFAULT_CYCLE_TIME_MS
}
fn default_spi_refresh_ms() -> u32 {
    DEFAULT_SPI_REFRESH_MS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            variant: HardwareVariant::default(),
            cycle_time_ms: DEFAULT_CYCLE_TIME_MS,
            spi_refresh_ms: DEFAULT_SPI_REFRESH_MS,
            safety: None,
            groups: GroupProfiles::default(),
        }
    }
}

impl EngineConfig {
    /// Parse from a TOML string without validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load from file and validate.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.cycle_time_ms < CYCLE_TIME_MS_MIN || self.cycle_time_ms > CYCLE_TIME_MS_MAX {
            return Err(ConfigError::ValidationError(format!(
                "cycle_time_ms {} out of range [{}, {}]",
                self.cycle_time_ms, CYCLE_TIME_MS_MIN, CYCLE_TIME_MS_MAX
            )));
        }
        if self.spi_refresh_ms < SPI_REFRESH_MS_MIN || self.spi_refresh_ms > SPI_REFRESH_MS_MAX {
            return Err(ConfigError::ValidationError(format!(
                "spi_refresh_ms {} out of range [{}, {}]",
                self.spi_refresh_ms, SPI_REFRESH_MS_MIN, SPI_REFRESH_MS_MAX
            )));
        }
        if self.spi_refresh_ms < self.cycle_time_ms {
            return Err(ConfigError::ValidationError(format!(
                "spi_refresh_ms {} shorter than cycle_time_ms {}",
                self.spi_refresh_ms, self.cycle_time_ms
            )));
        }
        self.groups.validate().map_err(ConfigError::ValidationError)?;
        Ok(())
    }

    #[inline]
    pub const fn cycle_time(&self) -> Duration {
        Duration::from_millis(self.cycle_time_ms as u64)
    }

    #[inline]
    pub const fn spi_refresh(&self) -> Duration {
        Duration::from_millis(self.spi_refresh_ms as u64)
    }
}
