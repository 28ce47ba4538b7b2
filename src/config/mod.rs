//! Configuration module for sensorlog-rs
//!
//! This module handles the run configuration: channel periods, queue sizes,
//! run duration, sensor addresses and where logs and reports go. Every value
//! that was a compile-time constant on the hardware build lives here instead,
//! so the supervisor receives one explicit [`LoggerConfig`] at construction.
//!
//! # Config Location
//!
//! When no path is given on the command line, the config file is looked up in
//! the platform-appropriate config directory under `sensorlog-rs`:
//!
//! - **Linux**: `~/.config/sensorlog-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/sensorlog-rs/config.toml`
//! - **Windows**: `%APPDATA%\sensorlog-rs\config.toml`
//!
//! # Example
//!
//! ```toml
//! mode = "concurrent"
//! run_duration_ms = 20000
//!
//! [environmental]
//! period_ms = 300
//! queue_capacity = 10
//! log_path = "/bmp280.txt"
//! i2c_address = 0x76
//!
//! [storage]
//! root = "data"
//! ```

pub mod overrides;
pub mod profile;

pub use overrides::ConfigOverrides;
pub use profile::*;

use crate::error::{Result, SensorLogError};
use crate::types::ChannelId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config directories
pub const APP_ID: &str = "sensorlog-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default queue capacity per channel
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Default pause between consumer iterations in milliseconds
pub const DEFAULT_CONSUMER_POLL_MS: u64 = 10;

/// Default timer check interval of the cooperative loop in milliseconds
pub const DEFAULT_SCHEDULER_TICK_MS: u64 = 1;

/// Default run clock check interval in milliseconds
pub const DEFAULT_SUPERVISOR_POLL_MS: u64 = 10;

/// Default reference sea-level pressure in hPa
pub const DEFAULT_SEA_LEVEL_HPA: f64 = 1016.0;

/// Bus address of the MPU6050 inertial sensor
pub const MPU6050_ADDRESS: u8 = 0x68;

/// Bus address of the BMP280 environmental sensor
pub const BMP280_ADDRESS: u8 = 0x76;

/// Default logical path of the environmental log
pub const ENVIRONMENTAL_LOG_PATH: &str = "/bmp280.txt";

/// Default logical path of the inertial log
pub const INERTIAL_LOG_PATH: &str = "/mpu6050.txt";

// ==================== Config Directory ====================

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

// ==================== Channel Config ====================

/// Settings for one sensor-to-log pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Sampling period in milliseconds
    pub period_ms: u64,

    /// Capacity of the producer-to-consumer queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Logical path of the channel's log file
    pub log_path: String,

    /// Bus address of the channel's sensor
    pub i2c_address: u8,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl ChannelConfig {
    /// Defaults for a channel under the given profile
    pub fn for_channel(channel: ChannelId, profile: RunProfile) -> Self {
        match channel {
            ChannelId::Environmental => Self {
                period_ms: profile.environmental_period_ms(),
                queue_capacity: DEFAULT_QUEUE_CAPACITY,
                log_path: ENVIRONMENTAL_LOG_PATH.to_string(),
                i2c_address: BMP280_ADDRESS,
            },
            ChannelId::Inertial => Self {
                period_ms: profile.inertial_period_ms(),
                queue_capacity: DEFAULT_QUEUE_CAPACITY,
                log_path: INERTIAL_LOG_PATH.to_string(),
                i2c_address: MPU6050_ADDRESS,
            },
        }
    }

    /// Sampling period as a Duration
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

// ==================== Storage Config ====================

/// Where log files are kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory that logical log paths are resolved against
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
        }
    }
}

// ==================== Output Config ====================

/// Where the end-of-run report goes besides the console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Copy every console line into this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<PathBuf>,

    /// Write the run summary as JSON to this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_json: Option<PathBuf>,
}

// ==================== Logging Config ====================

/// Diagnostic logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,

    /// Also write diagnostics to daily-rolling files in this directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,sensorlog_rs=debug".to_string(),
            directory: None,
        }
    }
}

// ==================== Simulation Config ====================

/// Settings for the simulated sensors used on hosts without hardware
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed for the noise generator
    pub seed: u64,

    /// Relative noise amplitude, 0.0 disables noise
    pub noise: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            noise: 0.01,
        }
    }
}

// ==================== Logger Config ====================

/// Complete run configuration
///
/// Missing fields fall back to the [`RunProfile::Fast`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Scheduling strategy
    pub mode: SchedulingMode,

    /// Total run duration in milliseconds
    pub run_duration_ms: u64,

    /// Pause after each consumer iteration in milliseconds
    pub consumer_poll_interval_ms: u64,

    /// Timer check interval of the cooperative loop in milliseconds
    pub scheduler_tick_ms: u64,

    /// How often the supervisor checks the run clock in milliseconds
    pub supervisor_poll_ms: u64,

    /// When consumers take the storage lock
    pub lock_ordering: LockOrdering,

    /// Reference sea-level pressure for altitude, hPa
    pub sea_level_hpa: f64,

    /// Barometer pipeline
    pub environmental: ChannelConfig,

    /// IMU pipeline
    pub inertial: ChannelConfig,

    pub storage: StorageConfig,

    pub output: OutputConfig,

    pub logging: LoggingConfig,

    pub simulation: SimulationConfig,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::from_profile(RunProfile::default())
    }
}

impl LoggerConfig {
    /// Build the configuration for a reference profile
    pub fn from_profile(profile: RunProfile) -> Self {
        Self {
            mode: profile.mode(),
            run_duration_ms: profile.run_duration_ms(),
            consumer_poll_interval_ms: DEFAULT_CONSUMER_POLL_MS,
            scheduler_tick_ms: DEFAULT_SCHEDULER_TICK_MS,
            supervisor_poll_ms: DEFAULT_SUPERVISOR_POLL_MS,
            lock_ordering: LockOrdering::default(),
            sea_level_hpa: DEFAULT_SEA_LEVEL_HPA,
            environmental: ChannelConfig::for_channel(ChannelId::Environmental, profile),
            inertial: ChannelConfig::for_channel(ChannelId::Inertial, profile),
            storage: StorageConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }

    /// Overwrite mode, periods and duration with a profile's values
    pub fn apply_profile(&mut self, profile: RunProfile) {
        self.mode = profile.mode();
        self.run_duration_ms = profile.run_duration_ms();
        self.environmental.period_ms = profile.environmental_period_ms();
        self.inertial.period_ms = profile.inertial_period_ms();
    }

    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SensorLogError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            SensorLogError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save the config to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SensorLogError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| {
            SensorLogError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Check that the configuration describes a runnable system
    pub fn validate(&self) -> Result<()> {
        for channel in ChannelId::ALL {
            let cfg = self.channel(channel);
            if cfg.period_ms == 0 {
                return Err(SensorLogError::Config(format!(
                    "{} period must be positive",
                    channel
                )));
            }
            if cfg.queue_capacity == 0 {
                return Err(SensorLogError::Config(format!(
                    "{} queue capacity must be at least 1",
                    channel
                )));
            }
            if cfg.log_path.trim_matches('/').is_empty() {
                return Err(SensorLogError::Config(format!(
                    "{} log path is empty",
                    channel
                )));
            }
        }

        if self.environmental.log_path == self.inertial.log_path {
            return Err(SensorLogError::Config(
                "both channels log to the same file".to_string(),
            ));
        }

        if !(self.sea_level_hpa.is_finite() && self.sea_level_hpa > 0.0) {
            return Err(SensorLogError::Config(
                "sea-level pressure must be positive".to_string(),
            ));
        }

        if self.mode == SchedulingMode::Cooperative && self.scheduler_tick_ms == 0 {
            return Err(SensorLogError::Config(
                "scheduler tick must be positive in cooperative mode".to_string(),
            ));
        }

        Ok(())
    }

    /// Settings of one channel
    pub fn channel(&self, channel: ChannelId) -> &ChannelConfig {
        match channel {
            ChannelId::Environmental => &self.environmental,
            ChannelId::Inertial => &self.inertial,
        }
    }

    /// Mutable settings of one channel
    pub fn channel_mut(&mut self, channel: ChannelId) -> &mut ChannelConfig {
        match channel {
            ChannelId::Environmental => &mut self.environmental,
            ChannelId::Inertial => &mut self.inertial,
        }
    }

    /// Total run duration
    pub fn run_duration(&self) -> Duration {
        Duration::from_millis(self.run_duration_ms)
    }

    /// Pause after each consumer iteration
    pub fn consumer_poll_interval(&self) -> Duration {
        Duration::from_millis(self.consumer_poll_interval_ms)
    }

    /// Cooperative loop tick
    pub fn scheduler_tick(&self) -> Duration {
        Duration::from_millis(self.scheduler_tick_ms)
    }

    /// Supervisor clock check interval
    pub fn supervisor_poll(&self) -> Duration {
        Duration::from_millis(self.supervisor_poll_ms.max(1))
    }
}

// ==================== Tests ====================
