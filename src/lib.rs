//! # SensorLog-RS: Dual-Channel Sensor Logger
//!
//! Samples a barometer (BMP280) and an IMU (MPU6050) at independent fixed
//! rates, appends every sample as one text line to a per-channel log file,
//! and after a fixed run duration prints both logs and the read/save
//! counters.
//!
//! ## Architecture
//!
//! - **Sensors**: [`sensor::SensorSource`] wraps a device's handshake and
//!   read operations; simulated and scripted sources run without hardware
//! - **Pipeline**: per channel, a periodic producer feeds a bounded queue
//!   drained by a persistence consumer
//! - **Storage**: one lock ([`storage::SharedStorage`]) serializes every
//!   append across both channels
//! - **Supervisor**: [`supervisor::RunSupervisor`] initializes, times,
//!   stops and reports a run, using either the concurrent or the
//!   cooperative scheduler
//! - **Communication**: crossbeam channels carry samples and the shutdown
//!   broadcast between threads
//!
//! ## Configuration
//!
//! Runs are described by [`config::LoggerConfig`], loaded from TOML. The
//! default file lives in the platform config directory under
//! `sensorlog-rs/config.toml`:
//!
//! - **Linux**: `~/.config/sensorlog-rs/`
//! - **macOS**: `~/Library/Application Support/sensorlog-rs/`
//! - **Windows**: `%APPDATA%\sensorlog-rs\`
//!
//! ## Example
//!
//! ```ignore
//! use sensorlog_rs::{
//!     config::{LoggerConfig, RunProfile},
//!     output::StdoutSink,
//!     sensor::{SimulatedBmp280, SimulatedMpu6050},
//!     storage::{FileStorage, SharedStorage},
//!     supervisor::{RunSupervisor, SensorPair},
//! };
//!
//! let config = LoggerConfig::from_profile(RunProfile::Fast);
//! let sensors = SensorPair::new(
//!     SimulatedBmp280::from_config(&config),
//!     SimulatedMpu6050::from_config(&config),
//! );
//! let storage = SharedStorage::new(FileStorage::mount(&config.storage.root)?);
//!
//! let summary = RunSupervisor::new(config, sensors, storage, StdoutSink).run()?;
//! println!("saved {} barometer lines", summary.channels[0].counters.saves);
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod sensor;
pub mod storage;
pub mod supervisor;
pub mod types;

// Re-export commonly used types
pub use config::{LoggerConfig, RunProfile, SchedulingMode};
pub use error::{Result, SensorLogError};
pub use supervisor::{RunSummary, RunSupervisor, SensorPair};
pub use types::{ChannelId, EnvironmentalSample, InertialSample, Vector3};
