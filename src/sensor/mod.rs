//! SensorSource trait for a unified sensor interface
//!
//! This module provides a common trait for every sensor the logger samples,
//! so the pipelines can be driven by real drivers, the simulated devices in
//! [`simulated`], or a fixed replay sequence from [`scripted`].
//!
//! A source is used in two phases. [`SensorSource::begin`] performs the
//! startup handshake at the configured bus address; a failure there aborts
//! the whole run. [`SensorSource::read`] then returns one sample in physical
//! units per call. Read failures are recoverable and only skip a tick.

pub mod scripted;
pub mod simulated;

pub use scripted::ScriptedSensor;
pub use simulated::{
    SignalPattern, SimulatedBmp280, SimulatedMpu6050, SimulatedSignal,
};

use crate::error::SensorError;
use std::collections::VecDeque;
use std::time::Instant;

/// Size of the rolling window for recent read times
const RECENT_WINDOW_SIZE: usize = 100;

/// Exponent of the international barometric formula
const BAROMETRIC_EXPONENT: f64 = 0.1903;

/// Altitude in meters for a pressure in pascals, relative to a sea-level
/// reference in hectopascals
pub fn barometric_altitude(pressure_pa: f64, sea_level_hpa: f64) -> f64 {
    let pressure_hpa = pressure_pa / 100.0;
    44330.0 * (1.0 - (pressure_hpa / sea_level_hpa).powf(BAROMETRIC_EXPONENT))
}

/// Statistics for sensor reads
///
/// Tracks success rates and read latency for one source.
#[derive(Debug, Clone)]
pub struct SensorStats {
    /// Total number of successful reads
    pub successful_reads: u64,
    /// Total number of failed reads
    pub failed_reads: u64,
    /// Total read time in microseconds
    pub total_read_time_us: u64,
    /// Minimum read time observed (microseconds)
    pub min_read_time_us: u64,
    /// Maximum read time observed (microseconds)
    pub max_read_time_us: u64,
    /// Rolling window of recent read times for jitter calculation
    pub recent_read_times: VecDeque<u64>,
}

impl Default for SensorStats {
    fn default() -> Self {
        Self {
            successful_reads: 0,
            failed_reads: 0,
            total_read_time_us: 0,
            min_read_time_us: u64::MAX,
            max_read_time_us: 0,
            recent_read_times: VecDeque::with_capacity(RECENT_WINDOW_SIZE),
        }
    }
}

impl SensorStats {
    /// Calculate average read time in microseconds
    pub fn avg_read_time_us(&self) -> f64 {
        if self.successful_reads == 0 {
            0.0
        } else {
            self.total_read_time_us as f64 / self.successful_reads as f64
        }
    }

    /// Calculate success rate as percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.successful_reads + self.failed_reads;
        if total == 0 {
            100.0
        } else {
            (self.successful_reads as f64 / total as f64) * 100.0
        }
    }

    /// Record a successful read with its latency
    pub fn record_success(&mut self, time_us: u64) {
        self.successful_reads += 1;
        self.total_read_time_us += time_us;
        self.min_read_time_us = self.min_read_time_us.min(time_us);
        self.max_read_time_us = self.max_read_time_us.max(time_us);

        self.recent_read_times.push_back(time_us);
        if self.recent_read_times.len() > RECENT_WINDOW_SIZE {
            self.recent_read_times.pop_front();
        }
    }

    /// Record a failed read
    pub fn record_failure(&mut self) {
        self.failed_reads += 1;
    }

    /// Calculate jitter (max - min) over recent window in microseconds
    pub fn jitter_us(&self) -> u64 {
        let min = self.recent_read_times.iter().min().copied().unwrap_or(0);
        let max = self.recent_read_times.iter().max().copied().unwrap_or(0);
        max.saturating_sub(min)
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Unified interface for sensors
///
/// Implementations must be `Send` so a producer thread can own them.
///
/// # Example
///
/// ```ignore
/// fn sample_once<S: SensorSource>(sensor: &mut S) -> Option<S::Sample> {
///     sensor.timed_read().ok()
/// }
/// ```
pub trait SensorSource: Send {
    /// Record type produced by one read
    type Sample: Send + 'static;

    /// Human-readable device name
    fn name(&self) -> &str;

    /// Bus address the device is expected to answer on
    fn address(&self) -> u8;

    /// Perform the startup handshake
    fn begin(&mut self) -> Result<(), SensorError>;

    /// Read one sample now
    fn read(&mut self) -> Result<Self::Sample, SensorError>;

    /// Get read statistics
    fn stats(&self) -> &SensorStats;

    /// Get mutable reference to read statistics
    fn stats_mut(&mut self) -> &mut SensorStats;

    /// Read one sample and record its outcome in the statistics
    fn timed_read(&mut self) -> Result<Self::Sample, SensorError> {
        let started = Instant::now();
        let result = self.read();
        match &result {
            Ok(_) => {
                let elapsed = started.elapsed().as_micros() as u64;
                self.stats_mut().record_success(elapsed);
            }
            Err(_) => self.stats_mut().record_failure(),
        }
        result
    }
}

impl<S: SensorSource + ?Sized> SensorSource for Box<S> {
    type Sample = S::Sample;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn address(&self) -> u8 {
        (**self).address()
    }

    fn begin(&mut self) -> Result<(), SensorError> {
        (**self).begin()
    }

    fn read(&mut self) -> Result<Self::Sample, SensorError> {
        (**self).read()
    }

    fn stats(&self) -> &SensorStats {
        (**self).stats()
    }

    fn stats_mut(&mut self) -> &mut SensorStats {
        (**self).stats_mut()
    }
}
