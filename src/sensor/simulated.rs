//! Simulated sensors for running without hardware
//!
//! The two devices here answer the same handshake and produce the same
//! sample types as the real BMP280 and MPU6050 drivers would, with values
//! generated from configurable signal patterns plus seeded noise.
//!
//! # Signal Patterns
//!
//! - [`SignalPattern::Constant`] - fixed value
//! - [`SignalPattern::Sine`] - sinusoid around an offset
//!
//! # Example
//!
//! ```ignore
//! use sensorlog_rs::sensor::{SensorSource, SimulatedBmp280};
//!
//! let mut baro = SimulatedBmp280::new(0x76, 1016.0, 0x5EED, 0.01);
//! baro.begin()?;
//! let sample = baro.read()?;
//! ```

use super::{barometric_altitude, SensorSource, SensorStats};
use crate::config::{LoggerConfig, BMP280_ADDRESS, MPU6050_ADDRESS};
use crate::error::SensorError;
use crate::types::{EnvironmentalSample, InertialSample, Vector3};
use std::time::Instant;

/// Standard gravity, m/s²
const STANDARD_GRAVITY: f64 = 9.80665;

/// Pattern for generating simulated values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalPattern {
    /// Constant value
    Constant(f64),
    /// Sine wave with frequency and amplitude
    Sine {
        frequency: f64,
        amplitude: f64,
        offset: f64,
    },
}

impl Default for SignalPattern {
    fn default() -> Self {
        SignalPattern::Constant(0.0)
    }
}

/// One simulated physical quantity
#[derive(Debug, Clone)]
pub struct SimulatedSignal {
    /// Data generation pattern
    pub pattern: SignalPattern,
    /// Noise amplitude to add (0.0 = no noise)
    pub noise_amplitude: f64,
    rng_state: u64,
}

impl SimulatedSignal {
    /// Create a noiseless signal
    pub fn new(pattern: SignalPattern) -> Self {
        Self {
            pattern,
            noise_amplitude: 0.0,
            rng_state: 1,
        }
    }

    /// Add seeded noise to the generated values
    pub fn with_noise(mut self, amplitude: f64, seed: u64) -> Self {
        self.noise_amplitude = amplitude;
        // xorshift has a fixed point at zero
        self.rng_state = if seed == 0 { 1 } else { seed };
        self
    }

    /// Generate a value based on the pattern and elapsed time
    pub fn generate_value(&mut self, elapsed_secs: f64) -> f64 {
        let base_value = match self.pattern {
            SignalPattern::Constant(v) => v,
            SignalPattern::Sine {
                frequency,
                amplitude,
                offset,
            } => offset + amplitude * (2.0 * std::f64::consts::PI * frequency * elapsed_secs).sin(),
        };

        if self.noise_amplitude > 0.0 {
            base_value + (self.next_unit() - 0.5) * 2.0 * self.noise_amplitude
        } else {
            base_value
        }
    }

    fn next_unit(&mut self) -> f64 {
        let mut s = self.rng_state;
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        self.rng_state = s;
        (s as f64) / (u64::MAX as f64)
    }
}

/// Simulated BMP280 barometer
#[derive(Debug)]
pub struct SimulatedBmp280 {
    configured_address: u8,
    sea_level_hpa: f64,
    pressure_pa: SimulatedSignal,
    temperature_c: SimulatedSignal,
    started: Option<Instant>,
    stats: SensorStats,
}

impl SimulatedBmp280 {
    /// Create a barometer expected at `configured_address`
    ///
    /// `noise` is a fraction of each signal's nominal magnitude.
    pub fn new(configured_address: u8, sea_level_hpa: f64, seed: u64, noise: f64) -> Self {
        Self {
            configured_address,
            sea_level_hpa,
            pressure_pa: SimulatedSignal::new(SignalPattern::Sine {
                frequency: 0.05,
                amplitude: 150.0,
                offset: 100_000.0,
            })
            .with_noise(noise * 100.0, seed),
            temperature_c: SimulatedSignal::new(SignalPattern::Sine {
                frequency: 0.01,
                amplitude: 1.5,
                offset: 24.0,
            })
            .with_noise(noise, seed.rotate_left(17)),
            started: None,
            stats: SensorStats::default(),
        }
    }

    /// Create from the environmental channel settings
    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::new(
            config.environmental.i2c_address,
            config.sea_level_hpa,
            config.simulation.seed,
            config.simulation.noise,
        )
    }

    /// Replace the pressure signal
    pub fn with_pressure(mut self, signal: SimulatedSignal) -> Self {
        self.pressure_pa = signal;
        self
    }
}

impl SensorSource for SimulatedBmp280 {
    type Sample = EnvironmentalSample;

    fn name(&self) -> &str {
        "BMP280"
    }

    fn address(&self) -> u8 {
        self.configured_address
    }

    fn begin(&mut self) -> Result<(), SensorError> {
        if self.configured_address != BMP280_ADDRESS {
            return Err(SensorError::Handshake {
                sensor: self.name().to_string(),
                address: self.configured_address,
            });
        }
        self.started = Some(Instant::now());
        Ok(())
    }

    fn read(&mut self) -> Result<Self::Sample, SensorError> {
        let started = self
            .started
            .ok_or_else(|| SensorError::NotInitialized(self.name().to_string()))?;
        let elapsed = started.elapsed().as_secs_f64();

        let pressure = self.pressure_pa.generate_value(elapsed);
        let temperature = self.temperature_c.generate_value(elapsed);
        let altitude = barometric_altitude(pressure, self.sea_level_hpa);

        Ok(EnvironmentalSample::new(altitude, pressure, temperature))
    }

    fn stats(&self) -> &SensorStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut SensorStats {
        &mut self.stats
    }
}

/// Simulated MPU6050 accelerometer and gyroscope
///
/// At rest the accelerometer reads standard gravity on the z axis and the
/// gyroscope drifts slowly around zero.
#[derive(Debug)]
pub struct SimulatedMpu6050 {
    configured_address: u8,
    accel: [SimulatedSignal; 3],
    gyro: [SimulatedSignal; 3],
    temperature_c: SimulatedSignal,
    started: Option<Instant>,
    stats: SensorStats,
}

impl SimulatedMpu6050 {
    /// Create an IMU expected at `configured_address`
    pub fn new(configured_address: u8, seed: u64, noise: f64) -> Self {
        let axis = |pattern, salt: u32| {
            SimulatedSignal::new(pattern).with_noise(noise, seed.rotate_left(salt))
        };
        let gyro_axis = |frequency, salt| {
            axis(
                SignalPattern::Sine {
                    frequency,
                    amplitude: 0.02,
                    offset: 0.0,
                },
                salt,
            )
        };
        Self {
            configured_address,
            accel: [
                axis(SignalPattern::Constant(0.0), 3),
                axis(SignalPattern::Constant(0.0), 7),
                axis(SignalPattern::Constant(STANDARD_GRAVITY), 11),
            ],
            gyro: [gyro_axis(0.2, 19), gyro_axis(0.3, 23), gyro_axis(0.1, 29)],
            temperature_c: axis(
                SignalPattern::Sine {
                    frequency: 0.01,
                    amplitude: 0.8,
                    offset: 31.0,
                },
                31,
            ),
            started: None,
            stats: SensorStats::default(),
        }
    }

    /// Create from the inertial channel settings
    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::new(
            config.inertial.i2c_address,
            config.simulation.seed,
            config.simulation.noise,
        )
    }
}

impl SensorSource for SimulatedMpu6050 {
    type Sample = InertialSample;

    fn name(&self) -> &str {
        "MPU6050"
    }

    fn address(&self) -> u8 {
        self.configured_address
    }

    fn begin(&mut self) -> Result<(), SensorError> {
        if self.configured_address != MPU6050_ADDRESS {
            return Err(SensorError::Handshake {
                sensor: self.name().to_string(),
                address: self.configured_address,
            });
        }
        self.started = Some(Instant::now());
        Ok(())
    }

    fn read(&mut self) -> Result<Self::Sample, SensorError> {
        let started = self
            .started
            .ok_or_else(|| SensorError::NotInitialized(self.name().to_string()))?;
        let t = started.elapsed().as_secs_f64();

        let [ax, ay, az] = &mut self.accel;
        let accel = Vector3::new(ax.generate_value(t), ay.generate_value(t), az.generate_value(t));
        let [gx, gy, gz] = &mut self.gyro;
        let gyro = Vector3::new(gx.generate_value(t), gy.generate_value(t), gz.generate_value(t));
        let temperature = self.temperature_c.generate_value(t);

        Ok(InertialSample::new(accel, gyro, temperature))
    }

    fn stats(&self) -> &SensorStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut SensorStats {
        &mut self.stats
    }
}
