//! Core data types for sensorlog-rs
//!
//! This module contains the sample records produced by the two sensor
//! channels and the text form each one takes in its log file.
//!
//! # Main Types
//!
//! - [`EnvironmentalSample`] - altitude, pressure and temperature from the barometer
//! - [`InertialSample`] - acceleration, angular rate and die temperature from the IMU
//! - [`ChannelId`] - which of the two pipelines a value belongs to
//! - [`LogRecord`] - renders a sample as one log line
//!
//! # Log Line Formats
//!
//! Both formats use two decimal places for every floating value and must stay
//! byte-for-byte stable, since downstream tooling parses the logs:
//!
//! ```text
//! Altitude: 120.50 m, Pressao: 99876.12 Pa, Temperatura: 24.31 Celsius
//! Accel: [0.12, -0.03, 9.81] m/s², Gyro: [0.00, 0.01, -0.02] rad/s, Temp: 31.40 Celsius
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one sensor-to-log pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelId {
    /// Pressure/altitude channel (BMP280)
    Environmental,
    /// Accelerometer/gyroscope channel (MPU6050)
    Inertial,
}

impl ChannelId {
    /// Both channels in report order
    pub const ALL: [ChannelId; 2] = [ChannelId::Environmental, ChannelId::Inertial];

    /// Name of the device behind this channel, used in reports and thread names
    pub fn device_name(&self) -> &'static str {
        match self {
            ChannelId::Environmental => "BMP280",
            ChannelId::Inertial => "MPU6050",
        }
    }

    /// Short lowercase tag for thread names and structured log fields
    pub fn tag(&self) -> &'static str {
        match self {
            ChannelId::Environmental => "env",
            ChannelId::Inertial => "imu",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::Environmental => write!(f, "environmental"),
            ChannelId::Inertial => write!(f, "inertial"),
        }
    }
}

/// Three-axis reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// One barometer reading in physical units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvironmentalSample {
    /// Altitude above the reference sea-level pressure, meters
    pub altitude: f64,
    /// Absolute pressure, pascals
    pub pressure: f64,
    /// Temperature, degrees Celsius
    pub temperature: f64,
}

impl EnvironmentalSample {
    pub fn new(altitude: f64, pressure: f64, temperature: f64) -> Self {
        Self {
            altitude,
            pressure,
            temperature,
        }
    }
}

/// One IMU reading in physical units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InertialSample {
    /// Linear acceleration, m/s²
    pub accel: Vector3,
    /// Angular rate, rad/s
    pub gyro: Vector3,
    /// Die temperature, degrees Celsius
    pub temperature: f64,
}

impl InertialSample {
    pub fn new(accel: Vector3, gyro: Vector3, temperature: f64) -> Self {
        Self {
            accel,
            gyro,
            temperature,
        }
    }
}

/// A sample that can be persisted as a single log line
pub trait LogRecord: Send + 'static {
    /// Channel this record type belongs to
    const CHANNEL: ChannelId;

    /// Render the record as one line, without the trailing newline
    fn to_log_line(&self) -> String;
}

impl LogRecord for EnvironmentalSample {
    const CHANNEL: ChannelId = ChannelId::Environmental;

    fn to_log_line(&self) -> String {
        format!(
            "Altitude: {:.2} m, Pressao: {:.2} Pa, Temperatura: {:.2} Celsius",
            self.altitude, self.pressure, self.temperature
        )
    }
}

impl LogRecord for InertialSample {
    const CHANNEL: ChannelId = ChannelId::Inertial;

    fn to_log_line(&self) -> String {
        format!(
            "Accel: [{:.2}, {:.2}, {:.2}] m/s², Gyro: [{:.2}, {:.2}, {:.2}] rad/s, Temp: {:.2} Celsius",
            self.accel.x,
            self.accel.y,
            self.accel.z,
            self.gyro.x,
            self.gyro.y,
            self.gyro.z,
            self.temperature
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_environmental_line_format() {
        let sample = EnvironmentalSample::new(120.5, 99876.123, 24.305);
        assert_eq!(
            sample.to_log_line(),
            "Altitude: 120.50 m, Pressao: 99876.12 Pa, Temperatura: 24.30 Celsius"
        );
    }

    #[test]
    fn test_inertial_line_format() {
        let sample = InertialSample::new(
            Vector3::new(0.12, -0.034, 9.81),
            Vector3::new(0.0, 0.011, -0.02),
            31.4,
        );
        assert_eq!(
            sample.to_log_line(),
            "Accel: [0.12, -0.03, 9.81] m/s², Gyro: [0.00, 0.01, -0.02] rad/s, Temp: 31.40 Celsius"
        );
    }

    #[test]
    fn test_channel_names() {
        assert_eq!(ChannelId::Environmental.device_name(), "BMP280");
        assert_eq!(ChannelId::Inertial.device_name(), "MPU6050");
        assert_eq!(EnvironmentalSample::CHANNEL, ChannelId::Environmental);
        assert_eq!(InertialSample::CHANNEL, ChannelId::Inertial);
    }

    proptest! {
        #[test]
        fn test_every_field_has_two_decimals(
            altitude in -500.0f64..9000.0,
            pressure in 30_000.0f64..110_000.0,
            temperature in -40.0f64..85.0
        ) {
            let line = EnvironmentalSample::new(altitude, pressure, temperature).to_log_line();
            let numbers: Vec<&str> = line
                .split(|c: char| c == ' ' || c == ',')
                .filter(|tok| tok.parse::<f64>().is_ok())
                .collect();
            prop_assert_eq!(numbers.len(), 3);
            for number in numbers {
                let decimals = number.split('.').nth(1).map(str::len);
                prop_assert_eq!(decimals, Some(2), "bad precision in {}", line);
            }
        }

        #[test]
        fn test_inertial_line_has_single_line(
            ax in -160.0f64..160.0,
            gz in -35.0f64..35.0,
            temperature in -40.0f64..85.0
        ) {
            let sample = InertialSample::new(
                Vector3::new(ax, 0.0, 9.81),
                Vector3::new(0.0, 0.0, gz),
                temperature,
            );
            let line = sample.to_log_line();
            prop_assert!(!line.contains('\n'));
            prop_assert!(line.starts_with("Accel: ["));
            prop_assert!(line.ends_with(" Celsius"));
        }
    }
}
