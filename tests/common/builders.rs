//! Test data builders for configurations and sample sequences

use sensorlog_rs::config::{LockOrdering, LoggerConfig, BMP280_ADDRESS, MPU6050_ADDRESS};
use sensorlog_rs::sensor::ScriptedSensor;
use sensorlog_rs::{ChannelId, EnvironmentalSample, InertialSample, SchedulingMode, SensorPair, Vector3};

/// Builder for short, fast-ticking run configurations
pub struct ConfigBuilder {
    config: LoggerConfig,
}

impl ConfigBuilder {
    /// 300 ms run, 5 ms / 3 ms periods, 1 ms polling everywhere
    pub fn new(mode: SchedulingMode) -> Self {
        let mut config = LoggerConfig::default();
        config.mode = mode;
        config.run_duration_ms = 300;
        config.environmental.period_ms = 5;
        config.inertial.period_ms = 3;
        config.consumer_poll_interval_ms = 1;
        config.scheduler_tick_ms = 1;
        config.supervisor_poll_ms = 1;
        Self { config }
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.config.run_duration_ms = duration_ms;
        self
    }

    pub fn periods_ms(mut self, environmental: u64, inertial: u64) -> Self {
        self.config.environmental.period_ms = environmental;
        self.config.inertial.period_ms = inertial;
        self
    }

    pub fn queue_capacity(mut self, channel: ChannelId, capacity: usize) -> Self {
        self.config.channel_mut(channel).queue_capacity = capacity;
        self
    }

    pub fn consumer_poll_ms(mut self, poll_ms: u64) -> Self {
        self.config.consumer_poll_interval_ms = poll_ms;
        self
    }

    pub fn lock_ordering(mut self, ordering: LockOrdering) -> Self {
        self.config.lock_ordering = ordering;
        self
    }

    pub fn build(self) -> LoggerConfig {
        self.config
    }
}

/// `n` barometer samples whose altitude counts up from 1.0
pub fn environmental_ramp(n: usize) -> Vec<EnvironmentalSample> {
    (1..=n)
        .map(|i| EnvironmentalSample::new(i as f64, 100_000.0 - i as f64, 20.0 + i as f64 / 100.0))
        .collect()
}

/// `n` IMU samples whose x acceleration counts up from 1.0
pub fn inertial_ramp(n: usize) -> Vec<InertialSample> {
    (1..=n)
        .map(|i| {
            InertialSample::new(
                Vector3::new(i as f64, 0.0, 9.81),
                Vector3::new(0.0, 0.01, -0.01),
                30.0,
            )
        })
        .collect()
}

/// Scripted sensors replaying the given sequences
pub fn scripted_pair(
    environmental: Vec<EnvironmentalSample>,
    inertial: Vec<InertialSample>,
) -> SensorPair {
    SensorPair::new(
        ScriptedSensor::new("BMP280", BMP280_ADDRESS, environmental),
        ScriptedSensor::new("MPU6050", MPU6050_ADDRESS, inertial),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new(SchedulingMode::Cooperative)
            .duration_ms(50)
            .periods_ms(7, 11)
            .queue_capacity(ChannelId::Inertial, 2)
            .build();

        assert_eq!(config.mode, SchedulingMode::Cooperative);
        assert_eq!(config.run_duration_ms, 50);
        assert_eq!(config.environmental.period_ms, 7);
        assert_eq!(config.inertial.queue_capacity, 2);
        assert!(config.validate().is_ok());
    }
}
