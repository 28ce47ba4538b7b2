//! Replay sensor that returns a fixed sequence of samples
//!
//! Used by tests and by deterministic runs where the exact input matters.
//! Once the sequence is used up every read fails with
//! [`SensorError::Exhausted`], which the pipelines treat like any other
//! read failure.

use super::{SensorSource, SensorStats};
use crate::error::SensorError;
use std::collections::VecDeque;

/// A sensor that replays a scripted list of readings
#[derive(Debug)]
pub struct ScriptedSensor<T> {
    name: String,
    address: u8,
    samples: VecDeque<Result<T, SensorError>>,
    handshake_ok: bool,
    initialized: bool,
    stats: SensorStats,
}

impl<T> ScriptedSensor<T> {
    /// Create a sensor that yields `samples` in order
    pub fn new(name: impl Into<String>, address: u8, samples: impl IntoIterator<Item = T>) -> Self {
        Self {
            name: name.into(),
            address,
            samples: samples.into_iter().map(Ok).collect(),
            handshake_ok: true,
            initialized: false,
            stats: SensorStats::default(),
        }
    }

    /// Make `begin` fail
    pub fn failing_handshake(mut self) -> Self {
        self.handshake_ok = false;
        self
    }

    /// Insert a read failure at `index` in the remaining sequence
    pub fn with_failure_at(mut self, index: usize, message: impl Into<String>) -> Self {
        let err = SensorError::Read {
            sensor: self.name.clone(),
            message: message.into(),
        };
        let index = index.min(self.samples.len());
        self.samples.insert(index, Err(err));
        self
    }

    /// Number of scripted entries not yet returned
    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

impl<T: Send + 'static> SensorSource for ScriptedSensor<T> {
    type Sample = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> u8 {
        self.address
    }

    fn begin(&mut self) -> Result<(), SensorError> {
        if !self.handshake_ok {
            return Err(SensorError::Handshake {
                sensor: self.name.clone(),
                address: self.address,
            });
        }
        self.initialized = true;
        Ok(())
    }

    fn read(&mut self) -> Result<T, SensorError> {
        if !self.initialized {
            return Err(SensorError::NotInitialized(self.name.clone()));
        }
        self.samples
            .pop_front()
            .unwrap_or_else(|| Err(SensorError::Exhausted(self.name.clone())))
    }

    fn stats(&self) -> &SensorStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut SensorStats {
        &mut self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_then_exhausts() {
        let mut sensor = ScriptedSensor::new("test", 0x10, vec![1, 2]);
        sensor.begin().unwrap();
        assert_eq!(sensor.read(), Ok(1));
        assert_eq!(sensor.read(), Ok(2));
        assert_eq!(sensor.read(), Err(SensorError::Exhausted("test".to_string())));
    }

    #[test]
    fn test_injected_failure() {
        let mut sensor = ScriptedSensor::new("test", 0x10, vec![1, 2]).with_failure_at(1, "nack");
        sensor.begin().unwrap();
        assert_eq!(sensor.timed_read(), Ok(1));
        assert!(matches!(sensor.timed_read(), Err(SensorError::Read { .. })));
        assert_eq!(sensor.timed_read(), Ok(2));
        assert_eq!(sensor.stats().failed_reads, 1);
        assert_eq!(sensor.remaining(), 0);
    }

    #[test]
    fn test_failing_handshake() {
        let mut sensor = ScriptedSensor::new("test", 0x10, Vec::<u8>::new()).failing_handshake();
        assert!(matches!(sensor.begin(), Err(SensorError::Handshake { address: 0x10, .. })));
        assert!(matches!(sensor.read(), Err(SensorError::NotInitialized(_))));
    }
}
