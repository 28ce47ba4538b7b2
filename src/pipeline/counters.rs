//! Per-channel read and save counters

use crate::types::ChannelId;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic counters for one channel
///
/// `reads` is written only by the producer and `saves` only by the
/// consumer; the supervisor reads them after both have been joined.
#[derive(Debug, Default)]
pub struct ChannelCounters {
    reads: AtomicU64,
    saves: AtomicU64,
    read_failures: AtomicU64,
    dropped_writes: AtomicU64,
}

/// Point-in-time copy of a channel's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub reads: u64,
    pub saves: u64,
    pub read_failures: u64,
    pub dropped_writes: u64,
}

impl ChannelCounters {
    pub fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read_failure(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_write(&self) {
        self.dropped_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            dropped_writes: self.dropped_writes.load(Ordering::Relaxed),
        }
    }
}

/// Counters for both channels
#[derive(Debug, Clone, Default)]
pub struct RunCounters {
    pub environmental: Arc<ChannelCounters>,
    pub inertial: Arc<ChannelCounters>,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel: ChannelId) -> &Arc<ChannelCounters> {
        match channel {
            ChannelId::Environmental => &self.environmental,
            ChannelId::Inertial => &self.inertial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_are_independent() {
        let counters = RunCounters::new();
        counters.environmental.record_read();
        counters.environmental.record_read();
        counters.environmental.record_save();
        counters.inertial.record_read_failure();

        let env = counters.get(ChannelId::Environmental).snapshot();
        assert_eq!(env.reads, 2);
        assert_eq!(env.saves, 1);
        assert_eq!(env.read_failures, 0);

        let imu = counters.get(ChannelId::Inertial).snapshot();
        assert_eq!(imu, CounterSnapshot { read_failures: 1, ..Default::default() });
    }
}
