//! Periodic sampling task

use super::counters::ChannelCounters;
use super::queue::{QueueError, QueueSender};
use super::shutdown::ShutdownSignal;
use crate::sensor::SensorSource;
use crate::types::ChannelId;
use std::sync::Arc;
use std::time::Duration;

/// Result of one producer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A sample was read and enqueued
    Published,
    /// The sensor read failed and the tick was skipped
    Skipped,
}

/// Samples one sensor every `period` and publishes to a bounded queue
pub struct PeriodicProducer<S: SensorSource> {
    channel: ChannelId,
    period: Duration,
    source: S,
    queue: QueueSender<S::Sample>,
    counters: Arc<ChannelCounters>,
    shutdown: ShutdownSignal,
}

impl<S: SensorSource> PeriodicProducer<S> {
    pub fn new(
        channel: ChannelId,
        period: Duration,
        source: S,
        queue: QueueSender<S::Sample>,
        counters: Arc<ChannelCounters>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            channel,
            period,
            source,
            queue,
            counters,
            shutdown,
        }
    }

    /// Read once and push the sample
    ///
    /// The read counter moves only after the push lands in the queue.
    pub fn tick(&mut self) -> Result<TickOutcome, QueueError> {
        let sample = match self.source.timed_read() {
            Ok(sample) => sample,
            Err(e) => {
                self.counters.record_read_failure();
                tracing::warn!(channel = %self.channel, "Read failed, skipping tick: {}", e);
                return Ok(TickOutcome::Skipped);
            }
        };

        self.queue.push(sample, &self.shutdown)?;
        self.counters.record_read();
        Ok(TickOutcome::Published)
    }

    /// Run until the shutdown signal fires, then hand the source back
    ///
    /// Each tick sleeps a full period first, so pacing is relative to the
    /// previous tick rather than aligned to the wall clock.
    pub fn run(mut self) -> S {
        tracing::debug!(
            channel = %self.channel,
            period_ms = self.period.as_millis() as u64,
            "Producer started"
        );

        while !self.shutdown.wait_timeout(self.period) {
            match self.tick() {
                Ok(_) => {}
                Err(QueueError::Cancelled) => break,
                Err(QueueError::Disconnected) => {
                    tracing::warn!(channel = %self.channel, "Consumer gone, producer exiting");
                    break;
                }
            }
        }

        tracing::debug!(
            channel = %self.channel,
            reads = self.counters.snapshot().reads,
            "Producer stopped"
        );
        self.source
    }
}
