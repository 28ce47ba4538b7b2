//! Single-thread scheduler driven by two periodic timers

use super::{RunContext, ScheduleOutcome, Scheduler, SensorPair};
use crate::config::SchedulingMode;
use crate::error::Result;
use crate::pipeline::{write_sample, ChannelCounters};
use crate::sensor::SensorSource;
use crate::storage::Storage;
use crate::types::LogRecord;
use std::thread;
use std::time::{Duration, Instant};

/// Fires once at least `interval` has passed since it last fired
#[derive(Debug, Clone, Copy)]
pub struct PeriodicTimer {
    interval: Duration,
    previous: Instant,
}

impl PeriodicTimer {
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            previous: start,
        }
    }

    /// Check the timer at `now`, re-arming it from `now` when it fires
    pub fn fire(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.previous) >= self.interval {
            self.previous = now;
            true
        } else {
            false
        }
    }
}

/// Samples and persists both channels inline on the calling thread
///
/// No queues are involved: when a channel's timer fires its sensor is read
/// and the line is appended before the loop moves on. The storage lock is
/// taken once for the whole run since nothing else writes.
#[derive(Debug, Default)]
pub struct CooperativeScheduler;

impl CooperativeScheduler {
    pub fn new() -> Self {
        Self
    }
}

fn sample_and_write<S>(
    source: &mut S,
    storage: &mut dyn Storage,
    path: &str,
    counters: &ChannelCounters,
) where
    S: SensorSource + ?Sized,
    S::Sample: LogRecord,
{
    match source.timed_read() {
        Ok(sample) => {
            counters.record_read();
            write_sample(storage, path, &sample, counters);
        }
        Err(e) => {
            counters.record_read_failure();
            tracing::warn!(channel = %<S::Sample as LogRecord>::CHANNEL, "Read failed, skipping tick: {}", e);
        }
    }
}

impl Scheduler for CooperativeScheduler {
    fn mode(&self) -> SchedulingMode {
        SchedulingMode::Cooperative
    }

    fn run(&mut self, mut sensors: SensorPair, ctx: &RunContext<'_>) -> Result<ScheduleOutcome> {
        let config = ctx.config;
        let duration = config.run_duration();
        let tick = config.scheduler_tick();
        let mut env_timer = PeriodicTimer::new(config.environmental.period(), ctx.started);
        let mut imu_timer = PeriodicTimer::new(config.inertial.period(), ctx.started);

        let mut storage = ctx.storage.lock()?;
        loop {
            let now = Instant::now();
            if now.duration_since(ctx.started) >= duration {
                break;
            }
            if env_timer.fire(now) {
                sample_and_write(
                    &mut *sensors.environmental,
                    &mut *storage,
                    &config.environmental.log_path,
                    &ctx.counters.environmental,
                );
            }
            if imu_timer.fire(now) {
                sample_and_write(
                    &mut *sensors.inertial,
                    &mut *storage,
                    &config.inertial.log_path,
                    &ctx.counters.inertial,
                );
            }
            thread::sleep(tick);
        }
        drop(storage);
        tracing::info!("Run duration elapsed");

        Ok(ScheduleOutcome {
            sensors,
            queues: [None, None],
        })
    }
}
