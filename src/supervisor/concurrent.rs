//! Four-thread scheduler: one producer and one consumer per channel

use super::{RunContext, ScheduleOutcome, Scheduler, SensorPair};
use crate::config::{ChannelConfig, SchedulingMode};
use crate::error::{Result, SensorLogError};
use crate::pipeline::{
    bounded_queue, ChannelCounters, PeriodicProducer, PersistenceConsumer, QueueReceiver,
    ShutdownSignal,
};
use crate::sensor::SensorSource;
use crate::types::{ChannelId, LogRecord};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Runs both channels as independent producer/consumer pairs
///
/// Shutdown happens in two phases. Producers are stopped and joined first,
/// so no new samples arrive; consumers are then stopped, persist whatever
/// is still queued, and are joined.
#[derive(Debug, Default)]
pub struct ConcurrentScheduler;

impl ConcurrentScheduler {
    pub fn new() -> Self {
        Self
    }
}

fn spawn_task<T, F>(name: String, task: F) -> Result<JoinHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(task)
        .map_err(|source| SensorLogError::Spawn { name, source })
}

fn join_task<T>(handle: JoinHandle<T>) -> Result<T> {
    let name = handle.thread().name().unwrap_or("task").to_string();
    handle.join().map_err(|_| {
        tracing::error!(task = %name, "Task panicked");
        SensorLogError::TaskPanicked(name)
    })
}

/// Running threads of one channel
struct ChannelTasks<S: SensorSource> {
    producer: JoinHandle<S>,
    consumer: JoinHandle<QueueReceiver<S::Sample>>,
}

impl<S: SensorSource> ChannelTasks<S> {
    /// Join producer then consumer; both are joined even if the first failed
    ///
    /// The caller must have triggered the signals the threads wait on.
    fn join(self) -> (Result<S>, Result<QueueReceiver<S::Sample>>) {
        let producer = join_task(self.producer);
        let consumer = join_task(self.consumer);
        (producer, consumer)
    }
}

fn start_channel<S>(
    source: S,
    channel_config: &ChannelConfig,
    counters: &Arc<ChannelCounters>,
    ctx: &RunContext<'_>,
    producer_stop: &ShutdownSignal,
    consumer_stop: &ShutdownSignal,
) -> Result<ChannelTasks<S>>
where
    S: SensorSource + 'static,
    S::Sample: LogRecord,
{
    let channel = <S::Sample as LogRecord>::CHANNEL;
    let (tx, rx) = bounded_queue(channel_config.queue_capacity);

    let consumer = PersistenceConsumer::new(
        channel_config.log_path.clone(),
        rx,
        ctx.storage.clone(),
        counters.clone(),
        consumer_stop.clone(),
    )
    .with_poll_interval(ctx.config.consumer_poll_interval())
    .with_lock_ordering(ctx.config.lock_ordering);
    let consumer = spawn_task(format!("save-{}", channel.tag()), move || consumer.run())?;

    let producer = PeriodicProducer::new(
        channel,
        channel_config.period(),
        source,
        tx,
        counters.clone(),
        producer_stop.clone(),
    );
    let producer = match spawn_task(format!("read-{}", channel.tag()), move || producer.run()) {
        Ok(handle) => handle,
        Err(e) => {
            // The queue sender went down with the unspawned producer
            consumer_stop.trigger();
            if join_task(consumer).is_err() {
                tracing::warn!(channel = %channel, "Consumer failed while aborting start");
            }
            return Err(e);
        }
    };

    Ok(ChannelTasks { producer, consumer })
}

/// Sleep in `poll` steps until `duration` has elapsed since `started`
fn wait_for_expiry(started: Instant, duration: Duration, poll: Duration) {
    loop {
        let elapsed = started.elapsed();
        if elapsed >= duration {
            break;
        }
        thread::sleep(poll.min(duration - elapsed));
    }
}

impl Scheduler for ConcurrentScheduler {
    fn mode(&self) -> SchedulingMode {
        SchedulingMode::Concurrent
    }

    fn run(&mut self, sensors: SensorPair, ctx: &RunContext<'_>) -> Result<ScheduleOutcome> {
        let producer_stop = ShutdownSignal::new();
        let consumer_stop = ShutdownSignal::new();

        let env = match start_channel(
            sensors.environmental,
            &ctx.config.environmental,
            ctx.counters.get(ChannelId::Environmental),
            ctx,
            &producer_stop,
            &consumer_stop,
        ) {
            Ok(tasks) => tasks,
            Err(e) => {
                producer_stop.trigger();
                consumer_stop.trigger();
                return Err(e);
            }
        };
        let imu = match start_channel(
            sensors.inertial,
            &ctx.config.inertial,
            ctx.counters.get(ChannelId::Inertial),
            ctx,
            &producer_stop,
            &consumer_stop,
        ) {
            Ok(tasks) => tasks,
            Err(e) => {
                producer_stop.trigger();
                consumer_stop.trigger();
                let (producer, consumer) = env.join();
                if producer.is_err() || consumer.is_err() {
                    tracing::warn!("Environmental tasks failed while aborting start");
                }
                return Err(e);
            }
        };

        wait_for_expiry(ctx.started, ctx.config.run_duration(), ctx.config.supervisor_poll());
        tracing::info!("Run duration elapsed, stopping tasks");

        producer_stop.trigger();
        let environmental = join_task(env.producer);
        let inertial = join_task(imu.producer);

        consumer_stop.trigger();
        let env_queue = join_task(env.consumer);
        let imu_queue = join_task(imu.consumer);

        // Every thread is joined; only now surface the first failure
        Ok(ScheduleOutcome {
            sensors: SensorPair {
                environmental: environmental?,
                inertial: inertial?,
            },
            queues: [Some(env_queue?.stats()), Some(imu_queue?.stats())],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_wait_respects_duration() {
        let started = Instant::now();
        wait_for_expiry(started, Duration::from_millis(30), Duration::from_millis(5));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_zero_duration_returns_immediately() {
        let started = Instant::now();
        wait_for_expiry(started, Duration::ZERO, Duration::from_millis(500));
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_channel_join_waits_for_both_threads() {
        use crate::config::LoggerConfig;
        use crate::pipeline::RunCounters;
        use crate::sensor::ScriptedSensor;
        use crate::storage::{MemoryStorage, SharedStorage};
        use crate::types::EnvironmentalSample;

        let mut config = LoggerConfig::default();
        config.environmental.period_ms = 1;
        config.consumer_poll_interval_ms = 1;
        let memory = MemoryStorage::new();
        let ctx = RunContext {
            config: &config,
            storage: SharedStorage::new(memory.clone()),
            counters: RunCounters::new(),
            started: Instant::now(),
        };
        let mut source = ScriptedSensor::new(
            "BMP280",
            0x76,
            (1..=3).map(|i| EnvironmentalSample::new(i as f64, 100_000.0, 20.0)),
        );
        source.begin().unwrap();

        let producer_stop = ShutdownSignal::new();
        let consumer_stop = ShutdownSignal::new();
        let tasks = start_channel(
            source,
            &config.environmental,
            ctx.counters.get(ChannelId::Environmental),
            &ctx,
            &producer_stop,
            &consumer_stop,
        )
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        producer_stop.trigger();
        consumer_stop.trigger();
        let (producer, consumer) = tasks.join();

        assert_eq!(producer.unwrap().remaining(), 0);
        let reads = ctx.counters.environmental.snapshot().reads;
        assert_eq!(consumer.unwrap().stats().pushed, reads);
        assert_eq!(memory.lines("/bmp280.txt").len() as u64, reads);
    }

    #[test]
    fn test_task_names() {
        let handle = spawn_task("read-env".to_string(), || 5).unwrap();
        assert_eq!(handle.thread().name(), Some("read-env"));
        assert_eq!(join_task(handle).unwrap(), 5);
    }
}
