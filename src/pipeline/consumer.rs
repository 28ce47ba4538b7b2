//! Persistence task draining one queue into its log file

use super::counters::ChannelCounters;
use super::queue::{QueueError, QueueReceiver};
use super::shutdown::ShutdownSignal;
use crate::config::LockOrdering;
use crate::storage::{SharedStorage, Storage};
use crate::types::LogRecord;
use std::sync::Arc;
use std::time::Duration;

/// Format `sample` and append it to `path`, updating `counters`
///
/// A failed append drops the line: no retry, and `saves` is not
/// incremented. Returns whether the line was written.
pub fn write_sample<T: LogRecord>(
    storage: &mut dyn Storage,
    path: &str,
    sample: &T,
    counters: &ChannelCounters,
) -> bool {
    match storage.append_line(path, &sample.to_log_line()) {
        Ok(()) => {
            counters.record_save();
            true
        }
        Err(e) => {
            counters.record_dropped_write();
            tracing::debug!(channel = %T::CHANNEL, path, "Dropped log line: {}", e);
            false
        }
    }
}

/// Drains one queue and appends each sample under the storage lock
pub struct PersistenceConsumer<T: LogRecord> {
    log_path: String,
    queue: QueueReceiver<T>,
    storage: SharedStorage,
    counters: Arc<ChannelCounters>,
    poll_interval: Duration,
    ordering: LockOrdering,
    shutdown: ShutdownSignal,
}

impl<T: LogRecord> PersistenceConsumer<T> {
    pub fn new(
        log_path: impl Into<String>,
        queue: QueueReceiver<T>,
        storage: SharedStorage,
        counters: Arc<ChannelCounters>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            log_path: log_path.into(),
            queue,
            storage,
            counters,
            poll_interval: Duration::from_millis(crate::config::DEFAULT_CONSUMER_POLL_MS),
            ordering: LockOrdering::default(),
            shutdown,
        }
    }

    /// Pause between iterations
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// When to take the storage lock relative to the queue wait
    pub fn with_lock_ordering(mut self, ordering: LockOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Take one sample and persist it
    ///
    /// Blocks until a sample arrives or the shutdown signal fires.
    pub fn step(&mut self) -> Result<bool, QueueError> {
        match self.ordering {
            LockOrdering::AppendOnly => {
                let sample = self.queue.pop(&self.shutdown)?;
                Ok(self.persist(&sample))
            }
            LockOrdering::HoldWhileWaiting => {
                let mut storage = match self.storage.lock() {
                    Ok(storage) => storage,
                    Err(e) => {
                        tracing::error!(channel = %T::CHANNEL, "Storage unavailable: {}", e);
                        return Err(QueueError::Disconnected);
                    }
                };
                let sample = self.queue.pop(&self.shutdown)?;
                Ok(write_sample(&mut *storage, &self.log_path, &sample, &self.counters))
            }
        }
    }

    fn persist(&self, sample: &T) -> bool {
        match self.storage.lock() {
            Ok(mut storage) => write_sample(&mut *storage, &self.log_path, sample, &self.counters),
            Err(e) => {
                self.counters.record_dropped_write();
                tracing::error!(channel = %T::CHANNEL, "Storage unavailable: {}", e);
                false
            }
        }
    }

    /// Persist whatever is still queued, without blocking
    pub fn drain(&mut self) -> usize {
        let mut drained = 0;
        while let Some(sample) = self.queue.try_pop() {
            self.persist(&sample);
            drained += 1;
        }
        drained
    }

    /// Run until shutdown, then drain the queue and return its receiver
    pub fn run(mut self) -> QueueReceiver<T> {
        tracing::debug!(
            channel = %T::CHANNEL,
            path = %self.log_path,
            ordering = %self.ordering,
            "Consumer started"
        );

        loop {
            match self.step() {
                Ok(_) => {}
                Err(QueueError::Cancelled) | Err(QueueError::Disconnected) => break,
            }
            if self.shutdown.wait_timeout(self.poll_interval) {
                break;
            }
        }

        let drained = self.drain();
        tracing::debug!(
            channel = %T::CHANNEL,
            saves = self.counters.snapshot().saves,
            drained,
            "Consumer stopped"
        );
        self.queue
    }
}
