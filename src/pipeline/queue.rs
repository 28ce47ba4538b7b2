//! Bounded single-producer/single-consumer queue with backpressure
//!
//! A thin wrapper over a `crossbeam_channel` bounded channel that adds
//! cancellation and occupancy instrumentation. A push into a full queue
//! blocks the producer rather than dropping the sample; the stall is
//! counted so tests can observe backpressure.

use super::shutdown::ShutdownSignal;
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Why a blocking queue operation returned without an item
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The caller's shutdown signal fired while waiting
    #[error("queue operation cancelled by shutdown")]
    Cancelled,
    /// The other half of the queue was dropped
    #[error("queue peer disconnected")]
    Disconnected,
}

#[derive(Debug)]
struct QueueCounters {
    capacity: usize,
    high_water: AtomicUsize,
    stalls: AtomicU64,
    pushed: AtomicU64,
    popped: AtomicU64,
}

/// Snapshot of queue instrumentation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Fixed capacity
    pub capacity: usize,
    /// Items waiting when the snapshot was taken
    pub len: usize,
    /// Highest occupancy observed right after a push
    pub high_water: usize,
    /// Pushes that found the queue full and had to wait
    pub stalls: u64,
    pub pushed: u64,
    pub popped: u64,
}

/// Producer half
#[derive(Debug)]
pub struct QueueSender<T> {
    tx: Sender<T>,
    counters: Arc<QueueCounters>,
}

/// Consumer half
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: Receiver<T>,
    counters: Arc<QueueCounters>,
}

/// Create a queue holding at most `capacity` items
///
/// A capacity of zero is raised to one; a zero-slot channel would turn
/// every push into a rendezvous.
pub fn bounded_queue<T>(capacity: usize) -> (QueueSender<T>, QueueReceiver<T>) {
    let capacity = capacity.max(1);
    let (tx, rx) = bounded(capacity);
    let counters = Arc::new(QueueCounters {
        capacity,
        high_water: AtomicUsize::new(0),
        stalls: AtomicU64::new(0),
        pushed: AtomicU64::new(0),
        popped: AtomicU64::new(0),
    });
    (
        QueueSender {
            tx,
            counters: counters.clone(),
        },
        QueueReceiver { rx, counters },
    )
}

fn snapshot(counters: &QueueCounters, len: usize) -> QueueStats {
    QueueStats {
        capacity: counters.capacity,
        len,
        high_water: counters.high_water.load(Ordering::Relaxed),
        stalls: counters.stalls.load(Ordering::Relaxed),
        pushed: counters.pushed.load(Ordering::Relaxed),
        popped: counters.popped.load(Ordering::Relaxed),
    }
}

impl<T> QueueSender<T> {
    /// Push `item`, blocking while the queue is full
    ///
    /// Returns [`QueueError::Cancelled`] if `cancel` fires first; the item is
    /// then discarded.
    pub fn push(&self, item: T, cancel: &ShutdownSignal) -> Result<(), QueueError> {
        if cancel.is_triggered() {
            return Err(QueueError::Cancelled);
        }

        let item = match self.tx.try_send(item) {
            Ok(()) => {
                self.pushed();
                return Ok(());
            }
            Err(TrySendError::Disconnected(_)) => return Err(QueueError::Disconnected),
            Err(TrySendError::Full(item)) => item,
        };

        self.counters.stalls.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(capacity = self.counters.capacity, "Queue full, producer stalled");

        select! {
            send(self.tx, item) -> res => match res {
                Ok(()) => {
                    self.pushed();
                    Ok(())
                }
                Err(_) => Err(QueueError::Disconnected),
            },
            recv(cancel.receiver()) -> _ => Err(QueueError::Cancelled),
        }
    }

    fn pushed(&self) {
        self.counters.pushed.fetch_add(1, Ordering::Relaxed);
        self.counters
            .high_water
            .fetch_max(self.tx.len(), Ordering::Relaxed);
    }

    pub fn capacity(&self) -> usize {
        self.counters.capacity
    }

    pub fn stats(&self) -> QueueStats {
        snapshot(&self.counters, self.tx.len())
    }
}

impl<T> QueueReceiver<T> {
    /// Pop the oldest item, blocking while the queue is empty
    pub fn pop(&self, cancel: &ShutdownSignal) -> Result<T, QueueError> {
        if cancel.is_triggered() {
            return Err(QueueError::Cancelled);
        }
        select! {
            recv(self.rx) -> msg => match msg {
                Ok(item) => {
                    self.counters.popped.fetch_add(1, Ordering::Relaxed);
                    Ok(item)
                }
                Err(_) => Err(QueueError::Disconnected),
            },
            recv(cancel.receiver()) -> _ => Err(QueueError::Cancelled),
        }
    }

    /// Pop without blocking
    pub fn try_pop(&self) -> Option<T> {
        let item = self.rx.try_recv().ok()?;
        self.counters.popped.fetch_add(1, Ordering::Relaxed);
        Some(item)
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn stats(&self) -> QueueStats {
        snapshot(&self.counters, self.rx.len())
    }
}
