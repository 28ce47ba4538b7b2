//! Broadcast cancellation for worker threads

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// One-shot signal observed by every blocking point of a task
///
/// Triggering drops the only sender of an internal channel, so every
/// receiver, including ones parked inside a `select!`, wakes at once with
/// a disconnect.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    sender: Arc<Mutex<Option<Sender<()>>>>,
    receiver: Receiver<()>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, receiver) = bounded(0);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            sender: Arc::new(Mutex::new(Some(sender))),
            receiver,
        }
    }

    /// Assert the signal. Idempotent.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Sleep for `timeout` unless the signal fires first
    ///
    /// Returns `true` if the signal was triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }
        match self.receiver.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => self.is_triggered(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    /// Receiver that becomes ready when the signal fires, for use in `select!`
    pub fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}
