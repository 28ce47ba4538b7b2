//! The single storage lock shared by both persistence consumers

use super::Storage;
use crate::error::{Result, SensorLogError, StorageError};
use serde::Serialize;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

/// Lock usage counters
#[derive(Debug, Default)]
struct LockCounters {
    acquisitions: AtomicU64,
    contended: AtomicU64,
}

/// Snapshot of how often the storage lock was taken and waited for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LockStats {
    pub acquisitions: u64,
    pub contended: u64,
}

/// A storage backend behind one process-wide mutex
///
/// Cheap to clone; all clones guard the same backend.
#[derive(Clone)]
pub struct SharedStorage {
    inner: Arc<Mutex<Box<dyn Storage>>>,
    counters: Arc<LockCounters>,
}

impl std::fmt::Debug for SharedStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStorage")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Exclusive access to the storage medium
pub struct StorageGuard<'a> {
    guard: MutexGuard<'a, Box<dyn Storage>>,
}

impl Deref for StorageGuard<'_> {
    type Target = dyn Storage;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}

impl DerefMut for StorageGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.guard
    }
}

impl SharedStorage {
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self::from_boxed(Box::new(storage))
    }

    pub fn from_boxed(storage: Box<dyn Storage>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(storage)),
            counters: Arc::new(LockCounters::default()),
        }
    }

    /// Take the lock, blocking while another holder has it
    pub fn lock(&self) -> Result<StorageGuard<'_>> {
        self.counters.acquisitions.fetch_add(1, Ordering::Relaxed);
        let guard = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                self.counters.contended.fetch_add(1, Ordering::Relaxed);
                self.inner
                    .lock()
                    .map_err(|_| SensorLogError::LockPoisoned)?
            }
            Err(TryLockError::Poisoned(_)) => return Err(SensorLogError::LockPoisoned),
        };
        Ok(StorageGuard { guard })
    }

    /// Append one line under the lock
    pub fn append_line(&self, path: &str, line: &str) -> Result<()> {
        let mut storage = self.lock()?;
        storage.append_line(path, line)?;
        Ok(())
    }

    /// Read a whole file under the lock
    pub fn read_all(&self, path: &str) -> std::result::Result<Vec<u8>, StorageError> {
        match self.lock() {
            Ok(mut storage) => storage.read_all(path),
            Err(e) => Err(StorageError::Read {
                path: path.to_string(),
                message: e.to_string(),
            }),
        }
    }

    pub fn stats(&self) -> LockStats {
        LockStats {
            acquisitions: self.counters.acquisitions.load(Ordering::Relaxed),
            contended: self.counters.contended.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::thread;

    #[test]
    fn test_clones_guard_same_backend() {
        let memory = MemoryStorage::new();
        let shared = SharedStorage::new(memory.clone());
        let other = shared.clone();

        shared.lock().unwrap().truncate_or_create("/a.txt").unwrap();
        other.append_line("/a.txt", "hello").unwrap();

        assert_eq!(shared.read_all("/a.txt").unwrap(), b"hello\n");
        assert_eq!(memory.lines("/a.txt"), vec!["hello"]);
        assert_eq!(shared.stats().acquisitions, 3);
    }

    #[test]
    fn test_contention_is_counted() {
        let shared = SharedStorage::new(MemoryStorage::new());
        let guard = shared.lock().unwrap();

        let waiter = {
            let shared = shared.clone();
            thread::spawn(move || shared.append_line("/a.txt", "late"))
        };
        while shared.stats().contended == 0 {
            thread::yield_now();
        }
        drop(guard);
        waiter.join().unwrap().unwrap();

        assert_eq!(shared.stats().contended, 1);
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let shared = SharedStorage::new(MemoryStorage::new());
        let poisoner = shared.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("holder crashed");
        })
        .join();

        assert!(matches!(shared.lock(), Err(SensorLogError::LockPoisoned)));
    }
}
