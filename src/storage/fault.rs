//! Storage wrapper that fails selected appends

use super::Storage;
use crate::error::StorageError;
use std::collections::{HashMap, HashSet};

/// Wraps a backend and makes chosen append attempts fail to open
///
/// Attempts are counted per path starting at 1, whether or not they
/// succeed, so "fail the 3rd write" means the third call to
/// [`Storage::append_line`] for that path.
#[derive(Debug)]
pub struct FaultInjectingStorage<S> {
    inner: S,
    failures: HashMap<String, HashSet<u64>>,
    attempts: HashMap<String, u64>,
}

impl<S: Storage> FaultInjectingStorage<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failures: HashMap::new(),
            attempts: HashMap::new(),
        }
    }

    /// Fail the `nth` (1-based) append to `path`
    pub fn fail_append(mut self, path: impl Into<String>, nth: u64) -> Self {
        self.failures.entry(path.into()).or_default().insert(nth);
        self
    }

    /// Append attempts seen so far for `path`
    pub fn attempts(&self, path: &str) -> u64 {
        self.attempts.get(path).copied().unwrap_or(0)
    }
}

impl<S: Storage> Storage for FaultInjectingStorage<S> {
    fn truncate_or_create(&mut self, path: &str) -> Result<(), StorageError> {
        self.inner.truncate_or_create(path)
    }

    fn append_line(&mut self, path: &str, line: &str) -> Result<(), StorageError> {
        let attempt = self.attempts.entry(path.to_string()).or_insert(0);
        *attempt += 1;
        let attempt = *attempt;

        let injected = self
            .failures
            .get(path)
            .is_some_and(|set| set.contains(&attempt));
        if injected {
            return Err(StorageError::Open {
                path: path.to_string(),
                message: format!("injected failure on append #{}", attempt),
            });
        }
        self.inner.append_line(path, line)
    }

    fn read_all(&mut self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.inner.read_all(path)
    }

    fn exists(&self, path: &str) -> bool {
        self.inner.exists(path)
    }

    fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        self.inner.remove(path)
    }
}
