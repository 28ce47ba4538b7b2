//! In-memory storage backend

use super::Storage;
use crate::error::StorageError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Storage kept in a shared map
///
/// Clones share the same files, so a test can hand one clone to the
/// supervisor and inspect the other afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of `path` split into lines, empty if the file is missing
    pub fn lines(&self, path: &str) -> Vec<String> {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        files
            .get(path)
            .map(|bytes| {
                String::from_utf8_lossy(bytes)
                    .lines()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of all stored files
    pub fn paths(&self) -> Vec<String> {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        let mut paths: Vec<String> = files.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl Storage for MemoryStorage {
    fn truncate_or_create(&mut self, path: &str) -> Result<(), StorageError> {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        files.insert(path.to_string(), Vec::new());
        Ok(())
    }

    fn append_line(&mut self, path: &str, line: &str) -> Result<(), StorageError> {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        let file = files.entry(path.to_string()).or_default();
        file.extend_from_slice(line.as_bytes());
        file.push(b'\n');
        Ok(())
    }

    fn read_all(&mut self, path: &str) -> Result<Vec<u8>, StorageError> {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        files.contains_key(path)
    }

    fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}
