//! Persistent storage for the per-channel log files
//!
//! The [`Storage`] trait models the storage medium as a small append-only
//! file store addressed by logical paths such as `/bmp280.txt`. Backends:
//!
//! - [`FileStorage`] - maps logical paths under a root directory on disk
//! - [`MemoryStorage`] - in-memory map, cloneable so tests can inspect it
//! - [`FaultInjectingStorage`] - wraps another backend and fails chosen appends
//!
//! All appends from both consumers go through one [`SharedStorage`], the
//! single lock that serializes access to the medium.

pub mod fault;
pub mod memory;
pub mod shared;

pub use fault::FaultInjectingStorage;
pub use memory::MemoryStorage;
pub use shared::{LockStats, SharedStorage};

use crate::error::StorageError;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Append-only file store
#[cfg_attr(test, mockall::automock)]
pub trait Storage: Send {
    /// Create `path` empty, discarding previous contents
    fn truncate_or_create(&mut self, path: &str) -> Result<(), StorageError>;

    /// Open `path` for append, write `line` plus a newline, and close it
    fn append_line(&mut self, path: &str, line: &str) -> Result<(), StorageError>;

    /// Read the whole file
    fn read_all(&mut self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Whether `path` exists
    fn exists(&self, path: &str) -> bool;

    /// Delete `path`
    fn remove(&mut self, path: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn truncate_or_create(&mut self, path: &str) -> Result<(), StorageError> {
        (**self).truncate_or_create(path)
    }

    fn append_line(&mut self, path: &str, line: &str) -> Result<(), StorageError> {
        (**self).append_line(path, line)
    }

    fn read_all(&mut self, path: &str) -> Result<Vec<u8>, StorageError> {
        (**self).read_all(path)
    }

    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }

    fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        (**self).remove(path)
    }
}

/// Storage backed by a directory on the host filesystem
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Mount `root`, creating it if needed
    pub fn mount(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StorageError::Mount {
            path: root.display().to_string(),
            source,
        })?;
        tracing::debug!(root = %root.display(), "Storage mounted");
        Ok(Self { root })
    }

    /// Root directory on disk
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path for a logical path
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Storage for FileStorage {
    fn truncate_or_create(&mut self, path: &str) -> Result<(), StorageError> {
        fs::File::create(self.resolve(path)).map_err(|e| StorageError::Open {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn append_line(&mut self, path: &str, line: &str) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.resolve(path))
            .map_err(|e| StorageError::Open {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        writeln!(file, "{}", line).map_err(|source| StorageError::Write {
            path: path.to_string(),
            source,
        })
    }

    fn read_all(&mut self, path: &str) -> Result<Vec<u8>, StorageError> {
        fs::read(self.resolve(path)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => StorageError::Read {
                path: path.to_string(),
                message: e.to_string(),
            },
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        fs::remove_file(self.resolve(path)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => StorageError::Write {
                path: path.to_string(),
                source: e,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::mount(dir.path().join("sd")).unwrap();

        assert!(!storage.exists("/bmp280.txt"));
        storage.truncate_or_create("/bmp280.txt").unwrap();
        assert!(storage.exists("/bmp280.txt"));
        assert!(storage.read_all("/bmp280.txt").unwrap().is_empty());

        storage.append_line("/bmp280.txt", "first").unwrap();
        storage.append_line("/bmp280.txt", "second").unwrap();
        assert_eq!(storage.read_all("/bmp280.txt").unwrap(), b"first\nsecond\n");

        storage.truncate_or_create("/bmp280.txt").unwrap();
        assert!(storage.read_all("/bmp280.txt").unwrap().is_empty());

        storage.remove("/bmp280.txt").unwrap();
        assert!(!storage.exists("/bmp280.txt"));
    }

    #[test]
    fn test_logical_paths_stay_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::mount(dir.path()).unwrap();
        assert_eq!(storage.resolve("/mpu6050.txt"), dir.path().join("mpu6050.txt"));
    }

    #[test]
    fn test_missing_file_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::mount(dir.path()).unwrap();
        assert!(matches!(
            storage.read_all("/missing.txt"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_mount_fails_on_file_root() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = FileStorage::mount(file.path().join("nested"));
        assert!(matches!(result, Err(StorageError::Mount { .. })));
    }
}
