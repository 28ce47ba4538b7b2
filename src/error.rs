//! Error handling for sensorlog-rs
//!
//! This module defines the error types and a Result alias used throughout
//! the crate. Errors are split by the collaborator that raised them:
//!
//! - [`SensorError`] - a sensor failed its handshake or a single read
//! - [`StorageError`] - the storage medium refused an operation
//! - [`SensorLogError`] - top-level error returned by the supervisor and config
//!
//! Only initialization failures ever surface from a run. Runtime sensor and
//! storage errors are contained inside the task that hit them.

use thiserror::Error;

/// Errors raised by a [`SensorSource`](crate::sensor::SensorSource)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    /// The device did not answer at its configured bus address
    #[error("{sensor} did not respond at address 0x{address:02X}")]
    Handshake { sensor: String, address: u8 },

    /// A read was attempted before `begin` succeeded
    #[error("{0} is not initialized")]
    NotInitialized(String),

    /// A single read failed
    #[error("{sensor} read failed: {message}")]
    Read { sensor: String, message: String },

    /// A replay source has no more samples
    #[error("{0} has no more samples")]
    Exhausted(String),
}

/// Errors raised by a [`Storage`](crate::storage::Storage) backend
#[derive(Error, Debug)]
pub enum StorageError {
    /// The storage medium could not be mounted or created
    #[error("failed to mount storage at {path}: {source}")]
    Mount {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A log file could not be opened for appending
    #[error("failed to open {path} for append: {message}")]
    Open { path: String, message: String },

    /// A write to an open log file failed
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A log file could not be read back
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    /// The requested log file does not exist
    #[error("{0} does not exist")]
    NotFound(String),
}

/// Main error type for sensorlog-rs operations
#[derive(Error, Debug)]
pub enum SensorLogError {
    /// Storage or sensor setup failed before any task started
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// Errors related to configuration loading, parsing or validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to the storage medium
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Errors related to a sensor source
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A worker thread could not be started
    #[error("Failed to spawn {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked before it could be joined
    #[error("Task {0} panicked")]
    TaskPanicked(String),

    /// The storage lock was poisoned by a panicking holder
    #[error("Storage lock poisoned")]
    LockPoisoned,

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SensorLogError>,
    },
}

impl SensorLogError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SensorLogError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error happened before the run started
    pub fn is_initialization(&self) -> bool {
        match self {
            SensorLogError::Initialization(_) | SensorLogError::Spawn { .. } => true,
            SensorLogError::WithContext { source, .. } => source.is_initialization(),
            _ => false,
        }
    }
}

impl From<toml::de::Error> for SensorLogError {
    fn from(err: toml::de::Error) -> Self {
        SensorLogError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SensorLogError {
    fn from(err: toml::ser::Error) -> Self {
        SensorLogError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SensorLogError {
    fn from(err: serde_json::Error) -> Self {
        SensorLogError::Serialization(err.to_string())
    }
}

/// Result type alias for sensorlog-rs operations
pub type Result<T> = std::result::Result<T, SensorLogError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<SensorLogError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
