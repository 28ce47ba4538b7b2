//! Line-oriented output for status, diagnostics and the end-of-run report
//!
//! Operational logging goes through `tracing`; the [`OutputSink`] carries
//! only what the user is meant to read: startup failures, the saved log
//! contents and the counter summary.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Destination for user-facing lines
pub trait OutputSink: Send {
    /// Write one line; the sink adds the line terminator
    fn write_line(&mut self, line: &str);

    /// Flush buffered output
    fn flush(&mut self) {}
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn write_line(&mut self, line: &str) {
        (**self).write_line(line)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

/// Writes to standard output
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_line(&mut self, line: &str) {
        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", line) {
            tracing::warn!("Failed to write to stdout: {}", e);
        }
    }

    fn flush(&mut self) {
        if let Err(e) = io::stdout().flush() {
            tracing::warn!("Failed to flush stdout: {}", e);
        }
    }
}

/// Collects lines in memory; clones share the buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|line| line.contains(needle))
    }
}

impl OutputSink for MemorySink {
    fn write_line(&mut self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

/// Forwards every line to an inner sink and also records it in a file
pub struct TranscriptSink<S> {
    inner: S,
    path: PathBuf,
    file: BufWriter<File>,
    failed: bool,
}

impl<S: OutputSink> TranscriptSink<S> {
    /// Create or truncate the transcript at `path`
    pub fn create(path: impl AsRef<Path>, inner: S) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = BufWriter::new(File::create(&path)?);
        tracing::info!(path = %path.display(), "Saving output transcript");
        Ok(Self {
            inner,
            path,
            file,
            failed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<S: OutputSink> OutputSink for TranscriptSink<S> {
    fn write_line(&mut self, line: &str) {
        self.inner.write_line(line);
        if self.failed {
            return;
        }
        if let Err(e) = writeln!(self.file, "{}", line) {
            // Keep echoing to the inner sink; stop retrying the file
            self.failed = true;
            tracing::warn!(path = %self.path.display(), "Transcript write failed: {}", e);
        }
    }

    fn flush(&mut self) {
        self.inner.flush();
        if let Err(e) = self.file.flush() {
            tracing::warn!(path = %self.path.display(), "Transcript flush failed: {}", e);
        }
    }
}

impl<S> Drop for TranscriptSink<S> {
    fn drop(&mut self) {
        let _ = self.file.flush();
    }
}
