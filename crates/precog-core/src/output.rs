//! # Output Buffer
//!
//! In-memory accumulation of encoded lines and best-effort flushing to
//! an append-only sink.
//!
//! A flush writes every buffered line in insertion order and clears the
//! buffer only when the sink accepted all of them. On failure the buffer
//! is left exactly as it was so the next flush retries the same lines.
//! There is no backpressure: a sink that keeps failing lets the buffer
//! grow without bound.

use crate::PrecogError;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// =============================================================================
// SINKS
// =============================================================================

/// Destination of flushed lines.
pub trait LineSink: Send {
    /// Append all lines, in order. Each line carries its own `\n`.
    fn append_lines(&mut self, lines: &[String]) -> Result<(), PrecogError>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

/// Appends to a JSONL file, opening it for each flush.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Create a sink for `path`, creating its parent directory.
    ///
    /// Directory creation failure is logged, not returned: the collector
    /// keeps running and each flush reports its own error.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Err(e) = Self::prepare(&path) {
            tracing::error!(path = %path.display(), error = %e, "Failed to initialize output");
        }
        Self { path }
    }

    /// Create the parent directory of `path` if absent.
    pub fn prepare(path: &Path) -> Result<(), PrecogError> {
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
                .map_err(|e| {
                    PrecogError::Initialization(format!(
                        "Cannot create directory '{}': {}",
                        dir.display(),
                        e
                    ))
                }),
            _ => Ok(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSink for FileSink {
    fn append_lines(&mut self, lines: &[String]) -> Result<(), PrecogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| PrecogError::Flush(format!("open '{}': {}", self.path.display(), e)))?;

        let mut writer = BufWriter::new(file);
        for line in lines {
            writer
                .write_all(line.as_bytes())
                .map_err(|e| PrecogError::Flush(format!("write: {}", e)))?;
        }
        writer
            .flush()
            .map_err(|e| PrecogError::Flush(format!("flush: {}", e)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Collects lines in memory; clones share the same storage.
///
/// Can be switched into a failing mode to exercise retry paths.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<bool>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Make subsequent appends fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut flag) = self.failing.lock() {
            *flag = failing;
        }
    }
}

impl LineSink for MemorySink {
    fn append_lines(&mut self, lines: &[String]) -> Result<(), PrecogError> {
        let failing = self.failing.lock().map(|flag| *flag).unwrap_or(true);
        if failing {
            return Err(PrecogError::Flush("memory sink is failing".to_string()));
        }
        let mut stored = self
            .lines
            .lock()
            .map_err(|_| PrecogError::Flush("memory sink poisoned".to_string()))?;
        stored.extend(lines.iter().cloned());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// =============================================================================
// OUTPUT BUFFER
// =============================================================================

/// Encoded lines waiting to be flushed.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    lines: Vec<String>,
    flush_threshold: usize,
}

impl OutputBuffer {
    #[must_use]
    pub fn new(flush_threshold: usize) -> Self {
        Self {
            lines: Vec::new(),
            flush_threshold,
        }
    }

    pub fn append(&mut self, line: String) {
        self.lines.push(line);
    }

    /// Whether enough lines are buffered to flush.
    #[must_use]
    pub fn should_flush(&self) -> bool {
        self.lines.len() >= self.flush_threshold
    }

    /// Write every buffered line to `sink`.
    ///
    /// Returns the number of lines written. The buffer is cleared only
    /// on success.
    pub fn flush(&mut self, sink: &mut dyn LineSink) -> Result<usize, PrecogError> {
        if self.lines.is_empty() {
            return Ok(0);
        }
        sink.append_lines(&self.lines)?;
        let written = self.lines.len();
        self.lines.clear();
        Ok(written)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
