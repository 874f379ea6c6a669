#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Structured JSON logging utilities shared across swarmkit crates.
//!
//! Besides the file-backed [`JsonLogger`], the crate carries the process-wide
//! logger registry: a binary attaches one [`Logger`] at startup via
//! [`attach`] and releases it with [`detach`] during shutdown. Library code
//! routes records through [`emit`], which stays silent while nothing is
//! attached.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// Log severity level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Debug information.
    Debug,
    /// Informational events.
    Info,
    /// Warning indicator.
    Warn,
    /// Error indicator.
    Error,
    /// Unrecoverable failure; the emitter is about to abort.
    Fatal,
}

/// Structured log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Timestamp in ISO8601.
    pub timestamp: DateTime<Utc>,
    /// Module emitting the log.
    pub module: String,
    /// Optional origin tag identifying the emitting entity (a run id, a
    /// unit id) within the module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Arbitrary JSON payload for metrics/fields.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl LogRecord {
    /// Creates a record with the provided info.
    #[must_use]
    pub fn new(module: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            module: module.into(),
            origin: None,
            level,
            message: message.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Tags the record with an origin.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Sink for structured log records.
pub trait Logger: Send + Sync {
    /// Writes one record to the sink.
    fn log(&self, record: &LogRecord) -> Result<()>;
}

/// Logger that discards every record. Substitutable anywhere a [`Logger`]
/// is expected.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _record: &LogRecord) -> Result<()> {
        Ok(())
    }
}

/// Thread-safe JSON logger with append-only semantics.
#[derive(Debug)]
pub struct JsonLogger {
    path: PathBuf,
    writer: Mutex<File>,
}

impl JsonLogger {
    /// Creates or opens a logger at the desired path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    /// Writes a log record as JSON line.
    pub fn log(&self, record: &LogRecord) -> Result<()> {
        self.write_record(record)
    }

    fn write_record(&self, record: &LogRecord) -> Result<()> {
        let mut writer = self.writer.lock();
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Returns the underlying file path (useful for tests).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Logger for JsonLogger {
    fn log(&self, record: &LogRecord) -> Result<()> {
        self.write_record(record)
    }
}

static GLOBAL_LOGGER: RwLock<Option<Arc<dyn Logger>>> = RwLock::new(None);

/// Attaches the process-wide logger. Replaces any previously attached one.
pub fn attach(logger: Arc<dyn Logger>) {
    *GLOBAL_LOGGER.write() = Some(logger);
}

/// Detaches the process-wide logger, returning it if one was attached.
pub fn detach() -> Option<Arc<dyn Logger>> {
    GLOBAL_LOGGER.write().take()
}

/// Returns a handle to the attached logger, if any.
#[must_use]
pub fn global() -> Option<Arc<dyn Logger>> {
    GLOBAL_LOGGER.read().clone()
}

/// Routes a record to the attached logger. No-op while nothing is attached.
pub fn emit(record: &LogRecord) -> Result<()> {
    match global() {
        Some(logger) => logger.log(record),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_json_lines() {
        let dir = tempdir().unwrap();
        let logger = JsonLogger::new(dir.path().join("test.log")).unwrap();
        logger
            .log(&LogRecord::new("module", LogLevel::Info, "hello"))
            .unwrap();
        let content = fs::read_to_string(logger.path()).unwrap();
        assert!(content.contains("\"message\":\"hello\""));
    }

    #[test]
    fn serializes_origin_tag_only_when_present() {
        let bare = serde_json::to_string(&LogRecord::new("m", LogLevel::Debug, "x")).unwrap();
        assert!(!bare.contains("origin"));
        let tagged = serde_json::to_string(
            &LogRecord::new("m", LogLevel::Warn, "x").with_origin("run-7"),
        )
        .unwrap();
        assert!(tagged.contains("\"origin\":\"run-7\""));
    }

    #[test]
    fn attach_emit_detach_lifecycle() {
        let dir = tempdir().unwrap();
        let logger = Arc::new(JsonLogger::new(dir.path().join("global.log")).unwrap());
        let path = logger.path().to_path_buf();

        // Nothing attached: emit is a silent no-op.
        assert!(detach().is_none());
        emit(&LogRecord::new("m", LogLevel::Info, "dropped")).unwrap();

        attach(logger);
        emit(&LogRecord::new("m", LogLevel::Fatal, "kept")).unwrap();
        assert!(detach().is_some());
        emit(&LogRecord::new("m", LogLevel::Info, "dropped again")).unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("kept"));
        assert!(!content.contains("dropped"));
    }
}
