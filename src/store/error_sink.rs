use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// A failure reported by one of the entry points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub message: String,
    pub script_id: String,
    pub document_id: Option<String>,
    pub document_internal_id: Option<String>,
    pub logged_at: DateTime<Utc>,
}

impl ErrorLogEntry {
    pub fn new(message: impl Into<String>, script_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            script_id: script_id.into(),
            document_id: None,
            document_internal_id: None,
            logged_at: Utc::now(),
        }
    }

    pub fn with_document(mut self, document_id: Option<String>, internal_id: Option<String>) -> Self {
        self.document_id = document_id;
        self.document_internal_id = internal_id;
        self
    }
}

/// Receiver of error reports. Reporting never fails the caller.
pub trait ErrorSink {
    fn log_error(&self, entry: &ErrorLogEntry);
}

/// Writes error reports to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn log_error(&self, entry: &ErrorLogEntry) {
        error!(
            "[{}] {} (document: {}, internal id: {})",
            entry.script_id,
            entry.message,
            entry.document_id.as_deref().unwrap_or("-"),
            entry.document_internal_id.as_deref().unwrap_or("-"),
        );
    }
}

/// Keeps error reports in memory.
#[derive(Debug, Default)]
pub struct MemoryErrorSink {
    entries: Mutex<Vec<ErrorLogEntry>>,
}

impl MemoryErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ErrorLogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ErrorSink for MemoryErrorSink {
    fn log_error(&self, entry: &ErrorLogEntry) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry.clone()),
            Err(poisoned) => poisoned.into_inner().push(entry.clone()),
        }
    }
}
