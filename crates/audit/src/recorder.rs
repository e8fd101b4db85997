//! Fire-and-forget audit recorder.
//!
//! The recorder isolates the sink's failure domain: `record` never returns
//! an error, so audit persistence problems cannot fail the operation that
//! triggered the entry.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::entry::AuditEntry;

#[derive(Debug, Error)]
pub enum AuditSinkError {
    #[error("audit sink write failed: {0}")]
    Write(String),

    /// Append failed due to internal lock poisoning.
    #[error("audit sink lock poisoned")]
    Poisoned,
}

/// Append-only destination for audit entries.
pub trait AuditSink: Send + Sync {
    fn append(&self, entry: AuditEntry) -> Result<(), AuditSinkError>;
}

/// In-memory sink backed by a mutexed vector.
///
/// Intended for tests/dev. Entries are append-only; there is no mutation
/// or deletion API.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded entries (clone; the log itself stays
    /// untouched).
    pub fn snapshot(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn append(&self, entry: AuditEntry) -> Result<(), AuditSinkError> {
        let mut entries = self.entries.lock().map_err(|_| AuditSinkError::Poisoned)?;
        entries.push(entry);
        Ok(())
    }
}

/// Records entries without ever failing the caller.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Append an entry. Sink failures are logged and swallowed.
    pub fn record(&self, entry: AuditEntry) {
        let tag = entry.action.tag();
        if let Err(e) = self.sink.append(entry) {
            tracing::error!(action = tag, error = %e, "failed to persist audit entry");
        }
    }
}
