//! Diagnostics reported to the editor console.
//!
//! The coordinator reports user-facing outcomes ("module loaded", "build
//! failed") as `(severity, message)` pairs through a [`DiagnosticSink`].
//! [`TracingSink`] only forwards them to `tracing`; [`MessageLog`] also keeps
//! them in memory so a console view can list and filter them.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Severity of a console message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

// ---------------------------------------------------------------------------
// DiagnosticSink
// ---------------------------------------------------------------------------

/// Receives user-facing diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, severity: Severity, message: &str);
}

/// Forward a diagnostic to `tracing` at the matching level.
fn emit(severity: Severity, message: &str) {
    match severity {
        Severity::Info => tracing::info!(target: "zone::console", "{message}"),
        Severity::Warning => tracing::warn!(target: "zone::console", "{message}"),
        Severity::Error => tracing::error!(target: "zone::console", "{message}"),
    }
}

/// Sink that only emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, severity: Severity, message: &str) {
        emit(severity, message);
    }
}

// ---------------------------------------------------------------------------
// MessageLog
// ---------------------------------------------------------------------------

/// One console entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub severity: Severity,
    pub message: String,
}

/// In-memory console. Clones share the same message list.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Arc<Mutex<Vec<LogMessage>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every message, oldest first.
    pub fn messages(&self) -> Vec<LogMessage> {
        self.lock().clone()
    }

    /// Messages of exactly the given severity.
    pub fn filter(&self, severity: Severity) -> Vec<LogMessage> {
        self.lock()
            .iter()
            .filter(|m| m.severity == severity)
            .cloned()
            .collect()
    }

    /// `true` if any message of the given severity contains `needle`.
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.lock()
            .iter()
            .any(|m| m.severity == severity && m.message.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogMessage>> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiagnosticSink for MessageLog {
    fn report(&self, severity: Severity, message: &str) {
        emit(severity, message);
        self.lock().push(LogMessage {
            severity,
            message: message.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_messages() {
        let log = MessageLog::new();
        let console = log.clone();

        log.report(Severity::Info, "loaded");
        log.report(Severity::Warning, "missing artifact");

        assert_eq!(console.len(), 2);
        assert_eq!(console.filter(Severity::Warning).len(), 1);
        assert!(console.contains(Severity::Warning, "artifact"));
        assert!(!console.contains(Severity::Error, "artifact"));

        console.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn severities_order_by_importance() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert_eq!(Severity::Warning.to_string(), "warning");
    }
}
