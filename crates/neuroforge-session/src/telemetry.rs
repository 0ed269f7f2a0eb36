use std::sync::{Arc, Mutex};

use neuroforge_core::log::{LogEntry, LogSink, LogSource};

use crate::lock;

/// Shared handle on the session's [`LogSink`].
///
/// Every entry is mirrored to `tracing` so the ring's five lines are never
/// the only record of what happened.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    sink: Arc<Mutex<LogSink>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, source: LogSource, message: impl Into<String>) {
        let mut sink = lock(&self.sink);
        let entry = sink.append(source, message);
        tracing::info!(source = %entry.source, id = entry.id, "{}", entry.message);
    }

    pub fn system(&self, message: impl Into<String>) {
        self.record(LogSource::System, message);
    }

    pub fn ai(&self, message: impl Into<String>) {
        self.record(LogSource::Ai, message);
    }

    pub fn user(&self, message: impl Into<String>) {
        self.record(LogSource::User, message);
    }

    /// Current entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        lock(&self.sink).entries().cloned().collect()
    }
}
