//! Fixed-capacity ring of operational events for the telemetry sidebar.
//!
//! ```rust
//! use neuroforge_core::log::{LogSink, LogSource};
//!
//! let mut sink = LogSink::new();
//! for n in 0..8 {
//!     sink.append(LogSource::System, format!("event {n}"));
//! }
//! let messages: Vec<_> = sink.entries().map(|e| e.message.as_str()).collect();
//! assert_eq!(messages, ["event 3", "event 4", "event 5", "event 6", "event 7"]);
//! ```
use std::{collections::VecDeque, fmt::Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of entries the sidebar keeps.
pub const LOG_CAPACITY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogSource {
    System,
    Ai,
    User,
}

impl Display for LogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogSource::System => write!(f, "SYSTEM"),
            LogSource::Ai => write!(f, "AI"),
            LogSource::User => write!(f, "USER"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub source: LogSource,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only ring; the oldest entry is evicted once [`LOG_CAPACITY`] is
/// reached.
#[derive(Debug, Clone)]
pub struct LogSink {
    entries: VecDeque<LogEntry>,
    next_id: u64,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(LOG_CAPACITY),
            next_id: 0,
        }
    }

    /// Push one entry stamped with the current time and return a reference
    /// to it.
    pub fn append(&mut self, source: LogSource, message: impl Into<String>) -> &LogEntry {
        if self.entries.len() == LOG_CAPACITY {
            self.entries.pop_front();
        }

        self.next_id += 1;
        self.entries.push_back(LogEntry {
            id: self.next_id,
            source,
            message: message.into(),
            timestamp: Utc::now(),
        });

        &self.entries[self.entries.len() - 1]
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
