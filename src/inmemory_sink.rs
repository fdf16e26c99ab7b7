// SPDX-License-Identifier: MIT OR Apache-2.0

//! # In-Memory Sink
//!
//! A sink that keeps rendered lines in memory instead of writing them anywhere.
//! It exists for tests: attach one to a manager with
//! [`LoggingManager::attach_sink`](crate::LoggingManager::attach_sink), run the code under
//! test, then inspect what was logged.
//!
//! ```rust
//! use sherlock::{InMemorySink, LoggingManager, LoggingPresets};
//! use std::sync::Arc;
//!
//! let dir = std::env::temp_dir().join("sherlock-doc-inmemory");
//! let mut config = LoggingPresets::minimal();
//! config.logs_dir = dir;
//! config.console_enabled = false;
//! let manager = LoggingManager::new(config);
//! manager.setup().unwrap();
//!
//! let sink = Arc::new(InMemorySink::new());
//! manager.attach_sink("root", sink.clone());
//! manager.logger("anything").info("hello");
//! assert!(sink.drain_logs().contains("hello"));
//! ```

use crate::Level;
use crate::format::RecordFormatter;
use crate::log_record::LogRecord;
use crate::sink::Sink;
use std::sync::Mutex;

/// An in-memory sink that stores rendered lines in a `Vec<String>`.
///
/// Thread-safe; share it with `Arc`. The raw [`LogRecord`]s are kept alongside the
/// rendered lines so tests can assert on levels and fields without parsing text.
#[derive(Debug)]
pub struct InMemorySink {
    level: Level,
    formatter: RecordFormatter,
    logs: Mutex<Vec<(String, LogRecord)>>,
}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug: derived, required by Sink
// - Default: Debug floor, default text template, empty buffer
// - Clone: NOT implemented, two clones would silently capture different halves of a run
// - PartialEq/Eq/Hash: NOT implemented, mutex contents are not a meaningful identity

impl Default for InMemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySink {
    /// Creates a sink accepting every level, rendering with the default text template.
    pub fn new() -> Self {
        Self::with_formatter(Level::Debug, RecordFormatter::default())
    }

    pub fn with_formatter(level: Level, formatter: RecordFormatter) -> Self {
        Self {
            level,
            formatter,
            logs: Mutex::new(Vec::new()),
        }
    }

    /// Drains all lines into a single string joined by newlines, clearing the buffer.
    pub fn drain_logs(&self) -> String {
        let mut logs = self.logs.lock().unwrap_or_else(|e| e.into_inner());
        let result = logs
            .iter()
            .map(|(line, _)| line.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        logs.clear();
        result
    }

    /// Rendered lines captured so far, without clearing.
    pub fn lines(&self) -> Vec<String> {
        let logs = self.logs.lock().unwrap_or_else(|e| e.into_inner());
        logs.iter().map(|(line, _)| line.clone()).collect()
    }

    /// Records captured so far, without clearing.
    pub fn records(&self) -> Vec<LogRecord> {
        let logs = self.logs.lock().unwrap_or_else(|e| e.into_inner());
        logs.iter().map(|(_, record)| record.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.logs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for InMemorySink {
    fn level(&self) -> Level {
        self.level
    }

    fn finish_log_record(&self, record: &LogRecord) {
        let line = self.formatter.render(record);
        let mut logs = self.logs.lock().unwrap_or_else(|e| e.into_inner());
        logs.push((line, record.clone()));
    }

    fn prepare_to_die(&self) {
        // nothing buffered outside the vector
    }
}
