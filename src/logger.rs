// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named logger handles.
//!
//! A [`Logger`] is a name plus the manager it writes through. Handles are resolved at
//! emit time, so one can be created before the graph exists and stored anywhere.
//!
//! Building a record and dispatching it are separate steps, which lets callers attach
//! fields between the two:
//!
//! ```rust
//! use sherlock::{Level, LoggingManager};
//!
//! let manager = LoggingManager::default();
//! let logger = manager.logger("ApiLogger");
//! if logger.enabled(Level::Warning) {
//!     let mut record = logger.record(Level::Warning);
//!     record.log("slow upstream");
//!     record.field("upstream", "billing");
//!     logger.emit(&record);
//! }
//! ```

use crate::Level;
use crate::log_record::LogRecord;
use crate::manager::{LoggingManager, last_resort};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Target {
    Manager(LoggingManager),
    /// Whatever manager [`crate::setup`] installs, looked up on every call.
    Global,
}

/// A handle to one named logger.
#[derive(Debug, Clone)]
pub struct Logger {
    name: Arc<str>,
    target: Target,
}

impl Logger {
    pub(crate) fn bound(name: &str, manager: LoggingManager) -> Self {
        Self {
            name: Arc::from(name),
            target: Target::Manager(manager),
        }
    }

    pub(crate) fn global(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            target: Target::Global,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn manager(&self) -> Option<&LoggingManager> {
        match &self.target {
            Target::Manager(manager) => Some(manager),
            Target::Global => crate::global_manager::installed(),
        }
    }

    /// Whether a record at `level` would be written anywhere.
    pub fn enabled(&self, level: Level) -> bool {
        match self.manager() {
            Some(manager) => manager.enabled(&self.name, level),
            None => level >= Level::Warning,
        }
    }

    /// A fresh record carrying this logger's name and the current correlation id.
    pub fn record(&self, level: Level) -> LogRecord {
        LogRecord::new(level, &*self.name)
    }

    /// Dispatches a finished record.
    pub fn emit(&self, record: &LogRecord) {
        match self.manager() {
            Some(manager) => manager.dispatch(&self.name, record),
            None => last_resort(record),
        }
    }

    pub fn log(&self, level: Level, message: impl AsRef<str>) {
        if !self.enabled(level) {
            return;
        }
        let mut record = self.record(level);
        record.log(message.as_ref());
        self.emit(&record);
    }

    /// Logs `message` with structured fields attached.
    pub fn log_fields<K, V>(&self, level: Level, message: impl AsRef<str>, fields: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        if !self.enabled(level) {
            return;
        }
        let mut record = self.record(level);
        record.log(message.as_ref());
        for (key, value) in fields {
            record.field(key, value);
        }
        self.emit(&record);
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(Level::Info, message);
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(Level::Error, message);
    }

    pub fn critical(&self, message: impl AsRef<str>) {
        self.log(Level::Critical, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggingConfig, LoggingPresets, ROOT_LOGGER};
    use crate::context::RequestContext;
    use crate::inmemory_sink::InMemorySink;

    fn configured() -> (LoggingManager, Arc<InMemorySink>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            logs_dir: dir.path().to_path_buf(),
            console_enabled: false,
            ..LoggingPresets::development()
        };
        let manager = LoggingManager::new(config);
        manager.setup().unwrap();
        let sink = Arc::new(InMemorySink::new());
        manager.attach_sink(ROOT_LOGGER, sink.clone());
        (manager, sink, dir)
    }

    #[test]
    fn level_helpers_set_the_level() {
        let (manager, sink, _dir) = configured();
        let logger = manager.logger("checkout");
        logger.debug("d");
        logger.info("i");
        logger.warning("w");
        logger.error("e");
        logger.critical("c");
        let levels: Vec<Level> = sink.records().iter().map(|r| r.level()).collect();
        assert_eq!(
            levels,
            vec![Level::Debug, Level::Info, Level::Warning, Level::Error, Level::Critical]
        );
        assert!(sink.records().iter().all(|r| r.logger_name() == "checkout"));
    }

    #[test]
    fn fields_travel_with_the_record() {
        let (manager, sink, _dir) = configured();
        manager
            .logger("orders")
            .log_fields(Level::Info, "created", [("order_id", Value::from(42)), ("currency", "EUR".into())]);
        let records = sink.records();
        assert_eq!(records[0].get_field("order_id"), Some(&Value::from(42)));
        assert!(sink.drain_logs().contains("order_id=42"));
    }

    #[test]
    fn records_carry_the_correlation_id() {
        let (manager, sink, _dir) = configured();
        {
            let _scope = RequestContext::scope("req-9");
            manager.logger("x").info("inside");
        }
        manager.logger("x").info("outside");
        let records = sink.records();
        assert_eq!(records[0].correlation_id(), Some("req-9"));
        assert_eq!(records[1].correlation_id(), None);
        let lines = sink.lines();
        assert!(lines[0].contains("req-9"));
        assert!(lines[1].contains(crate::context::NO_REQUEST_ID));
    }

    #[test]
    fn unconfigured_handles_only_pass_warnings() {
        let manager = LoggingManager::default();
        let logger = manager.logger("early");
        assert!(!logger.enabled(Level::Info));
        assert!(logger.enabled(Level::Error));
        // goes to stderr, must not panic
        logger.error("before setup");
        assert_eq!(manager.stats().records_emitted, 0);
    }
}
