// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log record type.
//!
//! A [`LogRecord`] carries everything a sink needs to render one line: the wall-clock
//! timestamp, the correlation identifier of the unit of work that produced it, the logger
//! name, the level, the message and any key/value fields attached by the caller.
//!
//! Records are built incrementally. The message is accumulated from parts with
//! [`LogRecord::log`] and [`LogRecord::log_owned`], and fields are attached with
//! [`LogRecord::field`]:
//!
//! ```rust
//! use sherlock::{Level, LogRecord};
//!
//! let mut record = LogRecord::new(Level::Info, "ApiLogger");
//! record.log("GET /users ");
//! record.log_owned(format!("-> {}", 200));
//! record.field("status", 200);
//! assert_eq!(record.message(), "GET /users -> 200");
//! ```

use crate::Level;
use crate::context::RequestContext;
use chrono::{DateTime, Local};
use serde_json::Value;

/**
A log record.

The correlation identifier is captured from the current [`RequestContext`] when the record
is created, so a record built on one thread and written on another still carries the id of
the unit of work that produced it.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    timestamp: DateTime<Local>,
    level: Level,
    logger_name: String,
    correlation_id: Option<String>,
    message: String,
    fields: Vec<(String, Value)>,
}

impl LogRecord {
    pub fn new(level: Level, logger_name: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            logger_name: logger_name.into(),
            correlation_id: RequestContext::get(),
            message: String::new(),
            fields: Vec::new(),
        }
    }

    /**
    Append the message part to the record.
    */
    pub fn log(&mut self, message: &str) {
        self.message.push_str(message);
    }

    /**
    Append the message part to the record, taking ownership of it.
    */
    pub fn log_owned(&mut self, message: String) {
        if self.message.is_empty() {
            self.message = message;
        } else {
            self.message.push_str(&message);
        }
    }

    /// Attaches a key/value field. A later field with the same key replaces the earlier one.
    pub fn field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Overrides the correlation identifier captured at construction.
    pub fn set_correlation_id(&mut self, id: Option<String>) {
        self.correlation_id = id;
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn get_field(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/*
Boilerplate notes for LogRecord:

- Clone: records are fanned out to several sinks.
- PartialEq: handy in tests. Not Eq, since serde_json::Value floats are not Eq.
- No Default: a record without a logger name has nowhere to be routed.
- No Display: rendering depends on the sink's format, see crate::format.
*/
