// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of [`LogRecord`]s into single lines.
//!
//! Two formats exist. [`LogFormat::Text`] fills a template whose placeholders are
//! `{timestamp}`, `{correlation_id}`, `{logger}`, `{level}`, `{message}` and `{fields}`.
//! Unknown placeholders are written through untouched. [`LogFormat::Json`] writes one
//! JSON object per line with the keys `timestamp`, `correlation_id`, `logger_name`,
//! `level` and `message`, followed by every attached field.

use crate::context::NO_REQUEST_ID;
use crate::log_record::LogRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Write;

pub const DEFAULT_TEMPLATE: &str =
    "{timestamp} - {correlation_id} - {logger} - {level} - {message}{fields}";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output format of every sink in a logger graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Renders records according to a [`LogFormat`], template and strftime date format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFormatter {
    format: LogFormat,
    template: String,
    date_format: String,
}

impl Default for RecordFormatter {
    fn default() -> Self {
        Self::new(LogFormat::Text, DEFAULT_TEMPLATE, DEFAULT_DATE_FORMAT)
    }
}

impl RecordFormatter {
    pub fn new(format: LogFormat, template: impl Into<String>, date_format: impl Into<String>) -> Self {
        Self {
            format,
            template: template.into(),
            date_format: date_format.into(),
        }
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Renders one record, without the trailing newline.
    pub fn render(&self, record: &LogRecord) -> String {
        match self.format {
            LogFormat::Text => self.render_text(record),
            LogFormat::Json => self.render_json(record),
        }
    }

    /// An unusable date format falls back to [`DEFAULT_DATE_FORMAT`].
    fn timestamp(&self, record: &LogRecord) -> String {
        let mut out = String::new();
        if write!(out, "{}", record.timestamp().format(&self.date_format)).is_err() {
            out.clear();
            let _ = write!(out, "{}", record.timestamp().format(DEFAULT_DATE_FORMAT));
        }
        out
    }

    fn render_text(&self, record: &LogRecord) -> String {
        let mut out = String::with_capacity(self.template.len() + record.message().len() + 32);
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                rest = "";
                break;
            };
            match &after[..close] {
                "timestamp" => out.push_str(&self.timestamp(record)),
                "correlation_id" => {
                    out.push_str(record.correlation_id().unwrap_or(NO_REQUEST_ID))
                }
                "logger" => out.push_str(record.logger_name()),
                "level" => out.push_str(record.level().as_str()),
                "message" => out.push_str(record.message()),
                "fields" => {
                    if !record.fields().is_empty() {
                        out.push_str(" |");
                        for (key, value) in record.fields() {
                            match value {
                                Value::String(s) => {
                                    let _ = write!(out, " {key}={s}");
                                }
                                other => {
                                    let _ = write!(out, " {key}={other}");
                                }
                            }
                        }
                    }
                }
                unknown => {
                    out.push('{');
                    out.push_str(unknown);
                    out.push('}');
                }
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }

    fn render_json(&self, record: &LogRecord) -> String {
        let mut map = Map::new();
        map.insert("timestamp".into(), Value::String(self.timestamp(record)));
        map.insert(
            "correlation_id".into(),
            Value::String(record.correlation_id().unwrap_or(NO_REQUEST_ID).to_string()),
        );
        map.insert("logger_name".into(), Value::String(record.logger_name().to_string()));
        map.insert("level".into(), Value::String(record.level().as_str().to_string()));
        map.insert("message".into(), Value::String(record.message().to_string()));
        for (key, value) in record.fields() {
            // the fixed keys win over a field with the same name
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(map).to_string()
    }
}
