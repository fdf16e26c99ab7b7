// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarative logging configuration.
//!
//! A [`LoggingConfig`] names a set of sinks ([`SinkSpec`]) and a set of loggers
//! ([`LoggerSpec`]) bound to those sinks. It is plain data: nothing is opened until
//! [`LoggingManager::setup`](crate::LoggingManager::setup) builds the graph from it.
//!
//! # Defaults
//!
//! [`LoggingConfig::default`] is fully populated: an application sink, an error-only sink,
//! one sink each for the API, database and service layers, and performance and monitoring
//! sinks, each rotated at 10 MiB with 5 backups, plus a logger wired to each layer sink.
//! The performance and monitoring loggers do not propagate to the root logger.
//!
//! Override only what you need with struct-update syntax:
//!
//! ```rust
//! use sherlock::{LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig {
//!     log_format_type: LogFormat::Json,
//!     console_enabled: false,
//!     ..LoggingConfig::default()
//! };
//! assert!(config.log_files.contains_key("errors"));
//! ```
//!
//! A collection that is explicitly empty stays empty; call [`LoggingConfig::with_defaults`]
//! to fill it. Deserialized configurations are always passed through `with_defaults`.
//!
//! # Sink routing
//!
//! Each enabled logger writes to the sinks it lists. Enabled sinks that no enabled logger
//! lists are attached to the root logger, together with the console sink.

mod logger_spec;
mod presets;
mod sink_spec;

pub use logger_spec::LoggerSpec;
pub use presets::LoggingPresets;
pub use sink_spec::{DEFAULT_BACKUP_COUNT, DEFAULT_ENCODING, DEFAULT_MAX_BYTES, SinkSpec};

use crate::Level;
use crate::error::Error;
use crate::format::{DEFAULT_DATE_FORMAT, DEFAULT_TEMPLATE, LogFormat, RecordFormatter};
use crate::level::LevelSpec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// Name under which the root logger is looked up.
pub const ROOT_LOGGER: &str = "root";

/// Names of the loggers in the default configuration.
#[derive(Debug, Clone, Copy)]
pub struct LoggerNames;

impl LoggerNames {
    pub const API: &'static str = "ApiLogger";
    pub const DATABASE: &'static str = "DatabaseLogger";
    pub const SERVICES: &'static str = "ServiceLogger";
    pub const PERFORMANCE: &'static str = "PerformanceLogger";
    pub const MONITORING: &'static str = "MonitoringLogger";
}

/// Every logger name the default configuration defines.
pub fn list_available_loggers() -> Vec<&'static str> {
    vec![
        LoggerNames::API,
        LoggerNames::DATABASE,
        LoggerNames::SERVICES,
        LoggerNames::PERFORMANCE,
        LoggerNames::MONITORING,
    ]
}

/// Complete logging configuration. See the [module docs](self).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ConfigDocument")]
pub struct LoggingConfig {
    /// Directory relative sink filenames resolve against; created on setup.
    pub logs_dir: PathBuf,
    pub log_format_type: LogFormat,
    /// Text template, see [`crate::format`].
    pub log_format: String,
    /// strftime-style timestamp format.
    pub date_format: String,
    pub console_enabled: bool,
    pub console_level: LevelSpec,
    pub root_level: LevelSpec,
    /// Sink key → sink.
    pub log_files: BTreeMap<String, SinkSpec>,
    /// Logger key → logger.
    pub loggers: BTreeMap<String, LoggerSpec>,
    /// Third-party component name → minimum level.
    pub external_loggers: BTreeMap<String, LevelSpec>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("logs"),
            log_format_type: LogFormat::Text,
            log_format: DEFAULT_TEMPLATE.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            console_enabled: true,
            console_level: Level::Info.into(),
            root_level: Level::Info.into(),
            log_files: BTreeMap::new(),
            loggers: BTreeMap::new(),
            external_loggers: BTreeMap::new(),
        }
        .with_defaults()
    }
}

impl LoggingConfig {
    /// Replaces every empty collection with its default set.
    pub fn with_defaults(mut self) -> Self {
        if self.log_files.is_empty() {
            self.log_files = default_log_files();
        }
        if self.loggers.is_empty() {
            self.loggers = default_loggers();
        }
        if self.external_loggers.is_empty() {
            self.external_loggers = default_external_loggers();
        }
        self
    }

    /// Checks everything [`LoggingManager::setup`](crate::LoggingManager::setup) would
    /// reject, without touching the filesystem.
    pub fn validate(&self) -> Result<(), Error> {
        self.resolve().map(drop)
    }

    /// Where the sink with `key` writes, if it exists.
    pub fn sink_path(&self, key: &str) -> Option<PathBuf> {
        self.log_files.get(key).map(|sink| self.resolve_path(sink))
    }

    fn resolve_path(&self, sink: &SinkSpec) -> PathBuf {
        if sink.filename.is_absolute() {
            sink.filename.clone()
        } else {
            self.logs_dir.join(&sink.filename)
        }
    }

    pub(crate) fn formatter(&self) -> RecordFormatter {
        RecordFormatter::new(self.log_format_type, &self.log_format, &self.date_format)
    }

    /// Validates and resolves levels and paths. Disabled entries are validated but left out.
    pub(crate) fn resolve(&self) -> Result<ResolvedConfig, Error> {
        validate_date_format(&self.date_format)?;
        let console_level = self.console_level.resolve("console_level")?;
        let console = self.console_enabled.then_some(console_level);
        let root_level = self.root_level.resolve("root_level")?;

        let mut sinks = Vec::new();
        for (key, sink) in &self.log_files {
            let level = sink.level.resolve(&format!("log_files.{key}.level"))?;
            if sink.filename.as_os_str().is_empty() {
                return Err(Error::config(format!("log_files.{key}.filename"), "must not be empty"));
            }
            if !is_utf8(&sink.encoding) {
                return Err(Error::config(
                    format!("log_files.{key}.encoding"),
                    format!("unsupported encoding {:?}, only utf-8 is written", sink.encoding),
                ));
            }
            if sink.backup_count > 0 && sink.max_bytes == 0 {
                return Err(Error::InvalidRotation {
                    sink: key.clone(),
                    message: format!("backup_count is {} but max_bytes is 0", sink.backup_count),
                });
            }
            if sink.enabled {
                sinks.push(ResolvedSink {
                    key: key.clone(),
                    path: self.resolve_path(sink),
                    level,
                    max_bytes: sink.max_bytes,
                    backup_count: sink.backup_count,
                });
            }
        }

        let mut loggers = Vec::new();
        let mut names = HashSet::new();
        for (key, logger) in &self.loggers {
            let level = logger.level.resolve(&format!("loggers.{key}.level"))?;
            if logger.name.is_empty() {
                return Err(Error::config(format!("loggers.{key}.name"), "must not be empty"));
            }
            if logger.name == ROOT_LOGGER {
                return Err(Error::config(
                    format!("loggers.{key}.name"),
                    format!("`{ROOT_LOGGER}` is reserved for the root logger"),
                ));
            }
            let mut sink_keys: Vec<String> = Vec::with_capacity(logger.log_files.len());
            for sink in &logger.log_files {
                if !self.log_files.contains_key(sink) {
                    return Err(Error::UnknownSink {
                        logger: logger.name.clone(),
                        sink: sink.clone(),
                    });
                }
                if !sink_keys.contains(sink) {
                    sink_keys.push(sink.clone());
                }
            }
            if logger.enabled {
                if !names.insert(logger.name.as_str()) {
                    return Err(Error::config(
                        format!("loggers.{key}.name"),
                        format!("logger name `{}` is used twice", logger.name),
                    ));
                }
                loggers.push(ResolvedLogger {
                    name: logger.name.clone(),
                    level,
                    sink_keys,
                    propagate: logger.propagate,
                });
            }
        }

        let mut external = Vec::with_capacity(self.external_loggers.len());
        for (name, level) in &self.external_loggers {
            external.push((name.clone(), level.resolve(&format!("external_loggers.{name}"))?));
        }

        Ok(ResolvedConfig {
            console,
            root_level,
            sinks,
            loggers,
            external,
        })
    }
}

/// A configuration that passed validation, with levels and paths resolved.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    /// Console floor, `None` when the console is disabled.
    pub(crate) console: Option<Level>,
    pub(crate) root_level: Level,
    pub(crate) sinks: Vec<ResolvedSink>,
    pub(crate) loggers: Vec<ResolvedLogger>,
    pub(crate) external: Vec<(String, Level)>,
}

#[derive(Debug, Clone)]
pub(crate) struct ResolvedSink {
    pub(crate) key: String,
    pub(crate) path: PathBuf,
    pub(crate) level: Level,
    pub(crate) max_bytes: u64,
    pub(crate) backup_count: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct ResolvedLogger {
    pub(crate) name: String,
    pub(crate) level: Level,
    pub(crate) sink_keys: Vec<String>,
    pub(crate) propagate: bool,
}

fn is_utf8(encoding: &str) -> bool {
    matches!(
        encoding.to_ascii_lowercase().replace('_', "-").as_str(),
        "utf-8" | "utf8"
    )
}

fn validate_date_format(format: &str) -> Result<(), Error> {
    use chrono::format::{Item, StrftimeItems};
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::config("date_format", format!("{format:?} is not a valid strftime format")));
    }
    Ok(())
}

fn default_log_files() -> BTreeMap<String, SinkSpec> {
    [
        ("app", SinkSpec::new("app.log")),
        ("errors", SinkSpec::new("errors.log").with_level(Level::Error)),
        ("api", SinkSpec::new("api.log")),
        ("database", SinkSpec::new("database.log")),
        ("services", SinkSpec::new("services.log")),
        ("performance", SinkSpec::new("performance.log")),
        ("monitoring", SinkSpec::new("monitoring.log")),
    ]
    .into_iter()
    .map(|(key, sink)| (key.to_string(), sink))
    .collect()
}

fn default_loggers() -> BTreeMap<String, LoggerSpec> {
    [
        ("api", LoggerSpec::new(LoggerNames::API, &["api"])),
        ("database", LoggerSpec::new(LoggerNames::DATABASE, &["database"])),
        ("services", LoggerSpec::new(LoggerNames::SERVICES, &["services"])),
        (
            "performance",
            LoggerSpec::new(LoggerNames::PERFORMANCE, &["performance"]).without_propagation(),
        ),
        (
            "monitoring",
            LoggerSpec::new(LoggerNames::MONITORING, &["monitoring"]).without_propagation(),
        ),
    ]
    .into_iter()
    .map(|(key, logger)| (key.to_string(), logger))
    .collect()
}

fn default_external_loggers() -> BTreeMap<String, LevelSpec> {
    [("uvicorn", Level::Info), ("fastapi", Level::Info)]
        .into_iter()
        .map(|(name, level)| (name.to_string(), level.into()))
        .collect()
}

/// Wire shape of [`LoggingConfig`]: every field optional, defaults filled on conversion.
#[derive(Deserialize)]
#[serde(default)]
struct ConfigDocument {
    logs_dir: PathBuf,
    log_format_type: LogFormat,
    log_format: String,
    date_format: String,
    console_enabled: bool,
    console_level: LevelSpec,
    root_level: LevelSpec,
    log_files: BTreeMap<String, SinkSpec>,
    loggers: BTreeMap<String, LoggerSpec>,
    external_loggers: BTreeMap<String, LevelSpec>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        let base = LoggingConfig {
            log_files: BTreeMap::new(),
            loggers: BTreeMap::new(),
            external_loggers: BTreeMap::new(),
            ..LoggingConfig::default()
        };
        Self {
            logs_dir: base.logs_dir,
            log_format_type: base.log_format_type,
            log_format: base.log_format,
            date_format: base.date_format,
            console_enabled: base.console_enabled,
            console_level: base.console_level,
            root_level: base.root_level,
            log_files: base.log_files,
            loggers: base.loggers,
            external_loggers: base.external_loggers,
        }
    }
}

impl From<ConfigDocument> for LoggingConfig {
    fn from(doc: ConfigDocument) -> Self {
        LoggingConfig {
            logs_dir: doc.logs_dir,
            log_format_type: doc.log_format_type,
            log_format: doc.log_format,
            date_format: doc.date_format,
            console_enabled: doc.console_enabled,
            console_level: doc.console_level,
            root_level: doc.root_level,
            log_files: doc.log_files,
            loggers: doc.loggers,
            external_loggers: doc.external_loggers,
        }
        .with_defaults()
    }
}
