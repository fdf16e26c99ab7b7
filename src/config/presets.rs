// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{LoggerNames, LoggerSpec, LoggingConfig, SinkSpec};
use crate::Level;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Ready-made configurations.
///
/// Every preset builds a fresh value; mutating one result never affects another.
///
/// ```rust
/// use sherlock::LoggingPresets;
///
/// let mut a = LoggingPresets::production();
/// let b = LoggingPresets::production();
/// a.log_files.clear();
/// assert!(!b.log_files.is_empty());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LoggingPresets;

impl LoggingPresets {
    /// Console plus the application log. No named loggers.
    pub fn minimal() -> LoggingConfig {
        let mut log_files = BTreeMap::new();
        log_files.insert("app".to_string(), SinkSpec::new("app.log"));
        LoggingConfig {
            log_files,
            loggers: BTreeMap::new(),
            ..LoggingConfig::default()
        }
    }

    /// Everything at debug level, except sinks that only collect errors.
    pub fn development() -> LoggingConfig {
        let mut config = LoggingConfig {
            console_level: Level::Debug.into(),
            root_level: Level::Debug.into(),
            ..LoggingConfig::default()
        };
        for (key, sink) in config.log_files.iter_mut() {
            let level = sink.level.resolve(key).unwrap_or(Level::Info);
            if level < Level::Error {
                sink.level = Level::Debug.into();
            }
        }
        for logger in config.loggers.values_mut() {
            logger.level = Level::Debug.into();
        }
        config
    }

    /// Console at warning; the API and service logs are disabled.
    pub fn production() -> LoggingConfig {
        let mut config = LoggingConfig {
            console_level: Level::Warning.into(),
            ..LoggingConfig::default()
        };
        for key in ["api", "services"] {
            if let Some(sink) = config.log_files.get_mut(key) {
                sink.enabled = false;
            }
        }
        config
    }

    /// Only the performance log, fed by a non-propagating `PerformanceLogger`.
    pub fn performance_only() -> LoggingConfig {
        let mut log_files = BTreeMap::new();
        log_files.insert("performance".to_string(), SinkSpec::new("performance.log"));
        let mut loggers = BTreeMap::new();
        loggers.insert(
            "performance".to_string(),
            LoggerSpec::new(LoggerNames::PERFORMANCE, &["performance"]).without_propagation(),
        );
        LoggingConfig {
            log_files,
            loggers,
            ..LoggingConfig::default()
        }
    }

    /// The default configuration with the filenames of some sinks replaced.
    ///
    /// Keys that name no default sink are ignored.
    pub fn custom_files<K, P>(overrides: &HashMap<K, P>) -> LoggingConfig
    where
        K: AsRef<str>,
        P: Into<PathBuf> + Clone,
    {
        let mut config = LoggingConfig::default();
        for (key, filename) in overrides {
            if let Some(sink) = config.log_files.get_mut(key.as_ref()) {
                sink.filename = filename.clone().into();
            }
        }
        config
    }
}
