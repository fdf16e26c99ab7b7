// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide manager.
//!
//! Most programs want one logger graph for the whole process. This module holds that
//! manager in a `OnceLock` and exposes free functions over it. Libraries should prefer
//! taking a [`LoggingManager`] explicitly; these functions are for the application's entry
//! point.
//!
//! The first successful call to [`setup`] decides the configuration. A call that fails
//! installs nothing. Later calls, with or without a configuration, return the installed
//! manager and build nothing.
//!
//! ```no_run
//! use sherlock::{LoggingPresets, get_logger};
//!
//! sherlock::setup(Some(LoggingPresets::production())).unwrap();
//! get_logger("ApiLogger").info("service started");
//! ```
//!
//! [`get_logger`] may be called before [`setup`]: the handle resolves the global manager on
//! every call and writes to the last-resort stderr sink until one is installed.

use crate::config::LoggingConfig;
use crate::error::Error;
use crate::logger::Logger;
use crate::manager::LoggingManager;
use crate::stats::{LoggingStats, StatsRegistry};
use std::sync::{Arc, Mutex, OnceLock};

static GLOBAL_MANAGER: OnceLock<LoggingManager> = OnceLock::new();
static GLOBAL_STATS: OnceLock<Arc<StatsRegistry>> = OnceLock::new();
/// Serialises first installs, so two racing `setup` calls never build twice.
static INSTALL: Mutex<()> = Mutex::new(());

/// Counters of the process-wide manager. Exists before the manager does, so call sites
/// instrumented before [`setup`] are still counted.
pub(crate) fn global_stats() -> &'static Arc<StatsRegistry> {
    GLOBAL_STATS.get_or_init(|| Arc::new(StatsRegistry::new()))
}

fn install(config: LoggingConfig) -> LoggingManager {
    LoggingManager::with_stats(config, global_stats().clone())
}

/// Builds and installs the process-wide manager.
///
/// `None` means the default configuration. Nothing is installed until a build succeeds,
/// so a call that fails on a bad configuration can be retried with a fixed one. Once a
/// manager is installed, later calls return it and their `config` is ignored.
pub fn setup(config: Option<LoggingConfig>) -> Result<&'static LoggingManager, Error> {
    if let Some(manager) = GLOBAL_MANAGER.get() {
        manager.setup()?;
        return Ok(manager);
    }
    let _install = INSTALL.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(manager) = GLOBAL_MANAGER.get() {
        manager.setup()?;
        return Ok(manager);
    }
    let candidate = install(config.unwrap_or_default());
    candidate.setup()?;
    // `manager()` may have installed an unbuilt default in the meantime; it wins
    let _ = GLOBAL_MANAGER.set(candidate);
    let manager = GLOBAL_MANAGER.get_or_init(|| install(LoggingConfig::default()));
    manager.setup()?;
    Ok(manager)
}

/// The process-wide manager, installing one with the default configuration (but not
/// building it) if none exists yet.
pub fn manager() -> &'static LoggingManager {
    GLOBAL_MANAGER.get_or_init(|| install(LoggingConfig::default()))
}

pub(crate) fn installed() -> Option<&'static LoggingManager> {
    GLOBAL_MANAGER.get()
}

/// A logger on the process-wide manager.
pub fn get_logger(name: &str) -> Logger {
    Logger::global(name)
}

/// Stats of the process-wide manager, or `None` before one is installed.
pub fn get_logging_stats() -> Option<LoggingStats> {
    installed().map(LoggingManager::stats)
}

/// Configuration of the process-wide manager, or `None` before one is installed.
pub fn get_current_config() -> Option<&'static LoggingConfig> {
    installed().map(LoggingManager::config)
}
