// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call-boundary instrumentation.
//!
//! Each wrapper times one unit of work, logs one record when it ends, and folds the
//! result into the [`StatsRegistry`](crate::StatsRegistry). The work's own result is
//! returned untouched: errors are observed, never swallowed or replaced, and panics keep
//! unwinding.
//!
//! ```rust
//! use sherlock::{CallSite, log_performance};
//! use std::time::Duration;
//!
//! let site = CallSite::new("parse_port").slow_threshold(Duration::from_millis(100));
//! let port: Result<u16, std::num::ParseIntError> = log_performance(&site, || "8080".parse());
//! assert_eq!(port, Ok(8080));
//! ```
//!
//! Async work is wrapped the same way. The clock keeps running while the future is
//! suspended, so the duration is the latency a caller observes:
//!
//! ```rust
//! use sherlock::{CallSite, log_performance_async};
//!
//! # async fn example() {
//! let site = CallSite::new("fetch_user");
//! let user: Result<&str, std::io::Error> = log_performance_async(&site, async { Ok("ada") }).await;
//! assert_eq!(user.unwrap(), "ada");
//! # }
//! ```
//!
//! # Targets
//!
//! Timing records go to `PerformanceLogger` and resource records to `MonitoringLogger`
//! unless [`CallSite::logger`] says otherwise. A call site writes through the process-wide
//! manager unless bound to another one with [`CallSite::on`].

use crate::Level;
use crate::interval::{PerformanceTimer, ResourceTracker};
use crate::logger::Logger;
use crate::manager::LoggingManager;
use crate::resource::ResourceMonitor;
use crate::stats::StatsRegistry;
use serde_json::Value;
use std::fmt::Display;
use std::time::Duration;

/// Calls slower than this log at the elevated level unless the site overrides it.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_secs(1);

/// Per-site instrumentation settings. Build once, reuse for every call.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub(crate) name: String,
    pub(crate) normal_level: Level,
    pub(crate) elevated_level: Level,
    pub(crate) slow_threshold: Option<Duration>,
    pub(crate) memory_threshold: Option<u64>,
    pub(crate) min_duration: Option<Duration>,
    pub(crate) fields: Vec<(String, Value)>,
    pub(crate) logger: Option<String>,
    pub(crate) manager: Option<LoggingManager>,
    pub(crate) monitor: Option<ResourceMonitor>,
}

impl CallSite {
    /// A site named `name`: info level normally, warning above one second, no memory
    /// threshold.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            normal_level: Level::Info,
            elevated_level: Level::Warning,
            slow_threshold: Some(DEFAULT_SLOW_THRESHOLD),
            memory_threshold: None,
            min_duration: None,
            fields: Vec::new(),
            logger: None,
            manager: None,
            monitor: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calls taking longer than `threshold` log at the elevated level.
    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    /// Never escalate on duration.
    pub fn no_slow_threshold(mut self) -> Self {
        self.slow_threshold = None;
        self
    }

    /// Calls growing resident memory by more than `bytes` log at the elevated level.
    /// Only resource trackers sample memory.
    pub fn memory_threshold(mut self, bytes: u64) -> Self {
        self.memory_threshold = Some(bytes);
        self
    }

    /// Successful calls faster than this are counted but not logged.
    pub fn min_duration(mut self, duration: Duration) -> Self {
        self.min_duration = Some(duration);
        self
    }

    pub fn levels(mut self, normal: Level, elevated: Level) -> Self {
        self.normal_level = normal;
        self.elevated_level = elevated;
        self
    }

    /// A field attached to every record of this site.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Log to the logger with this name instead of the default.
    pub fn logger(mut self, name: impl Into<String>) -> Self {
        self.logger = Some(name.into());
        self
    }

    /// Write through `manager` instead of the process-wide one.
    pub fn on(mut self, manager: &LoggingManager) -> Self {
        self.manager = Some(manager.clone());
        self
    }

    /// Sample resources through `monitor` instead of [`ResourceMonitor::system`].
    pub fn monitor(mut self, monitor: ResourceMonitor) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub(crate) fn target_logger(&self, default: &str) -> Logger {
        let name = self.logger.as_deref().unwrap_or(default);
        match &self.manager {
            Some(manager) => manager.logger(name),
            None => crate::global_manager::get_logger(name),
        }
    }

    pub(crate) fn stats(&self) -> &StatsRegistry {
        match &self.manager {
            Some(manager) => manager.stats_registry().as_ref(),
            None => crate::global_manager::global_stats().as_ref(),
        }
    }

    pub(crate) fn resource_monitor(&self) -> &ResourceMonitor {
        self.monitor.as_ref().unwrap_or_else(|| ResourceMonitor::system())
    }
}

impl From<&str> for CallSite {
    fn from(name: &str) -> Self {
        CallSite::new(name)
    }
}

/// Times `work` and logs the outcome.
pub fn log_performance<T, E: Display>(site: &CallSite, work: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    let timer = PerformanceTimer::start(site);
    let result = work();
    timer.finish(&result);
    result
}

/// Times `work` and logs its resident-memory change.
pub fn monitor_memory<T, E: Display>(site: &CallSite, work: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    let tracker = ResourceTracker::memory(site);
    let result = work();
    tracker.finish(&result);
    result
}

/// Times `work` and logs memory, CPU share and thread count.
pub fn monitor_resources<T, E: Display>(site: &CallSite, work: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    let tracker = ResourceTracker::resources(site);
    let result = work();
    tracker.finish(&result);
    result
}

/// Async form of [`log_performance`]. Dropping the future before it completes logs a
/// `cancelled` outcome.
pub async fn log_performance_async<T, E, F>(site: &CallSite, work: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let timer = PerformanceTimer::start(site);
    let result = work.await;
    timer.finish(&result);
    result
}

/// Async form of [`monitor_memory`].
pub async fn monitor_memory_async<T, E, F>(site: &CallSite, work: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let tracker = ResourceTracker::memory(site);
    let result = work.await;
    tracker.finish(&result);
    result
}

/// Async form of [`monitor_resources`].
pub async fn monitor_resources_async<T, E, F>(site: &CallSite, work: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let tracker = ResourceTracker::resources(site);
    let result = work.await;
    tracker.finish(&result);
    result
}
