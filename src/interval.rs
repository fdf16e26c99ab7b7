// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Scoped measurements.

A [`PerformanceTimer`] or [`ResourceTracker`] starts measuring when created and logs
exactly once: when [`finish`](PerformanceTimer::finish)ed, or otherwise when dropped.
A drop while the thread is panicking records a `panicked` outcome; any other unfinished
drop (for example an async task dropped mid-await) records `cancelled`.

```rust
use sherlock::{CallSite, PerformanceTimer};

let site = CallSite::new("rebuild_index");
let timer = PerformanceTimer::start(&site);
let result: Result<usize, String> = Ok(42);
timer.finish(&result);
```
*/

use crate::Level;
use crate::config::LoggerNames;
use crate::instrument::CallSite;
use crate::log_record::LogRecord;
use crate::resource::{ResourceMonitor, ResourceSnapshot, ResourceUsage};
use std::fmt::Display;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Performance,
    Memory,
    Resources,
}

impl Kind {
    fn tag(self) -> &'static str {
        match self {
            Kind::Performance => "PERFORMANCE",
            Kind::Memory => "MEMORY",
            Kind::Resources => "RESOURCES",
        }
    }

    fn default_logger(self) -> &'static str {
        match self {
            Kind::Performance => LoggerNames::PERFORMANCE,
            Kind::Memory | Kind::Resources => LoggerNames::MONITORING,
        }
    }
}

#[derive(Debug)]
enum Outcome {
    Success,
    Error { kind: &'static str, message: String },
    Panicked,
    Cancelled,
}

impl Outcome {
    fn of<T, E: Display>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(e) => Outcome::Error {
                kind: std::any::type_name::<E>(),
                message: e.to_string(),
            },
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error { .. } => "error",
            Outcome::Panicked => "panicked",
            Outcome::Cancelled => "cancelled",
        }
    }

    fn is_failure(&self) -> bool {
        !matches!(self, Outcome::Success)
    }
}

/// `core::num::error::ParseIntError` → `ParseIntError`, keeping generic arguments.
fn short_type_name(full: &str) -> &str {
    let head = full.find('<').map_or(full, |i| &full[..i]);
    match head.rfind("::") {
        Some(i) => &full[i + 2..],
        None => full,
    }
}

/// Shared core of the timer and the trackers.
#[derive(Debug)]
struct Interval<'a> {
    site: &'a CallSite,
    kind: Kind,
    start: Instant,
    before: Option<ResourceSnapshot>,
    correlation_id: Option<String>,
    finished: bool,
}

impl<'a> Interval<'a> {
    fn start(site: &'a CallSite, kind: Kind) -> Self {
        let before = match kind {
            Kind::Performance => None,
            Kind::Memory | Kind::Resources => Some(site.resource_monitor().sample()),
        };
        Self {
            site,
            kind,
            correlation_id: crate::context::RequestContext::get(),
            before,
            // last, so sampling is not part of the measurement
            start: Instant::now(),
            finished: false,
        }
    }

    fn complete(&mut self, outcome: Outcome) {
        self.finished = true;
        let duration = self.start.elapsed();
        let usage = self
            .before
            .map(|before| before.usage_until(&self.site.resource_monitor().sample()));
        let failed = outcome.is_failure();
        self.site.stats().record_call(&self.site.name, duration, failed);

        if !failed && self.site.min_duration.is_some_and(|min| duration < min) {
            return;
        }
        let level = self.level(&outcome, duration, usage.as_ref());
        let logger = self.site.target_logger(self.kind.default_logger());
        if !logger.enabled(level) {
            return;
        }
        let mut record = logger.record(level);
        record.set_correlation_id(self.correlation_id.clone());
        self.describe(&mut record, &outcome, duration, usage.as_ref());
        logger.emit(&record);
    }

    fn level(&self, outcome: &Outcome, duration: Duration, usage: Option<&ResourceUsage>) -> Level {
        if outcome.is_failure() {
            return Level::Error;
        }
        let slow = self.site.slow_threshold.is_some_and(|t| duration > t);
        let heavy = match (self.site.memory_threshold, usage) {
            (Some(threshold), Some(usage)) => usage.memory_delta > 0 && usage.memory_delta as u64 > threshold,
            _ => false,
        };
        if slow || heavy {
            self.site.elevated_level
        } else {
            self.site.normal_level
        }
    }

    fn describe(&self, record: &mut LogRecord, outcome: &Outcome, duration: Duration, usage: Option<&ResourceUsage>) {
        let status = outcome.as_str().to_ascii_uppercase();
        record.log_owned(format!(
            "{} | {} | {} | {:.3}s",
            self.kind.tag(),
            self.site.name,
            status,
            duration.as_secs_f64()
        ));
        if let Some(usage) = usage {
            match self.kind {
                Kind::Memory => record.log_owned(format!(
                    " | Current: {} | Change: {}",
                    ResourceMonitor::format_bytes(usage.memory_after),
                    ResourceMonitor::format_delta(usage.memory_delta)
                )),
                Kind::Resources => record.log_owned(format!(
                    " | CPU: {:.1}% | Memory: {} ({}) | Threads: {}",
                    usage.cpu_percent,
                    ResourceMonitor::format_bytes(usage.memory_after),
                    ResourceMonitor::format_delta(usage.memory_delta),
                    usage.threads
                )),
                Kind::Performance => {}
            }
        }
        if let Outcome::Error { kind, message } = outcome {
            record.log_owned(format!(" | {}: {}", short_type_name(kind), message));
        }

        record.field("function", self.site.name.as_str());
        record.field("duration_ms", duration.as_secs_f64() * 1000.0);
        record.field("outcome", outcome.as_str());
        if let Some(usage) = usage {
            record.field("memory_before_bytes", usage.memory_before);
            record.field("memory_after_bytes", usage.memory_after);
            record.field("memory_delta_bytes", usage.memory_delta);
            if self.kind == Kind::Resources {
                record.field("cpu_percent", usage.cpu_percent);
                record.field("threads", usage.threads);
            }
        }
        if let Outcome::Error { kind, message } = outcome {
            record.field("error_kind", *kind);
            record.field("error", message.as_str());
        }
        for (key, value) in &self.site.fields {
            record.field(key.as_str(), value.clone());
        }
    }
}

impl Drop for Interval<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let outcome = if std::thread::panicking() {
                Outcome::Panicked
            } else {
                Outcome::Cancelled
            };
            self.complete(outcome);
        }
    }
}

/// Times a block of code. See the [module docs](self).
#[derive(Debug)]
#[must_use = "the timer logs when dropped; bind it to a variable"]
pub struct PerformanceTimer<'a> {
    interval: Interval<'a>,
}

impl<'a> PerformanceTimer<'a> {
    pub fn start(site: &'a CallSite) -> Self {
        Self {
            interval: Interval::start(site, Kind::Performance),
        }
    }

    /// Time since the timer started.
    pub fn elapsed(&self) -> Duration {
        self.interval.start.elapsed()
    }

    /// Logs the outcome of `result`.
    pub fn finish<T, E: Display>(mut self, result: &Result<T, E>) {
        self.interval.complete(Outcome::of(result));
    }

    /// Logs a success.
    pub fn finish_ok(mut self) {
        self.interval.complete(Outcome::Success);
    }
}

/// Measures a block's time and resource use. See the [module docs](self).
#[derive(Debug)]
#[must_use = "the tracker logs when dropped; bind it to a variable"]
pub struct ResourceTracker<'a> {
    interval: Interval<'a>,
}

impl<'a> ResourceTracker<'a> {
    /// Tracks resident-memory change.
    pub fn memory(site: &'a CallSite) -> Self {
        Self {
            interval: Interval::start(site, Kind::Memory),
        }
    }

    /// Tracks memory, CPU share and thread count.
    pub fn resources(site: &'a CallSite) -> Self {
        Self {
            interval: Interval::start(site, Kind::Resources),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.interval.start.elapsed()
    }

    pub fn finish<T, E: Display>(mut self, result: &Result<T, E>) {
        self.interval.complete(Outcome::of(result));
    }

    pub fn finish_ok(mut self) {
        self.interval.complete(Outcome::Success);
    }
}

/*
boilerplate notes.

1.  Copy, clone, no.  Two clones would log the same interval twice.
2.  PartialEq, Ord, etc.  No, there is nothing meaningful to compare.
3.  Default, no, an interval needs a call site and a start time.
4.  Send/Sync, yes when the call site is.
 */
