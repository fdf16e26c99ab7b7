// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running aggregates for instrumented call sites and the logger-graph builder.
//!
//! A [`StatsRegistry`] is shared by a [`LoggingManager`](crate::LoggingManager) and every
//! instrumentation wrapper bound to it. Callers only ever add to it; reads go through
//! [`StatsRegistry::snapshot`] and friends, which return owned copies.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Aggregates for one instrumented call site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSiteStats {
    pub invocations: u64,
    pub failures: u64,
    #[serde(serialize_with = "as_millis")]
    pub total_duration: Duration,
    #[serde(serialize_with = "as_millis")]
    pub min_duration: Duration,
    #[serde(serialize_with = "as_millis")]
    pub max_duration: Duration,
    /// Mean duration over all invocations.
    #[serde(serialize_with = "as_millis")]
    pub avg_duration: Duration,
    pub last_seen: DateTime<Local>,
}

impl CallSiteStats {
    fn first(duration: Duration, failed: bool) -> Self {
        Self {
            invocations: 1,
            failures: u64::from(failed),
            total_duration: duration,
            min_duration: duration,
            max_duration: duration,
            avg_duration: duration,
            last_seen: Local::now(),
        }
    }

    fn add(&mut self, duration: Duration, failed: bool) {
        self.invocations += 1;
        self.failures += u64::from(failed);
        self.total_duration += duration;
        self.min_duration = self.min_duration.min(duration);
        self.max_duration = self.max_duration.max(duration);
        self.avg_duration = self.total_duration / u32::try_from(self.invocations).unwrap_or(u32::MAX);
        self.last_seen = Local::now();
    }

    pub fn successes(&self) -> u64 {
        self.invocations - self.failures
    }
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

/// Shared, append-only counters.
#[derive(Debug, Default)]
pub struct StatsRegistry {
    sites: Mutex<HashMap<String, CallSiteStats>>,
    setup_calls: AtomicU64,
    builds: AtomicU64,
    sinks_opened: AtomicU64,
    records_emitted: AtomicU64,
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one finished invocation of `site` into its aggregate.
    pub fn record_call(&self, site: &str, duration: Duration, failed: bool) {
        let mut sites = self.sites.lock().unwrap_or_else(|e| e.into_inner());
        match sites.get_mut(site) {
            Some(stats) => stats.add(duration, failed),
            None => {
                sites.insert(site.to_string(), CallSiteStats::first(duration, failed));
            }
        }
    }

    /// The aggregate for one site, if it has been called.
    pub fn call_site(&self, site: &str) -> Option<CallSiteStats> {
        self.sites
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(site)
            .cloned()
    }

    /// Every site, ordered by name.
    pub fn call_sites(&self) -> BTreeMap<String, CallSiteStats> {
        self.sites
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn records_emitted(&self) -> u64 {
        self.records_emitted.load(Ordering::Relaxed)
    }

    pub(crate) fn note_setup_call(&self) {
        self.setup_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn note_build(&self, sinks_opened: usize) {
        self.builds.fetch_add(1, Ordering::Relaxed);
        self.sinks_opened
            .fetch_add(sinks_opened as u64, Ordering::Relaxed);
    }

    pub(crate) fn note_record(&self) {
        self.records_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn counters(&self) -> BuilderCounters {
        BuilderCounters {
            setup_calls: self.setup_calls.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            sinks_opened: self.sinks_opened.load(Ordering::Relaxed),
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct BuilderCounters {
    pub(crate) setup_calls: u64,
    pub(crate) builds: u64,
    pub(crate) sinks_opened: u64,
    pub(crate) records_emitted: u64,
}

/// Point-in-time view of a manager, returned by
/// [`LoggingManager::stats`](crate::LoggingManager::stats).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingStats {
    /// Whether the graph has been built.
    pub configured: bool,
    pub logs_dir: PathBuf,
    /// Calls to `setup`, including the ones that found the graph already built.
    pub setup_calls: u64,
    /// Successful graph builds. Never more than one per manager.
    pub builds: u64,
    pub sinks_opened: u64,
    pub records_emitted: u64,
    /// Logger name → number of sinks attached directly to it. The root logger is listed
    /// as `root`.
    pub loggers: BTreeMap<String, usize>,
    pub call_sites: BTreeMap<String, CallSiteStats>,
}

impl LoggingStats {
    pub(crate) fn collect(
        registry: &StatsRegistry,
        configured: bool,
        logs_dir: PathBuf,
        loggers: BTreeMap<String, usize>,
    ) -> Self {
        let counters = registry.counters();
        Self {
            configured,
            logs_dir,
            setup_calls: counters.setup_calls,
            builds: counters.builds,
            sinks_opened: counters.sinks_opened,
            records_emitted: counters.records_emitted,
            loggers,
            call_sites: registry.call_sites(),
        }
    }

    pub fn call_site(&self, site: &str) -> Option<&CallSiteStats> {
        self.call_sites.get(site)
    }

    /// Renders the snapshot as JSON, for diagnostics endpoints.
    pub fn to_json(&self) -> serde_json::Value {
        // every field serializes infallibly
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn aggregates_min_avg_max() {
        let registry = StatsRegistry::new();
        registry.record_call("load", Duration::from_millis(10), false);
        registry.record_call("load", Duration::from_millis(30), true);
        registry.record_call("load", Duration::from_millis(20), false);

        let stats = registry.call_site("load").unwrap();
        assert_eq!(stats.invocations, 3);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.successes(), 2);
        assert_eq!(stats.min_duration, Duration::from_millis(10));
        assert_eq!(stats.max_duration, Duration::from_millis(30));
        assert_eq!(stats.avg_duration, Duration::from_millis(20));
        assert!(registry.call_site("other").is_none());
    }

    #[test]
    fn snapshots_do_not_move() {
        let registry = StatsRegistry::new();
        registry.record_call("a", Duration::from_millis(1), false);
        let before = registry.call_sites();
        registry.record_call("a", Duration::from_millis(1), false);
        assert_eq!(before["a"].invocations, 1);
        assert_eq!(registry.call_sites()["a"].invocations, 2);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let registry = Arc::new(StatsRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        registry.record_call("shared", Duration::from_micros(5), i % 2 == 0);
                        registry.note_record();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let stats = registry.call_site("shared").unwrap();
        assert_eq!(stats.invocations, 800);
        assert_eq!(stats.failures, 400);
        assert_eq!(registry.records_emitted(), 800);
    }

    #[test]
    fn stats_serialize_durations_as_milliseconds() {
        let registry = StatsRegistry::new();
        registry.record_call("q", Duration::from_millis(250), false);
        registry.record_call("q", Duration::from_millis(750), true);
        let stats = LoggingStats::collect(&registry, true, PathBuf::from("logs"), BTreeMap::new());
        let json = stats.to_json();
        assert_eq!(json["call_sites"]["q"]["invocations"], 2);
        assert_eq!(json["call_sites"]["q"]["max_duration"], 750.0);
        assert_eq!(json["call_sites"]["q"]["avg_duration"], 500.0);
        assert_eq!(json["configured"], true);
    }
}
