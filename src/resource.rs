// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process resource sampling: resident memory, CPU time and thread count.
//!
//! Sampling goes through a [`ResourceReader`]. On Linux the default reader parses
//! `/proc/self/status` and `/proc/self/schedstat` (falling back to `/proc/self/stat`).
//! Elsewhere the default reader samples nothing, and every delta computed from its
//! snapshots is zero.
//!
//! ```rust
//! use sherlock::ResourceMonitor;
//!
//! let before = ResourceMonitor::snapshot();
//! let buffer = vec![0u8; 1 << 20];
//! let after = ResourceMonitor::snapshot();
//! let usage = before.usage_until(&after);
//! println!("{} ({} threads)", ResourceMonitor::format_bytes(usage.memory_after), usage.threads);
//! # drop(buffer);
//! ```

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Linux reports `/proc/<pid>/stat` times in USER_HZ, which is 100 on every supported
/// architecture.
const CLOCK_TICKS_PER_SEC: u64 = 100;

/// One sample of the current process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSnapshot {
    pub taken_at: Instant,
    /// Resident set size.
    pub rss_bytes: Option<u64>,
    /// CPU time consumed by the whole process so far.
    pub cpu_time: Option<Duration>,
    pub threads: Option<u64>,
}

impl ResourceSnapshot {
    /// An empty sample taken now.
    pub fn unavailable() -> Self {
        Self {
            taken_at: Instant::now(),
            rss_bytes: None,
            cpu_time: None,
            threads: None,
        }
    }

    /// What happened between this snapshot and `later`. A delta is zero unless both
    /// readings it compares are present.
    pub fn usage_until(&self, later: &ResourceSnapshot) -> ResourceUsage {
        let memory_before = self.rss_bytes.or(later.rss_bytes).unwrap_or(0);
        let memory_after = later.rss_bytes.or(self.rss_bytes).unwrap_or(0);
        let memory_delta = match (self.rss_bytes, later.rss_bytes) {
            (Some(before), Some(after)) => after as i64 - before as i64,
            _ => 0,
        };
        let wall = later.taken_at.saturating_duration_since(self.taken_at);
        let cpu = match (self.cpu_time, later.cpu_time) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            _ => Duration::ZERO,
        };
        let cpu_percent = if wall.is_zero() {
            0.0
        } else {
            cpu.as_secs_f64() / wall.as_secs_f64() * 100.0
        };
        ResourceUsage {
            memory_before,
            memory_after,
            memory_delta,
            cpu_percent,
            threads: later.threads.or(self.threads).unwrap_or(0),
        }
    }
}

/// Difference between two [`ResourceSnapshot`]s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceUsage {
    pub memory_before: u64,
    pub memory_after: u64,
    pub memory_delta: i64,
    /// CPU time over wall time; may exceed 100 with several busy threads.
    pub cpu_percent: f64,
    pub threads: u64,
}

/// A source of [`ResourceSnapshot`]s.
pub trait ResourceReader: Debug + Send + Sync {
    fn read(&self) -> ResourceSnapshot;
}

/// Reads the procfs directory of one process.
#[derive(Debug, Clone)]
pub struct ProcfsReader {
    dir: PathBuf,
}

impl Default for ProcfsReader {
    fn default() -> Self {
        Self::new("/proc/self")
    }
}

impl ProcfsReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_file(&self, name: &str) -> Option<String> {
        fs::read_to_string(self.dir.join(name)).ok()
    }
}

impl ResourceReader for ProcfsReader {
    fn read(&self) -> ResourceSnapshot {
        let taken_at = Instant::now();
        let (rss_bytes, threads) = self
            .read_file("status")
            .map(|status| parse_status(&status))
            .unwrap_or((None, None));
        let cpu_time = self
            .read_file("schedstat")
            .and_then(|s| parse_schedstat(&s))
            .or_else(|| self.read_file("stat").and_then(|s| parse_stat(&s)));
        ResourceSnapshot {
            taken_at,
            rss_bytes,
            cpu_time,
            threads,
        }
    }
}

/// Samples nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReader;

impl ResourceReader for NullReader {
    fn read(&self) -> ResourceSnapshot {
        ResourceSnapshot::unavailable()
    }
}

/// `VmRSS` (kB) and `Threads` from `/proc/<pid>/status`.
fn parse_status(status: &str) -> (Option<u64>, Option<u64>) {
    let mut rss = None;
    let mut threads = None;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            rss = rest
                .split_whitespace()
                .next()
                .and_then(|kb| kb.parse::<u64>().ok())
                .map(|kb| kb * 1024);
        } else if let Some(rest) = line.strip_prefix("Threads:") {
            threads = rest.trim().parse::<u64>().ok();
        }
    }
    (rss, threads)
}

/// First field of `/proc/<pid>/schedstat`: nanoseconds spent on a CPU.
fn parse_schedstat(schedstat: &str) -> Option<Duration> {
    schedstat
        .split_whitespace()
        .next()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_nanos)
}

/// `utime + stime` from `/proc/<pid>/stat`.
fn parse_stat(stat: &str) -> Option<Duration> {
    // the command name may contain spaces and parentheses; fields resume after the last ')'
    let rest = &stat[stat.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let utime = fields.get(11)?.parse::<u64>().ok()?;
    let stime = fields.get(12)?.parse::<u64>().ok()?;
    let ticks = utime + stime;
    Some(Duration::from_millis(ticks * 1000 / CLOCK_TICKS_PER_SEC))
}

/// Samples the current process through a [`ResourceReader`].
#[derive(Debug, Clone)]
pub struct ResourceMonitor {
    reader: Arc<dyn ResourceReader>,
}

static SYSTEM: OnceLock<ResourceMonitor> = OnceLock::new();

impl ResourceMonitor {
    pub fn new(reader: Arc<dyn ResourceReader>) -> Self {
        Self { reader }
    }

    /// The platform's default monitor.
    pub fn system() -> &'static ResourceMonitor {
        SYSTEM.get_or_init(|| {
            let reader: Arc<dyn ResourceReader> = if cfg!(target_os = "linux") && Path::new("/proc/self/status").exists() {
                Arc::new(ProcfsReader::default())
            } else {
                Arc::new(NullReader)
            };
            ResourceMonitor::new(reader)
        })
    }

    /// A sample from the platform's default monitor.
    pub fn snapshot() -> ResourceSnapshot {
        Self::system().sample()
    }

    pub fn sample(&self) -> ResourceSnapshot {
        self.reader.read()
    }

    /// Renders a byte count with a binary unit, e.g. `1.50 MB`.
    pub fn format_bytes(bytes: u64) -> String {
        const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
        if bytes < 1024 {
            return format!("{bytes} B");
        }
        let mut value = bytes as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        format!("{value:.2} {}", UNITS[unit])
    }

    /// Like [`Self::format_bytes`] with a sign, for deltas.
    pub fn format_delta(delta: i64) -> String {
        let sign = if delta < 0 { "-" } else { "+" };
        format!("{sign}{}", Self::format_bytes(delta.unsigned_abs()))
    }
}
