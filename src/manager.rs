// SPDX-License-Identifier: MIT OR Apache-2.0

//! The logging manager: owns a configuration, builds the logger graph from it exactly once,
//! and hands out [`Logger`]s.
//!
//! ```rust
//! use sherlock::{LoggingManager, LoggingPresets};
//!
//! let mut config = LoggingPresets::minimal();
//! config.logs_dir = std::env::temp_dir().join("sherlock-doc-manager");
//! let manager = LoggingManager::new(config);
//! manager.setup().unwrap();
//! manager.setup().unwrap(); // no-op
//! assert_eq!(manager.stats().builds, 1);
//!
//! manager.logger("ApiLogger").info("ready");
//! ```
//!
//! # Concurrency
//!
//! `setup` may race from any number of threads. The first caller builds under a mutex and
//! publishes the finished graph through a `OnceLock`; every other caller either waits for
//! that build or observes the published graph. Readers never see a partially built graph.
//! A failed build publishes nothing and can be retried.

use crate::Level;
use crate::config::{LoggingConfig, ROOT_LOGGER};
use crate::console_sink::ConsoleSink;
use crate::error::Error;
use crate::graph::Graph;
use crate::log_record::LogRecord;
use crate::logger::Logger;
use crate::sink::Sink;
use crate::stats::{LoggingStats, StatsRegistry};
use std::fmt::Debug;
use std::sync::{Arc, Mutex, OnceLock};

/// Records below this level are dropped while no graph exists.
const LAST_RESORT_LEVEL: Level = Level::Warning;

static LAST_RESORT: OnceLock<ConsoleSink> = OnceLock::new();

/// Writes to stderr when no graph is available.
pub(crate) fn last_resort(record: &LogRecord) {
    if record.level() >= LAST_RESORT_LEVEL {
        LAST_RESORT
            .get_or_init(|| ConsoleSink::new(LAST_RESORT_LEVEL, Default::default()))
            .finish_log_record(record);
    }
}

/// Owns one logger graph. Cheap to clone; clones share the graph and the stats.
#[derive(Clone)]
pub struct LoggingManager {
    shared: Arc<Shared>,
}

struct Shared {
    config: LoggingConfig,
    graph: OnceLock<Graph>,
    build: Mutex<()>,
    stats: Arc<StatsRegistry>,
}

impl Debug for LoggingManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingManager")
            .field("logs_dir", &self.shared.config.logs_dir)
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

impl Default for LoggingManager {
    fn default() -> Self {
        Self::new(LoggingConfig::default())
    }
}

impl LoggingManager {
    /// Takes `config` as given; nothing is validated or opened until [`Self::setup`].
    pub fn new(config: LoggingConfig) -> Self {
        Self::with_stats(config, Arc::new(StatsRegistry::new()))
    }

    /// A manager that counts into an existing registry.
    pub fn with_stats(config: LoggingConfig, stats: Arc<StatsRegistry>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                graph: OnceLock::new(),
                build: Mutex::new(()),
                stats,
            }),
        }
    }

    /**
    Builds the logger graph. Idempotent.

    Every configuration error is reported before the filesystem is touched. After the
    first success, further calls return `Ok(())` without opening anything, so each sink is
    attached exactly once no matter how often this runs.
    */
    pub fn setup(&self) -> Result<(), Error> {
        self.shared.stats.note_setup_call();
        if self.shared.graph.get().is_some() {
            return Ok(());
        }
        let _build = self.shared.build.lock().unwrap_or_else(|e| e.into_inner());
        if self.shared.graph.get().is_some() {
            return Ok(());
        }

        let config = &self.shared.config;
        let resolved = config.resolve()?;
        std::fs::create_dir_all(&config.logs_dir).map_err(|e| Error::io(&config.logs_dir, e))?;
        let graph = Graph::build(&resolved, &config.formatter())?;
        let files = graph.files_opened();
        // we hold the build lock and checked above, so this cannot already be set
        let _ = self.shared.graph.set(graph);
        self.shared.stats.note_build(files);

        self.root().log(
            Level::Debug,
            format!(
                "logging configured: {} file sinks, {} named loggers, logs in {}",
                files,
                resolved.loggers.len(),
                config.logs_dir.display()
            ),
        );
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.shared.graph.get().is_some()
    }

    /// A handle to the logger called `name`.
    ///
    /// Names the graph does not know resolve to the root logger; the records still carry
    /// `name`. The handle can be taken before setup and starts writing to the graph once
    /// it exists.
    pub fn logger(&self, name: &str) -> Logger {
        Logger::bound(name, self.clone())
    }

    pub fn root(&self) -> Logger {
        self.logger(ROOT_LOGGER)
    }

    /// Attaches an extra sink to a configured logger (`"root"` for the root logger).
    ///
    /// Returns `false` if setup has not run or no logger has that name.
    pub fn attach_sink(&self, logger: &str, sink: Arc<dyn Sink>) -> bool {
        match self.shared.graph.get() {
            Some(graph) => graph.attach(logger, sink),
            None => false,
        }
    }

    /// The configuration this manager builds from.
    pub fn config(&self) -> &LoggingConfig {
        &self.shared.config
    }

    /// An owned snapshot of the counters and per-call-site aggregates.
    pub fn stats(&self) -> LoggingStats {
        let loggers = self
            .shared
            .graph
            .get()
            .map(Graph::summary)
            .unwrap_or_default();
        LoggingStats::collect(
            &self.shared.stats,
            self.is_configured(),
            self.shared.config.logs_dir.clone(),
            loggers,
        )
    }

    pub fn stats_registry(&self) -> &Arc<StatsRegistry> {
        &self.shared.stats
    }

    /// Flushes every sink in the graph.
    pub fn flush(&self) {
        if let Some(graph) = self.shared.graph.get() {
            graph.flush();
        }
    }

    /// Whether a record at `level` from `logger` would reach the graph.
    pub fn enabled(&self, logger: &str, level: Level) -> bool {
        match self.shared.graph.get() {
            Some(graph) => level >= graph.node(logger).level(),
            None => level >= LAST_RESORT_LEVEL,
        }
    }

    pub(crate) fn dispatch(&self, logger: &str, record: &LogRecord) {
        match self.shared.graph.get() {
            Some(graph) => {
                let node = graph.node(logger);
                if record.level() < node.level() {
                    return;
                }
                if graph.write(node, record) {
                    self.shared.stats.note_record();
                }
            }
            None => last_resort(record),
        }
    }

    /// Whether two handles share one graph.
    pub fn ptr_eq(&self, other: &LoggingManager) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

/*
Boilerplate notes.

Clone: yes, a handle.  Copies share everything.
PartialEq: identity is ptr_eq; data equality of two managers means nothing.
Default: the default configuration.
Send/Sync: yes, shared across every thread that logs.
*/
