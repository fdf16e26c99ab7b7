//SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# sherlock

sherlock is a logging library for services: a declarative logger graph, request
correlation, and call-boundary instrumentation.

# The graph

A [`LoggingConfig`] describes sinks (rotating files, plus the console) and named loggers
routed to them. [`LoggingManager::setup`] validates the configuration, opens every enabled
sink and builds the graph exactly once, no matter how often or from how many threads it is
called.

```rust
use sherlock::{LoggingManager, LoggingPresets, LoggerNames};

let mut config = LoggingPresets::development();
config.logs_dir = std::env::temp_dir().join("sherlock-doc-crate");
let manager = LoggingManager::new(config);
manager.setup().unwrap();

manager.logger(LoggerNames::DATABASE).info("connected");
```

Most applications keep one graph for the whole process; [`setup`], [`get_logger`],
[`get_logging_stats`] and [`get_current_config`] wrap a process-wide manager for that.

# Correlation

The [`context`] module keeps a request identifier per thread (and per task, with
[`context::ApplyContext`]). Every record created while one is set carries it; records
created outside any request render `no-request-id`.

# Instrumentation

[`log_performance`], [`monitor_memory`] and [`monitor_resources`] wrap a unit of work,
time it, log one record at a level chosen by per-site thresholds, and count it in the
[`StatsRegistry`]. Each has an `_async` counterpart, and [`PerformanceTimer`] and
[`ResourceTracker`] do the same for an arbitrary block.

```rust
use sherlock::{CallSite, log_performance};

let site = CallSite::new("load_settings");
let loaded: Result<u32, String> = log_performance(&site, || Ok(3));
assert_eq!(loaded, Ok(3));
```

Errors returned by the wrapped work are logged and handed back unchanged.
*/

mod config;
mod console_sink;
pub mod context;
mod error;
mod file_sink;
mod format;
mod global_manager;
mod graph;
mod inmemory_sink;
mod instrument;
pub mod interval;
mod level;
mod log_record;
mod logger;
mod manager;
mod resource;
mod sink;
mod stats;

pub use config::{
    DEFAULT_BACKUP_COUNT, DEFAULT_ENCODING, DEFAULT_MAX_BYTES, LoggerNames, LoggerSpec, LoggingConfig, LoggingPresets,
    ROOT_LOGGER, SinkSpec, list_available_loggers,
};
pub use console_sink::ConsoleSink;
pub use context::{RequestContext, clear_request_id, get_request_id, set_request_id};
pub use error::{Error, Result};
pub use file_sink::RotatingFileSink;
pub use format::{DEFAULT_DATE_FORMAT, DEFAULT_TEMPLATE, LogFormat, RecordFormatter};
pub use global_manager::{get_current_config, get_logger, get_logging_stats, manager, setup};
pub use inmemory_sink::InMemorySink;
pub use instrument::{
    CallSite, DEFAULT_SLOW_THRESHOLD, log_performance, log_performance_async, monitor_memory, monitor_memory_async,
    monitor_resources, monitor_resources_async,
};
pub use interval::{PerformanceTimer, ResourceTracker};
pub use level::{Level, LevelSpec};
pub use log_record::LogRecord;
pub use logger::Logger;
pub use manager::LoggingManager;
pub use resource::{NullReader, ProcfsReader, ResourceMonitor, ResourceReader, ResourceSnapshot, ResourceUsage};
pub use sink::Sink;
pub use stats::{CallSiteStats, LoggingStats, StatsRegistry};
