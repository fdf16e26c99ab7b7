// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::Level;
use crate::format::RecordFormatter;
use crate::log_record::LogRecord;
use crate::sink::Sink;

/**
A sink that writes to stderr.

Also used as the last-resort destination for warnings logged before the graph is built.
 */
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    level: Level,
    formatter: RecordFormatter,
}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug/Clone: derived, the sink holds no handle of its own
// - PartialEq/Eq: derived-equivalent, two console sinks with the same floor and
//   formatter produce identical output
// - Default: Info floor, default text template
// - Send/Sync: automatic

impl PartialEq for ConsoleSink {
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level && self.formatter == other.formatter
    }
}

impl Eq for ConsoleSink {}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new(Level::Info, RecordFormatter::default())
    }
}

impl ConsoleSink {
    pub fn new(level: Level, formatter: RecordFormatter) -> Self {
        Self { level, formatter }
    }
}

impl Sink for ConsoleSink {
    fn level(&self) -> Level {
        self.level
    }

    fn finish_log_record(&self, record: &LogRecord) {
        use std::io::Write;
        let mut line = self.formatter.render(record);
        line.push('\n');
        let mut lock = std::io::stderr().lock();
        // nowhere left to report a failing stderr
        let _ = lock.write_all(line.as_bytes());
    }

    fn prepare_to_die(&self) {
        use std::io::Write;
        let _ = std::io::stderr().flush();
    }
}
