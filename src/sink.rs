//SPDX-License-Identifier: MIT OR Apache-2.0
use crate::Level;
use crate::log_record::LogRecord;
use std::fmt::Debug;

/// A concrete log destination with its own severity floor.
///
/// Loggers fan records out to sinks; a sink drops records below [`Sink::level`] and
/// renders the rest with its own formatter. Implementations must be safe to call from
/// many threads at once, and must write each record as one uninterrupted line.
pub trait Sink: Debug + Send + Sync {
    /**
    The minimum level this sink accepts.
    */
    fn level(&self) -> Level;

    /**
        Writes the record. Callers have already checked [`Sink::accepts`].

        Write failures are reported to stderr rather than returned; a failing sink must
        never turn a log call into an error for the code being logged.
    */
    fn finish_log_record(&self, record: &LogRecord);

    /**
    The application may imminently exit.  Ensure all buffers are flushed and up to date.
    */
    fn prepare_to_die(&self);

    fn accepts(&self, level: Level) -> bool {
        level >= self.level()
    }
}

/*
Boilerplate notes.

# Sink

Clone makes no sense for something owning a file handle, so sinks live behind Arc.
PartialEq/Hash: data equality or provenance?  Unclear, so neither.
Default: a file sink needs a path, so no.
Send/Sync are required: one sink is shared by every logger attached to it.
*/
