// SPDX-License-Identifier: MIT OR Apache-2.0

//! Size-rotated file sink.
//!
//! Every write happens under one mutex together with the rollover check, so lines from
//! concurrent writers never interleave and a rollover never splits a line across two
//! generations. Generations are named `<file>.1` (newest) to `<file>.<backup_count>`
//! (oldest); older ones are deleted.

use crate::Level;
use crate::error::Error;
use crate::format::RecordFormatter;
use crate::log_record::LogRecord;
use crate::sink::Sink;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug)]
struct FileState {
    file: Option<File>,
    size: u64,
}

/// A file sink rotated once it would grow past `max_bytes`.
///
/// `max_bytes == 0` disables rotation. With `backup_count == 0` the file is truncated on
/// rollover instead of being renamed.
#[derive(Debug)]
pub struct RotatingFileSink {
    path: PathBuf,
    level: Level,
    formatter: RecordFormatter,
    max_bytes: u64,
    backup_count: u32,
    state: Mutex<FileState>,
}

impl RotatingFileSink {
    /// Opens (creating if needed) `path` for appending.
    pub fn open(
        path: impl Into<PathBuf>,
        level: Level,
        formatter: RecordFormatter,
        max_bytes: u64,
        backup_count: u32,
    ) -> Result<Self, Error> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let file = open_append(&path).map_err(|e| Error::io(&path, e))?;
        let size = file.metadata().map_err(|e| Error::io(&path, e))?.len();
        Ok(Self {
            path,
            level,
            formatter,
            max_bytes,
            backup_count,
            state: Mutex::new(FileState {
                file: Some(file),
                size,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `generation`th rotated file, `1` being the most recent.
    pub fn backup_path(&self, generation: u32) -> PathBuf {
        backup_path(&self.path, generation)
    }

    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let len = line.len() as u64;
        if self.max_bytes > 0 && state.size > 0 && state.size + len > self.max_bytes {
            self.rotate(&mut state)?;
        }
        if state.file.is_none() {
            // a previous rotation failed half-way; try to recover the handle
            let file = open_append(&self.path)?;
            state.size = file.metadata()?.len();
            state.file = Some(file);
        }
        if let Some(file) = state.file.as_mut() {
            file.write_all(line)?;
        }
        state.size += len;
        Ok(())
    }

    fn rotate(&self, state: &mut FileState) -> io::Result<()> {
        if let Some(mut file) = state.file.take() {
            file.flush()?;
        }
        if self.backup_count == 0 {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)?;
            drop(file);
        } else {
            remove_if_exists(&backup_path(&self.path, self.backup_count))?;
            for generation in (1..self.backup_count).rev() {
                let from = backup_path(&self.path, generation);
                if from.exists() {
                    std::fs::rename(&from, backup_path(&self.path, generation + 1))?;
                }
            }
            if self.path.exists() {
                std::fs::rename(&self.path, backup_path(&self.path, 1))?;
            }
        }
        state.file = Some(open_append(&self.path)?);
        state.size = 0;
        Ok(())
    }
}

impl Sink for RotatingFileSink {
    fn level(&self) -> Level {
        self.level
    }

    fn finish_log_record(&self, record: &LogRecord) {
        let mut line = self.formatter.render(record);
        line.push('\n');
        if let Err(e) = self.write_line(line.as_bytes()) {
            eprintln!("sherlock: cannot write to {}: {e}", self.path.display());
        }
    }

    fn prepare_to_die(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(file) = state.file.as_mut() {
            let _ = file.flush();
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn backup_path(path: &Path, generation: u32) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{generation}"));
    PathBuf::from(name)
}
