// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::level::LevelSpec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_BACKUP_COUNT: u32 = 5;
pub const DEFAULT_ENCODING: &str = "utf-8";

/// One log destination file.
///
/// A relative `filename` is resolved against [`LoggingConfig::logs_dir`](super::LoggingConfig::logs_dir).
/// `max_bytes == 0` disables rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkSpec {
    pub filename: PathBuf,
    pub level: LevelSpec,
    pub max_bytes: u64,
    pub backup_count: u32,
    pub encoding: String,
    pub enabled: bool,
}

impl Default for SinkSpec {
    fn default() -> Self {
        Self {
            filename: PathBuf::new(),
            level: LevelSpec::default(),
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: DEFAULT_BACKUP_COUNT,
            encoding: DEFAULT_ENCODING.to_string(),
            enabled: true,
        }
    }
}

impl SinkSpec {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: impl Into<LevelSpec>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_rotation(mut self, max_bytes: u64, backup_count: u32) -> Self {
        self.max_bytes = max_bytes;
        self.backup_count = backup_count;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
