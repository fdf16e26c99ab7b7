// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::level::LevelSpec;
use serde::{Deserialize, Serialize};

/// A named logger and the sinks it feeds.
///
/// `log_files` holds keys of [`LoggingConfig::log_files`](super::LoggingConfig::log_files),
/// matched exactly (case-sensitive). Repeated keys are attached once, at their first position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerSpec {
    pub name: String,
    pub level: LevelSpec,
    pub log_files: Vec<String>,
    /// Whether records also flow to the root logger's sinks.
    pub propagate: bool,
    pub enabled: bool,
}

impl Default for LoggerSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            level: LevelSpec::default(),
            log_files: Vec::new(),
            propagate: true,
            enabled: true,
        }
    }
}

impl LoggerSpec {
    pub fn new<S: AsRef<str>>(name: impl Into<String>, log_files: &[S]) -> Self {
        Self {
            name: name.into(),
            log_files: log_files.iter().map(|s| s.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: impl Into<LevelSpec>) -> Self {
        self.level = level.into();
        self
    }

    /// Keeps records away from the root logger, so they are not written twice.
    pub fn without_propagation(mut self) -> Self {
        self.propagate = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
