// SPDX-License-Identifier: MIT OR Apache-2.0
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::Error;

/// Severity of a log record, ordered from least to most severe.
///
/// The numeric values match the conventional host-runtime scale so that configurations
/// written with pre-resolved numbers keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// Detailed diagnostics, usually disabled outside development
    Debug = 10,
    /// Normal operation
    Info = 20,
    /// Suspicious condition, or a call that crossed a threshold
    Warning = 30,
    /// Runtime error
    Error = 40,
    /// The process is unlikely to continue
    Critical = 50,
}

impl Level {
    /// Parses a symbolic level name, ignoring case.
    pub fn parse(name: &str) -> Option<Level> {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warning" | "warn" => Some(Level::Warning),
            "error" => Some(Level::Error),
            "critical" | "fatal" => Some(Level::Critical),
            _ => None,
        }
    }

    pub fn from_numeric(value: u8) -> Option<Level> {
        match value {
            10 => Some(Level::Debug),
            20 => Some(Level::Info),
            30 => Some(Level::Warning),
            40 => Some(Level::Error),
            50 => Some(Level::Critical),
            _ => None,
        }
    }

    pub fn numeric(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/**
A level as written in a configuration: either a symbolic name or a number.

Names are kept verbatim until setup so that a bad value is reported against the field it
came from, rather than failing somewhere inside deserialization.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    Numeric(u8),
    Named(String),
}

impl LevelSpec {
    /// Resolves to a [`Level`], naming `field` in the error when the value is not a level.
    pub fn resolve(&self, field: &str) -> Result<Level, Error> {
        let resolved = match self {
            LevelSpec::Numeric(n) => Level::from_numeric(*n),
            LevelSpec::Named(name) => Level::parse(name),
        };
        resolved.ok_or_else(|| Error::InvalidLevel {
            field: field.to_string(),
            value: self.to_string(),
        })
    }
}

impl From<Level> for LevelSpec {
    fn from(level: Level) -> Self {
        LevelSpec::Numeric(level.numeric())
    }
}

impl From<&str> for LevelSpec {
    fn from(name: &str) -> Self {
        LevelSpec::Named(name.to_string())
    }
}

impl Default for LevelSpec {
    fn default() -> Self {
        Level::Info.into()
    }
}

impl Display for LevelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelSpec::Numeric(n) => write!(f, "{n}"),
            LevelSpec::Named(name) => f.write_str(name),
        }
    }
}
