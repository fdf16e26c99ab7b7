// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error type shared by configuration validation and logger-graph setup.

use std::path::PathBuf;

/// Everything that can go wrong while validating a [`LoggingConfig`](crate::LoggingConfig)
/// or building the logger graph from it.
///
/// Configuration variants are raised before any file is touched. [`Error::Io`] is raised
/// when the output directory or a sink file cannot be created.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration for `{field}`: {message}")]
    Config { field: String, message: String },

    #[error("invalid level {value:?} for `{field}`")]
    InvalidLevel { field: String, value: String },

    #[error("logger `{logger}` references unknown sink `{sink}`")]
    UnknownSink { logger: String, sink: String },

    #[error("invalid rotation for sink `{sink}`: {message}")]
    InvalidRotation { sink: String, message: String },

    #[error("cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error comes from the configuration itself rather than the filesystem.
    pub fn is_config(&self) -> bool {
        !matches!(self, Error::Io { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
