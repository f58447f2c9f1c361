//! Crate-level error type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::{ConfigError, ValidationError};

#[derive(Debug, Error)]
pub enum LogError {
    #[error("logging configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid logging configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    InvalidConfig(Vec<ValidationError>),

    /// A rotating file could not be opened. Initialization reports this as a
    /// Warn record and carries on without the file sink.
    #[error("cannot open log files in {}: {source}", directory.display())]
    FileSink {
        directory: PathBuf,
        #[source]
        source: io::Error,
    },
}
