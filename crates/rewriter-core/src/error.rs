//! # Rewriter Core Errors
//!
//! Defines the crate-level [`Error`] that aggregates the errors of each
//! subsystem (stage management, configuration) plus plain I/O failures.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::error::ConfigError;
use crate::stage_manager::error::StageSystemError;

/// Error type returned by the higher-level entry points of the crate
#[derive(Debug, ThisError)]
pub enum Error {
    /// Typed stage system error (resolution, initialization, lifecycle)
    #[error("Stage system error: {0}")]
    StageSystem(#[from] StageSystemError),

    /// Typed configuration error (loading or parsing pipeline descriptions)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error reported by a running pipeline or while reading input
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}
