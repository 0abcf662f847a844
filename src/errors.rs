// src/errors.rs

//! Crate-wide error type.
//!
//! Only conditions that stop a command from being attempted at all surface
//! as a `JobError` from [`crate::engine::JobEngine::run`]. The wrapped
//! command's own failure is recorded in the report instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("requires a command to execute")]
    MissingCommand,

    #[error("invalid log file pattern '{0}'")]
    LogFilePattern(String),

    #[error("failed to open log file {path:?}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create lock directory {path:?}: {source}")]
    LockDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run the command, because '{0}' has already been running")]
    AlreadyRunning(String),

    #[error("invalid handler: {0:?}")]
    InvalidHandler(String),

    #[error("handler {command:?} failed: {reason}")]
    HandlerFailed { command: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, JobError>;
