//! Error types for portlook.
//!
//! Uses `thiserror` for ergonomic error definitions.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single probe.
///
/// These never abort a scan: the probe layer folds them into
/// [`PortStatus::Error`](crate::scanner::PortStatus::Error) so that each
/// task's failure is reported on its own row.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("port must be 0-65535")]
    PortOutOfRange(u32),

    #[error("socket creation failed: {0}")]
    Socket(std::io::Error),

    #[error("send failed: {0}")]
    Send(std::io::Error),

    #[error("receive failed: {0}")]
    Receive(std::io::Error),
}

/// Result type alias for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("worker count must be between {min} and {max}, got {got}")]
    InvalidWorkers { got: usize, min: usize, max: usize },

    #[error("timeout must be a positive number of seconds, got {0}")]
    InvalidTimeout(f64),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while exporting results.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("could not open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors surfaced by the command-line front end before or around a scan.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("could not resolve hostname: {0}")]
    Resolution(String),

    #[error("no valid ports specified")]
    NoPorts,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
