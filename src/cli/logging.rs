//! Tracing subscriber setup: an env filter, a stderr layer and a log file.

use crate::cli::Cli;
use crate::error::{CliError, CliResult};
use chrono::Local;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// `logs/scan_<YYYYmmdd_HHMMSS>.log`, relative to the working directory.
pub fn default_log_path() -> PathBuf {
    Path::new("logs").join(format!("scan_{}.log", Local::now().format("%Y%m%d_%H%M%S")))
}

/// Install the global subscriber for this run.
///
/// `RUST_LOG` overrides the level; otherwise portlook logs at `info`, or
/// `debug` with `--verbose`. Returns the log file path, if one is written.
pub fn init_logging(cli: &Cli) -> CliResult<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "portlook=debug"
        } else {
            "portlook=info"
        })
    });

    let stderr_layer = (!cli.silent).then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
    });

    let log_path = match (&cli.log, cli.no_log_file) {
        (_, true) => None,
        (Some(path), false) => Some(path.clone()),
        (None, false) => Some(default_log_path()),
    };
    let file_layer = match &log_path {
        Some(path) => Some(
            fmt::layer()
                .with_writer(Mutex::new(open_log_file(path)?))
                .with_ansi(false)
                .with_target(false),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Io(io::Error::other(e)))?;

    Ok(log_path)
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    File::create(path)
}
