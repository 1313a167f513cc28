//! Command-line interface.
//!
//! `portlook <TARGET>` scans one host. Flags left unset fall back to the
//! settings file, then to built-in defaults.

mod logging;
mod scan;

pub use logging::{default_log_path, init_logging};
pub use scan::ScanCommand;

use crate::error::{CliError, CliResult};
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// portlook - a concurrent TCP/UDP port scanner.
///
/// Probes every selected port with a bounded worker pool, grabs banners from
/// open TCP services, and can export results as CSV and JSON.
#[derive(Parser, Debug)]
#[command(name = "portlook")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A concurrent TCP/UDP port scanner", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub scan: ScanCommand,

    /// Enable verbose output (logs closed, timed-out and failed ports)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress console output; the log file is still written
    #[arg(long)]
    pub silent: bool,

    /// Write the log to this file instead of logs/scan_<timestamp>.log
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Don't write a log file
    #[arg(long, conflicts_with = "log")]
    pub no_log_file: bool,
}

impl Cli {
    /// Run the scan described by the parsed arguments.
    pub async fn run(&self) -> CliResult<()> {
        self.scan.execute(self.verbose, self.silent).await
    }
}

/// Resolve a hostname or IP address string to an [`IpAddr`].
///
/// IP literals are returned as-is; anything else goes through DNS and the
/// first address wins.
pub async fn resolve_target(target: &str) -> CliResult<IpAddr> {
    if let Ok(ip) = target.parse::<IpAddr>() {
        return Ok(ip);
    }

    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
    let response = resolver
        .lookup_ip(target)
        .await
        .map_err(|e| CliError::Resolution(format!("{}: {}", target, e)))?;

    let ip = response
        .iter()
        .next()
        .ok_or_else(|| CliError::Resolution(format!("{}: no addresses found", target)))?;
    tracing::debug!(%target, %ip, "resolved target");
    Ok(ip)
}
