//! The scan command: resolve, probe, report.

use crate::cli::resolve_target;
use crate::config::{ScanOptions, Settings};
use crate::error::{CliError, CliResult};
use crate::output::{self, CsvExporter, ScanProgressBar, ScanReport, SummaryOptions, TimedResult};
use crate::scanner::{NetworkProber, PortResult, ScanCoordinator};
use crate::types::{PortSet, Protocol};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

/// Longest banner prefix written to the log.
const LOG_BANNER_CHARS: usize = 50;

/// Scan a target for open ports.
#[derive(Args, Debug)]
pub struct ScanCommand {
    /// Target to scan (IP address or hostname)
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Ports to scan (e.g. "80", "80,443", "1-1000", "22,80,8000-9000") [default: 1-1024]
    #[arg(short, long)]
    pub ports: Option<String>,

    /// Scan UDP only
    #[arg(long, conflicts_with = "both")]
    pub udp: bool,

    /// Scan both TCP and UDP
    #[arg(long)]
    pub both: bool,

    /// Number of concurrent workers (1-1000) [default: 200]
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Per-operation timeout in seconds [default: 1.0]
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Add a random 100-500ms delay before each TCP connect
    #[arg(long)]
    pub stealth: bool,

    /// Write results to a CSV file as they arrive
    #[arg(long, value_name = "PATH")]
    pub output_csv: Option<PathBuf>,

    /// Write results to a JSON file when the scan ends
    #[arg(long, value_name = "PATH")]
    pub output_json: Option<PathBuf>,

    /// Don't show the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ScanCommand {
    /// Protocols selected by `--udp` / `--both`; TCP otherwise.
    pub fn protocols(&self) -> Vec<Protocol> {
        if self.both {
            vec![Protocol::Tcp, Protocol::Udp]
        } else if self.udp {
            vec![Protocol::Udp]
        } else {
            vec![Protocol::Tcp]
        }
    }

    /// Merge flags over settings and validate them.
    pub async fn options(&self) -> CliResult<ScanOptions> {
        let settings = Settings::resolve(self.config.as_deref())?;

        let ports = PortSet::parse(self.ports.as_deref().unwrap_or(&settings.ports));
        if ports.is_empty() {
            return Err(CliError::NoPorts);
        }

        let target = resolve_target(&self.target).await?;

        Ok(ScanOptions::new(
            target,
            self.protocols(),
            ports,
            self.threads.unwrap_or(settings.threads),
            self.timeout.unwrap_or(settings.timeout_secs),
            self.stealth || settings.stealth,
        )?)
    }

    /// Execute the scan command.
    pub async fn execute(&self, verbose: bool, silent: bool) -> CliResult<()> {
        let options = self.options().await?;
        let ip = options.target.to_string();

        // Open the CSV before scanning so a bad path fails fast.
        let mut csv = self
            .output_csv
            .as_deref()
            .map(CsvExporter::create)
            .transpose()?;

        if !silent {
            output::print_scan_header(
                &self.target,
                &ip,
                &options.protocols,
                options.ports.len(),
                options.workers,
                options.stealth,
            );
        }
        tracing::info!(
            "Starting scan on {} ({}), {} tasks, {} workers",
            self.target,
            ip,
            options.task_count(),
            options.workers
        );

        let started = Instant::now();
        let coordinator = ScanCoordinator::new(
            NetworkProber::new(options.target, options.timeout, options.stealth),
            options.workers,
        );
        let mut stream = coordinator.run(options.tasks());

        let handle = stream.cancel_handle();
        let signal = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                handle.cancel();
            }
        });

        let bar = ScanProgressBar::new(options.task_count(), !silent && !self.no_progress);
        let mut results = Vec::with_capacity(options.task_count());

        while let Some(result) = stream.next().await {
            log_result(&result);
            if let Some(csv) = csv.as_mut() {
                csv.write(&result)?;
            }
            bar.update(stream.progress());
            results.push(TimedResult::now(result));
        }

        let interrupted = stream.is_cancelled();
        bar.finish(interrupted);
        signal.abort();
        drop(stream);

        if interrupted {
            tracing::warn!("Scan interrupted by user");
        }

        if let Some(csv) = csv {
            let rows = csv.rows();
            csv.finish()?;
            if let Some(path) = &self.output_csv {
                tracing::info!("Wrote {} rows to {}", rows, path.display());
            }
        }
        if let Some(path) = &self.output_json {
            ScanReport::new(&self.target, &ip, &results).save(path)?;
            tracing::info!("Wrote JSON report to {}", path.display());
        }

        let duration = started.elapsed();
        tracing::info!("Scan completed in {:.2} seconds", duration.as_secs_f64());
        let mut open: Vec<&PortResult> = results
            .iter()
            .map(|r| &r.result)
            .filter(|r| r.is_open())
            .collect();
        open.sort_by_key(|r| (r.port, r.protocol));
        if open.is_empty() {
            tracing::info!("No open ports found");
        } else {
            let list: Vec<String> = open.iter().map(|r| r.task().to_string()).collect();
            tracing::info!("Open ports: {}", list.join(", "));
        }

        if !silent {
            output::print_summary(
                &self.target,
                &ip,
                &results,
                duration,
                SummaryOptions {
                    show_all: verbose,
                    interrupted,
                },
            )?;
        }

        Ok(())
    }
}

/// Open ports log at `info`; everything else only shows up at `debug`.
fn log_result(result: &PortResult) {
    if result.is_open() {
        tracing::info!("{}", result_line(result));
    } else {
        tracing::debug!("{}", result_line(result));
    }
}

/// `Port <p>/<proto>: <status>`, plus service and banner parts when present.
fn result_line(result: &PortResult) -> String {
    let mut line = format!("Port {}/{}: {}", result.port, result.protocol, result.status);
    if !result.service.is_empty() {
        line.push_str(&format!(" | Service: {}", result.service));
    }
    if !result.banner.is_empty() {
        let banner: String = result.banner.chars().take(LOG_BANNER_CHARS).collect();
        line.push_str(&format!(" | Banner: {}", banner));
    }
    line
}
