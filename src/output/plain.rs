//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::output::TimedResult;
use crate::scanner::PortStatus;
use crate::types::Protocol;
use console::{style, Style};
use std::io::{self, Write};
use std::time::Duration;

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────";

/// What the summary table should show.
#[derive(Debug, Clone, Copy)]
pub struct SummaryOptions {
    /// Include closed, timed-out, and errored ports.
    pub show_all: bool,
    /// The scan was stopped before every task completed.
    pub interrupted: bool,
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(
    target: &str,
    ip: &str,
    protocols: &[Protocol],
    ports: usize,
    workers: usize,
    stealth: bool,
) {
    let protocols: Vec<String> = protocols.iter().map(|p| p.to_string()).collect();
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("portlook").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Scan type: {}",
        style("•").dim(),
        style(protocols.join("/")).yellow()
    );
    println!(
        "{} Target: {} ({})",
        style("•").dim(),
        style(target).white().bold(),
        ip
    );
    println!(
        "{} Scanning {} ports with {} workers{}",
        style("•").dim(),
        style(ports).white().bold(),
        workers,
        if stealth { " (stealth mode)" } else { "" }
    );
    println!();
}

/// Print the end-of-scan summary: counts, then a table sorted by port.
pub fn print_summary(
    target: &str,
    ip: &str,
    results: &[TimedResult],
    duration: Duration,
    options: SummaryOptions,
) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_summary(&mut out, target, ip, results, duration, options)
}

fn write_summary<W: Write>(
    out: &mut W,
    target: &str,
    ip: &str,
    results: &[TimedResult],
    duration: Duration,
    options: SummaryOptions,
) -> io::Result<()> {
    let open = results.iter().filter(|r| r.result.is_open()).count();
    let errors = results.iter().filter(|r| r.result.status.is_error()).count();

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out, "                    {} Scan Results", style("portlook").cyan().bold())?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;
    writeln!(out, "  {} {} ({})", style("Target:").bold(), target, ip)?;
    writeln!(
        out,
        "  {} {} probes in {:.2}s{}",
        style("Statistics:").bold(),
        results.len(),
        duration.as_secs_f64(),
        if options.interrupted { " (interrupted)" } else { "" }
    )?;
    writeln!(
        out,
        "               {} open, {} errors",
        style(open).green().bold(),
        style(errors).red()
    )?;
    writeln!(out)?;

    let mut rows: Vec<&TimedResult> = results
        .iter()
        .filter(|r| options.show_all || r.result.is_open())
        .collect();
    rows.sort_by_key(|r| (r.result.port, r.result.protocol));

    if rows.is_empty() {
        writeln!(out, "  {}", style("No open ports found.").dim())?;
    } else {
        writeln!(out, "  {}", style(THIN_RULE).dim())?;
        writeln!(
            out,
            "  {:>6}  {:<5}  {:^15}  {}",
            style("PORT").bold(),
            style("PROTO").bold(),
            style("STATE").bold(),
            style("SERVICE").bold()
        )?;
        writeln!(out, "  {}", style(THIN_RULE).dim())?;

        for row in rows {
            let result = &row.result;
            writeln!(
                out,
                "  {:>6}  {:<5}  {:^15}  {}",
                result.port,
                result.protocol.to_string(),
                status_style(&result.status).apply_to(truncate_string(&result.status.to_string(), 15)),
                truncate_string(&result.service, 40)
            )?;
        }
        writeln!(out, "  {}", style(THIN_RULE).dim())?;
    }

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;
    Ok(())
}

fn status_style(status: &PortStatus) -> Style {
    match status {
        PortStatus::Open => Style::new().green().bold(),
        PortStatus::OpenFiltered => Style::new().yellow().bold(),
        PortStatus::Closed => Style::new().red(),
        PortStatus::Timeout => Style::new().yellow(),
        PortStatus::Error(_) => Style::new().red().bold(),
    }
}

/// Truncate a string to a maximum number of characters, adding an ellipsis
/// if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::PortResult;
    use crate::types::ScanTask;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("ééééé", 4), "é...");
    }

    #[test]
    fn test_summary_lists_open_ports_sorted() {
        console::set_colors_enabled(false);
        let results: Vec<TimedResult> = [
            (443, PortStatus::Open),
            (22, PortStatus::Open),
            (23, PortStatus::Closed),
        ]
        .into_iter()
        .map(|(port, status)| {
            TimedResult::now(PortResult::new(ScanTask::new(Protocol::Tcp, port), status))
        })
        .collect();

        let mut buf = Vec::new();
        let options = SummaryOptions {
            show_all: false,
            interrupted: true,
        };
        write_summary(&mut buf, "host", "10.0.0.1", &results, Duration::from_secs(2), options)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("3 probes in 2.00s (interrupted)"));
        let ssh = text.find("    22  TCP").unwrap();
        let https = text.find("   443  TCP").unwrap();
        assert!(ssh < https);
        assert!(!text.contains("CLOSED"));
    }
}
