//! JSON export: a metadata envelope plus the result array.

use crate::error::{ExportError, ExportResult};
use crate::scanner::{PortResult, PortStatus};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A result stamped with the time it was received.
#[derive(Debug, Clone, Serialize)]
pub struct TimedResult {
    pub timestamp: DateTime<Local>,
    #[serde(flatten)]
    pub result: PortResult,
}

impl TimedResult {
    /// Stamp `result` with the current local time.
    pub fn now(result: PortResult) -> Self {
        Self {
            timestamp: Local::now(),
            result,
        }
    }
}

/// Scan-level metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ScanMetadata {
    pub target: String,
    pub resolved_ip: String,
    pub timestamp: DateTime<Local>,
    pub total_ports_scanned: usize,
    pub open_ports_count: usize,
}

/// The full JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport<'a> {
    pub scan_metadata: ScanMetadata,
    pub results: &'a [TimedResult],
}

impl<'a> ScanReport<'a> {
    /// Build a report; counts are derived from `results`.
    ///
    /// `open_ports_count` counts confirmed `OPEN` results only; silent UDP
    /// ports (`OPEN|FILTERED`) are not included.
    pub fn new(target: &str, resolved_ip: &str, results: &'a [TimedResult]) -> Self {
        Self {
            scan_metadata: ScanMetadata {
                target: target.to_string(),
                resolved_ip: resolved_ip.to_string(),
                timestamp: Local::now(),
                total_ports_scanned: results.len(),
                open_ports_count: results
                    .iter()
                    .filter(|r| matches!(r.result.status, PortStatus::Open))
                    .count(),
            },
            results,
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_to<W: Write>(&self, writer: W) -> ExportResult<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Write the report to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> ExportResult<()> {
        let file = File::create(path).map_err(|source| ExportError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
