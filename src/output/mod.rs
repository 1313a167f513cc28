//! Output formatting module.
//!
//! Console rendering for the header, progress, and summary, plus the CSV and
//! JSON exporters.

mod csv_format;
mod json_format;
mod plain;
mod progress;

pub use csv_format::{CsvExporter, CSV_HEADER};
pub use json_format::{ScanMetadata, ScanReport, TimedResult};
pub use plain::{print_scan_header, print_summary, truncate_string, SummaryOptions};
pub use progress::ScanProgressBar;
