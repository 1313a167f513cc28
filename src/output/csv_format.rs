//! CSV export, written row by row as results arrive.

use crate::error::{ExportError, ExportResult};
use crate::scanner::PortResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Column order of every export.
pub const CSV_HEADER: [&str; 5] = ["port", "protocol", "status", "service", "banner"];

/// Streaming CSV writer: one row per result, header first.
pub struct CsvExporter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl CsvExporter<File> {
    /// Create (or truncate) `path` and write the header.
    pub fn create(path: &Path) -> ExportResult<Self> {
        let file = File::create(path).map_err(|source| ExportError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_writer(file)
    }
}

impl<W: Write> CsvExporter<W> {
    /// Wrap any writer and emit the header row.
    pub fn from_writer(inner: W) -> ExportResult<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(CSV_HEADER)?;
        Ok(Self { writer, rows: 0 })
    }

    /// Append one result and flush it, so a killed scan keeps its rows.
    pub fn write(&mut self, result: &PortResult) -> ExportResult<()> {
        let port = result.port.to_string();
        let protocol = result.protocol.to_string();
        let status = result.status.to_string();
        self.writer.write_record([
            port.as_str(),
            protocol.as_str(),
            status.as_str(),
            result.service.as_str(),
            result.banner.as_str(),
        ])?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far, excluding the header.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the underlying writer.
    pub fn finish(self) -> ExportResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::PortStatus;
    use crate::types::{Protocol, ScanTask};

    #[test]
    fn test_rows_and_quoting() {
        let mut exporter = CsvExporter::from_writer(Vec::new()).unwrap();
        exporter
            .write(
                &PortResult::new(ScanTask::new(Protocol::Tcp, 80), PortStatus::Open)
                    .with_service("HTTP (HTTP/1.0 200 OK, nginx)")
                    .with_banner("HTTP/1.0 200 OK, nginx"),
            )
            .unwrap();
        exporter
            .write(&PortResult::new(
                ScanTask::new(Protocol::Udp, 161),
                PortStatus::OpenFiltered,
            ))
            .unwrap();
        assert_eq!(exporter.rows(), 2);

        let text = String::from_utf8(exporter.finish().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "port,protocol,status,service,banner");
        assert_eq!(
            lines[1],
            r#"80,TCP,OPEN,"HTTP (HTTP/1.0 200 OK, nginx)","HTTP/1.0 200 OK, nginx""#
        );
        assert_eq!(lines[2], "161,UDP,OPEN|FILTERED,,");
    }

    #[test]
    fn test_create_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.csv");

        let mut exporter = CsvExporter::create(&path).unwrap();
        exporter
            .write(&PortResult::error(ScanTask::new(Protocol::Tcp, 70000), "port must be 0-65535"))
            .unwrap();
        exporter.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("70000,TCP,ERROR: port must be 0-65535,,"));
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = CsvExporter::create(&dir.path().join("nope").join("scan.csv"));
        assert!(matches!(result, Err(ExportError::Open { .. })));
    }
}
