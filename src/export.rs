//! Destinations for a finished report.

use std::path::{Path, PathBuf};

use crate::error::SinkError;

/// Receives a serialized report once per export action.
pub trait ReportSink {
    fn export(&mut self, bytes: &[u8]) -> Result<(), SinkError>;
}

/// Writes the report to a file, replacing any previous content.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for FileSink {
    fn export(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        std::fs::write(&self.path, bytes).map_err(|source| SinkError::Write {
            path: self.path.clone(),
            source,
        })?;
        log::info!("Report written to {}", self.path.display());
        Ok(())
    }
}

/// Keeps the last exported report in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub bytes: Vec<u8>,
}

impl ReportSink for MemorySink {
    fn export(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        self.bytes = bytes.to_vec();
        Ok(())
    }
}

/// Suggested file name for a report about `image_path`.
pub fn report_file_name(image_path: Option<&Path>) -> String {
    let stem = image_path
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("marks");
    format!("{stem}_report.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let mut sink = FileSink::new(&path);
        sink.export(b"No,Label,Count\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "No,Label,Count\n");
    }

    #[test]
    fn test_file_sink_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("missing").join("report.csv"));
        assert!(matches!(
            sink.export(b"x"),
            Err(SinkError::Write { .. })
        ));
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(
            report_file_name(Some(Path::new("/tmp/wall_7.jpg"))),
            "wall_7_report.csv"
        );
        assert_eq!(report_file_name(None), "marks_report.csv");
    }
}
