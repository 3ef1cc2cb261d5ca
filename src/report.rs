//! Report Writer - URL/QR table as CSV

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codes::InlineImage;

pub const REPORT_HEADER: [&str; 3] = ["URL", "QR_CODE", "QR_CODE_IMG"];
pub const DEFAULT_REPORT_PATH: &str = "output.csv";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to flush report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportRow {
    pub download_url: String,
    pub inline_image: InlineImage,
    pub image_markup: String,
}

impl ReportRow {
    pub fn new(download_url: &str, inline_image: &InlineImage) -> Self {
        Self {
            download_url: download_url.to_string(),
            inline_image: inline_image.clone(),
            image_markup: inline_image.markup(),
        }
    }

    fn cells(&self) -> [&str; 3] {
        [&self.download_url, self.inline_image.as_str(), &self.image_markup]
    }
}

pub trait ReportWriter {
    fn write_report(&self, rows: &[ReportRow]) -> Result<(), ReportError>;
}

pub struct CsvReportWriter {
    path: PathBuf,
}

impl CsvReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportWriter for CsvReportWriter {
    fn write_report(&self, rows: &[ReportRow]) -> Result<(), ReportError> {
        let csv_err = |source| ReportError::Csv {
            path: self.path.clone(),
            source,
        };

        let io_err = |source| ReportError::Io {
            path: self.path.clone(),
            source,
        };

        // Rows go to a sibling file that only replaces the report once complete
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let staging = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;

        let mut wtr = csv::Writer::from_writer(staging);
        wtr.write_record(REPORT_HEADER).map_err(csv_err)?;
        for row in rows {
            wtr.write_record(row.cells()).map_err(csv_err)?;
        }
        let staging = wtr.into_inner().map_err(|e| io_err(e.into_error()))?;
        staging.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}
