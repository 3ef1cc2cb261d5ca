//! Batch Pipeline - Single Entry Point
//!
//! Rows run one at a time: extract, render, write, encode, record.
//! Row content problems are skipped and reported. Any I/O failure aborts
//! the run before the report is written.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::card::{render_card, RenderedCard};
use crate::codes::{CodeImageError, CodeImageGenerator, InlineImage, QrCodeGenerator};
use crate::config::{InputSource, Settings};
use crate::extract::{ContactRecord, ExtractError, ExtractOptions, RecordExtractor, RowFailure};
use crate::manifest::{ManifestError, RunManifest};
use crate::report::{CsvReportWriter, ReportError, ReportRow, ReportWriter};

/// Path segment under the base URL where cards are served
pub const DOWNLOAD_SEGMENT: &str = "download";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    Extract(#[from] ExtractError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Base URL cannot carry a download path: {0}")]
    InvalidBaseUrl(String),

    #[error("Card path has no file name: {0}")]
    InvalidOutputPath(PathBuf),

    #[error("Code image error: {0}")]
    CodeImage(#[from] CodeImageError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultRecord {
    pub download_url: String,
    pub code_image: InlineImage,
    pub code_image_path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<ResultRecord>,
    pub failures: Vec<RowFailure>,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub base_url: String,
    pub extract: ExtractOptions,
    pub manifest: Option<PathBuf>,
}

/// `{base}/download/{file_name}` with the file name percent-encoded
pub fn download_url(base_url: &str, file_name: &str) -> Result<String, PipelineError> {
    let invalid = || PipelineError::InvalidBaseUrl(base_url.to_string());
    let mut url = Url::parse(base_url).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .push(DOWNLOAD_SEGMENT)
        .push(file_name);
    Ok(url.into())
}

/// Paths already touched during one run
#[derive(Debug, Default)]
struct RunPaths {
    dirs: HashSet<PathBuf>,
    cards: HashSet<PathBuf>,
}

pub struct BatchPipeline {
    options: BatchOptions,
    codes: Box<dyn CodeImageGenerator>,
    report: Box<dyn ReportWriter>,
}

impl BatchPipeline {
    pub fn new(
        options: BatchOptions,
        codes: Box<dyn CodeImageGenerator>,
        report: Box<dyn ReportWriter>,
    ) -> Self {
        Self {
            options,
            codes,
            report,
        }
    }

    /// QR codes and a CSV report, as configured
    pub fn from_settings(settings: &Settings) -> Self {
        let options = BatchOptions {
            base_url: settings.base_url.clone(),
            extract: ExtractOptions {
                image_dir: settings.image_dir.clone(),
                output_dir: settings.output_dir.clone(),
            },
            manifest: settings.manifest.clone(),
        };
        Self::new(
            options,
            Box::new(QrCodeGenerator),
            Box::new(CsvReportWriter::new(settings.report.clone())),
        )
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn run_file(&self, input: &Path) -> Result<BatchOutcome, PipelineError> {
        let csv = fs::read_to_string(input).map_err(|e| PipelineError::io(input, e))?;
        self.run(&csv)
    }

    pub fn run_source(&self, source: &InputSource) -> Result<BatchOutcome, PipelineError> {
        match source {
            InputSource::File(path) => self.run_file(path),
            InputSource::Inline(csv) => self.run(csv),
        }
    }

    pub fn run(&self, csv: &str) -> Result<BatchOutcome, PipelineError> {
        let extractor = RecordExtractor::new(csv, &self.options.extract)?;
        let mut outcome = BatchOutcome::default();
        let mut manifest = RunManifest::new(&self.options.base_url);
        let mut paths = RunPaths::default();

        info!(base_url = %self.options.base_url, "batch started");

        for row in extractor {
            match row {
                Ok(record) => {
                    let result = self.process(&record, &mut paths, &mut manifest)?;
                    outcome.results.push(result);
                }
                Err(failure) => outcome.failures.push(failure),
            }
        }

        let rows: Vec<ReportRow> = outcome
            .results
            .iter()
            .map(|r| ReportRow::new(&r.download_url, &r.code_image))
            .collect();
        self.report.write_report(&rows)?;

        if let Some(path) = &self.options.manifest {
            manifest.failures = outcome.failures.clone();
            manifest.seal()?.write_to(path)?;
        }

        info!(
            written = outcome.results.len(),
            rejected = outcome.failures.len(),
            "batch finished"
        );
        Ok(outcome)
    }

    fn process(
        &self,
        record: &ContactRecord,
        paths: &mut RunPaths,
        manifest: &mut RunManifest,
    ) -> Result<ResultRecord, PipelineError> {
        let card = render_card(record);
        self.write_card(&card, paths)?;

        let file_name = card
            .file_name()
            .ok_or_else(|| PipelineError::InvalidOutputPath(card.output_path.clone()))?;
        let url = download_url(&self.options.base_url, file_name)?;

        let code_image = self.codes.encode(&url)?;
        let code_image_path = card.output_path.with_extension("png");
        self.codes.encode_to_file(&url, &code_image_path)?;
        debug!(path = %code_image_path.display(), "code image written");

        manifest.add_card(file_name, &url, card.content.as_bytes());
        info!(name = %record.full_name, path = %card.output_path.display(), "card written");

        Ok(ResultRecord {
            download_url: url,
            code_image,
            code_image_path,
        })
    }

    fn write_card(
        &self,
        card: &RenderedCard,
        paths: &mut RunPaths,
    ) -> Result<(), PipelineError> {
        if let Some(parent) = card.output_path.parent() {
            if !parent.as_os_str().is_empty() && !paths.dirs.contains(parent) {
                fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
                paths.dirs.insert(parent.to_path_buf());
            }
        }
        if !paths.cards.insert(card.output_path.clone()) {
            warn!(path = %card.output_path.display(), "card overwritten by a later row with the same name");
        }
        fs::write(&card.output_path, &card.content)
            .map_err(|e| PipelineError::io(&card.output_path, e))
    }
}
