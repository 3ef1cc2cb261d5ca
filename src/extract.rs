//! Record Extractor
//!
//! Header names resolve to column indices once. Each data line becomes
//! either a `ContactRecord` or a `RowFailure`; a bad row never stops the
//! scan. A line whose first cell is empty ends the data.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::photo::{resolve_photo, EncodedPhoto};
use crate::validation::{validate_email, validate_phone, validate_url, Field, FieldViolation};

pub const CARD_EXTENSION: &str = "vcf";
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Input has no header row")]
    EmptyInput,

    #[error("Required column missing from header: {0}")]
    MissingColumn(String),
}

/// Column positions resolved from the header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    full_name: usize,
    phone: usize,
    email: usize,
    image: Option<usize>,
    url: Option<usize>,
    linkedin_url: Option<usize>,
}

impl HeaderMap {
    pub fn parse(header_line: &str) -> Result<Self, ExtractError> {
        let names: Vec<&str> = split_cells(header_line);
        let find = |field: Field| names.iter().position(|n| *n == field.column());
        let require = |field: Field| {
            find(field).ok_or_else(|| ExtractError::MissingColumn(field.column().to_string()))
        };

        Ok(Self {
            full_name: require(Field::FullName)?,
            phone: require(Field::Phone)?,
            email: require(Field::Email)?,
            image: find(Field::Image),
            url: find(Field::Url),
            linkedin_url: find(Field::LinkedinUrl),
        })
    }

    pub fn index_of(&self, field: Field) -> Option<usize> {
        match field {
            Field::FullName => Some(self.full_name),
            Field::Phone => Some(self.phone),
            Field::Email => Some(self.email),
            Field::Image => self.image,
            Field::Url => self.url,
            Field::LinkedinUrl => self.linkedin_url,
        }
    }

    /// Cell for `field`, or `None` when the column or cell is missing or empty
    fn cell<'a>(&self, cells: &[&'a str], field: Field) -> Option<&'a str> {
        self.index_of(field)
            .and_then(|i| cells.get(i).copied())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactRecord {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub image_ref: Option<String>,
    pub photo: Option<EncodedPhoto>,
    pub url: Option<String>,
    pub linkedin_url: Option<String>,
    pub output_path: PathBuf,
}

/// A rejected row, 1-based from the first line after the header
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowFailure {
    pub row: usize,
    pub violation: FieldViolation,
}

impl RowFailure {
    pub fn message(&self) -> &str {
        &self.violation.message
    }
}

pub type RowResult = Result<ContactRecord, RowFailure>;

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub image_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("."),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

/// Characters that would let a name leave `output_dir`
const PATH_UNSAFE: &[char] = &[' ', '/', '\\', ':'];

/// File stem for a card: spaces and path separators become underscores and
/// leading dots are dropped, so the stem is always one plain file name.
pub fn card_stem(full_name: &str) -> String {
    let stem: String = full_name
        .chars()
        .map(|c| if PATH_UNSAFE.contains(&c) { '_' } else { c })
        .collect();
    let stem = stem.trim_start_matches('.');
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem.to_string()
    }
}

/// Card file for `full_name`, always directly under `output_dir`
pub fn card_path(output_dir: &Path, full_name: &str) -> PathBuf {
    output_dir.join(format!("{}.{}", card_stem(full_name), CARD_EXTENSION))
}

fn split_cells(line: &str) -> Vec<&str> {
    line.strip_suffix('\r').unwrap_or(line).split(',').collect()
}

/// Lazy row-by-row extractor over the CSV body
pub struct RecordExtractor<'a> {
    header: HeaderMap,
    lines: std::iter::Enumerate<std::str::Split<'a, char>>,
    options: &'a ExtractOptions,
    finished: bool,
}

impl<'a> RecordExtractor<'a> {
    pub fn new(csv: &'a str, options: &'a ExtractOptions) -> Result<Self, ExtractError> {
        let mut lines = csv.split('\n');
        let header_line = lines
            .next()
            .filter(|l| !l.trim().is_empty())
            .ok_or(ExtractError::EmptyInput)?;
        let header = HeaderMap::parse(header_line)?;

        Ok(Self {
            header,
            lines: lines.enumerate(),
            options,
            finished: false,
        })
    }

    pub fn header(&self) -> &HeaderMap {
        &self.header
    }

    fn extract_row(&self, row: usize, cells: &[&str]) -> RowResult {
        let fail = |violation: FieldViolation| RowFailure { row, violation };
        let h = &self.header;

        let full_name = h.cell(cells, Field::FullName).ok_or_else(|| {
            fail(FieldViolation::new(
                "required",
                Field::FullName,
                "Full Name cannot be empty",
                None,
            ))
        })?;

        let raw_phone = h.cell(cells, Field::Phone);
        let phone = raw_phone.and_then(validate_phone).ok_or_else(|| {
            fail(FieldViolation::new(
                "phone_format",
                Field::Phone,
                "Invalid phone number format",
                raw_phone,
            ))
        })?;

        let email = h.cell(cells, Field::Email);
        let email = email.filter(|e| validate_email(e)).ok_or_else(|| {
            fail(FieldViolation::new(
                "email_format",
                Field::Email,
                "Invalid email format",
                email,
            ))
        })?;

        let image_ref = h.cell(cells, Field::Image);
        let photo = resolve_photo(image_ref, &self.options.image_dir).map_err(|e| {
            fail(FieldViolation::new(
                "image_readable",
                Field::Image,
                format!("Failed to read or encode image: {}", e),
                image_ref,
            ))
        })?;

        let url = self.optional_url(row, cells, Field::Url, "Invalid URL format")?;
        let linkedin_url =
            self.optional_url(row, cells, Field::LinkedinUrl, "Invalid LinkedIn URL format")?;

        Ok(ContactRecord {
            full_name: full_name.to_string(),
            phone,
            email: email.to_string(),
            image_ref: image_ref.map(str::to_string),
            photo,
            url,
            linkedin_url,
            output_path: card_path(&self.options.output_dir, full_name),
        })
    }

    fn optional_url(
        &self,
        row: usize,
        cells: &[&str],
        field: Field,
        message: &str,
    ) -> Result<Option<String>, RowFailure> {
        match self.header.cell(cells, field) {
            None => Ok(None),
            Some(v) if validate_url(v) => Ok(Some(v.to_string())),
            Some(v) => Err(RowFailure {
                row,
                violation: FieldViolation::new("url_format", field, message, Some(v)),
            }),
        }
    }
}

impl Iterator for RecordExtractor<'_> {
    type Item = RowResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let (index, line) = self.lines.next()?;
        let cells = split_cells(line);

        // End-of-data sentinel
        if cells.first().map_or(true, |c| c.is_empty()) {
            self.finished = true;
            return None;
        }

        let row = index + 1;
        let result = self.extract_row(row, &cells);
        if let Err(failure) = &result {
            warn!(row, reason = %failure.message(), "row rejected");
        }
        Some(result)
    }
}

/// Successes and failures of a full scan, each in input order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    pub records: Vec<ContactRecord>,
    pub failures: Vec<RowFailure>,
}

impl FromIterator<RowResult> for Extraction {
    fn from_iter<I: IntoIterator<Item = RowResult>>(iter: I) -> Self {
        let mut extraction = Extraction::default();
        for result in iter {
            match result {
                Ok(record) => extraction.records.push(record),
                Err(failure) => extraction.failures.push(failure),
            }
        }
        extraction
    }
}

pub fn extract_records(csv: &str, options: &ExtractOptions) -> Result<Extraction, ExtractError> {
    Ok(RecordExtractor::new(csv, options)?.collect())
}
