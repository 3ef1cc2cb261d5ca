//! CardForge Core - Contact Card Compiler
//!
//! CSV rows in, vCards and QR download codes out.
//!
//! # Ground Rules
//! 1. Headers Are Looked Up By Name
//! 2. A Bad Row Is Skipped, Never Fatal
//! 3. An I/O Failure Is Always Fatal
//! 4. Same Name, Same Path

pub mod validation;
pub mod photo;
pub mod extract;
pub mod card;
pub mod codes;
pub mod report;
pub mod manifest;
pub mod config;
pub mod pipeline;

pub use validation::{validate_email, validate_phone, validate_url, Field, FieldViolation};
pub use photo::{resolve_photo, EncodedPhoto, PhotoError};
pub use extract::{extract_records, ContactRecord, Extraction, ExtractError, ExtractOptions, HeaderMap, RecordExtractor, RowFailure};
pub use card::{render_card, CardBuilder, RenderedCard};
pub use codes::{CodeImageError, CodeImageGenerator, InlineImage, QrCodeGenerator};
pub use report::{CsvReportWriter, ReportError, ReportRow, ReportWriter};
pub use manifest::{canonical_json, sha256_hex, RunManifest};
pub use config::{ConfigError, InputSource, PartialSettings, Settings};
pub use pipeline::{BatchOptions, BatchOutcome, BatchPipeline, PipelineError, ResultRecord};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
