//! Photo Resolver
//!
//! Reads an image next to the input and encodes it for inline embedding.
//! The payload is always tagged as JPEG; the bytes are never sniffed.

use std::fs;
use std::path::{Component, Path, PathBuf};

use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const PHOTO_ENCODING: &str = "b";
pub const PHOTO_TYPE: &str = "JPEG";

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("Image reference must be a relative path inside the image directory: {0}")]
    OutsideSourceDir(String),

    #[error("Failed to read image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncodedPhoto {
    pub encoding: String,
    pub media_type: String,
    pub data_base64: String,
}

impl EncodedPhoto {
    pub fn jpeg(bytes: &[u8]) -> Self {
        Self {
            encoding: PHOTO_ENCODING.to_string(),
            media_type: PHOTO_TYPE.to_string(),
            data_base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }
}

/// Resolve `image_ref` against `source_dir`.
///
/// Returns `Ok(None)` without touching the filesystem when there is no
/// reference.
pub fn resolve_photo(
    image_ref: Option<&str>,
    source_dir: &Path,
) -> Result<Option<EncodedPhoto>, PhotoError> {
    let Some(image_ref) = image_ref else {
        return Ok(None);
    };

    let relative = Path::new(image_ref);
    let contained = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !contained {
        return Err(PhotoError::OutsideSourceDir(image_ref.to_string()));
    }

    let path = source_dir.join(relative);
    let bytes = fs::read(&path).map_err(|source| PhotoError::Read {
        path: path.clone(),
        source,
    })?;

    debug!(path = %path.display(), bytes = bytes.len(), "photo resolved");
    Ok(Some(EncodedPhoto::jpeg(&bytes)))
}
