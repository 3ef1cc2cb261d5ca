//! Code Images - QR encoding of download URLs

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use image::{ImageFormat, Luma};
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest rendered side in pixels
pub const QR_MIN_SIZE: u32 = 200;

#[derive(Debug, Error)]
pub enum CodeImageError {
    #[error("Failed to encode QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("Failed to write QR image: {0}")]
    Image(#[from] image::ImageError),
}

/// A `data:` URL suitable for an `<img src>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct InlineImage(pub String);

impl InlineImage {
    pub fn png(bytes: &[u8]) -> Self {
        Self(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn markup(&self) -> String {
        format!(r#"<img src="{}" alt="QR Code">"#, self.0)
    }
}

/// Scannable code capability consumed by the batch pipeline
pub trait CodeImageGenerator {
    fn encode(&self, url: &str) -> Result<InlineImage, CodeImageError>;
    fn encode_to_file(&self, url: &str, path: &Path) -> Result<(), CodeImageError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QrCodeGenerator;

impl QrCodeGenerator {
    fn render(&self, url: &str) -> Result<image::ImageBuffer<Luma<u8>, Vec<u8>>, CodeImageError> {
        let code = QrCode::new(url.as_bytes())?;
        Ok(code
            .render::<Luma<u8>>()
            .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
            .build())
    }
}

impl CodeImageGenerator for QrCodeGenerator {
    fn encode(&self, url: &str) -> Result<InlineImage, CodeImageError> {
        let img = self.render(url)?;
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png)?;
        Ok(InlineImage::png(png.get_ref()))
    }

    fn encode_to_file(&self, url: &str, path: &Path) -> Result<(), CodeImageError> {
        let img = self.render(url)?;
        img.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}
