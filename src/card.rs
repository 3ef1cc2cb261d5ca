//! Card Renderer - vCard 3.0 Builder
//!
//! Sections are emitted in a fixed order. Optional sections are either
//! present in full or absent; field values are never re-scanned, so a
//! value that looks like another field cannot be substituted twice.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::extract::ContactRecord;
use crate::photo::EncodedPhoto;

pub const VCARD_VERSION: &str = "3.0";
const BEGIN: &str = "BEGIN:VCARD";
const END: &str = "END:VCARD";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderedCard {
    pub content: String,
    pub output_path: PathBuf,
}

impl RenderedCard {
    pub fn file_name(&self) -> Option<&str> {
        self.output_path.file_name().and_then(|n| n.to_str())
    }
}

/// Named sections of a card, each independently present or absent
#[derive(Debug, Clone, Default)]
pub struct CardBuilder<'a> {
    full_name: &'a str,
    phone: &'a str,
    email: &'a str,
    photo: Option<&'a EncodedPhoto>,
    url: Option<&'a str>,
    linkedin_url: Option<&'a str>,
}

impl<'a> CardBuilder<'a> {
    pub fn new(full_name: &'a str, phone: &'a str, email: &'a str) -> Self {
        Self {
            full_name,
            phone,
            email,
            ..Default::default()
        }
    }

    pub fn photo(mut self, photo: Option<&'a EncodedPhoto>) -> Self {
        self.photo = photo;
        self
    }

    pub fn url(mut self, url: Option<&'a str>) -> Self {
        self.url = url;
        self
    }

    pub fn linkedin_url(mut self, url: Option<&'a str>) -> Self {
        self.linkedin_url = url;
        self
    }

    pub fn build(&self) -> String {
        let mut lines = vec![
            BEGIN.to_string(),
            format!("VERSION:{}", VCARD_VERSION),
            format!("FN:{}", self.full_name),
            format!("TEL:{}", self.phone),
            format!("EMAIL:{}", self.email),
        ];

        if let Some(photo) = self.photo {
            lines.push(format!(
                "PHOTO;ENCODING={};TYPE={}:{}",
                photo.encoding, photo.media_type, photo.data_base64
            ));
        }
        if let Some(url) = self.url {
            lines.push(format!("URL:{}", url));
        }
        if let Some(url) = self.linkedin_url {
            lines.push(format!("X-SOCIALPROFILE;TYPE=linkedin:{}", url));
        }

        lines.push(END.to_string());

        let mut content = lines.join("\n");
        content.push('\n');
        content
    }
}

pub fn render_card(record: &ContactRecord) -> RenderedCard {
    let content = CardBuilder::new(&record.full_name, &record.phone, &record.email)
        .photo(record.photo.as_ref())
        .url(record.url.as_deref())
        .linkedin_url(record.linkedin_url.as_deref())
        .build();

    RenderedCard {
        content,
        output_path: record.output_path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ContactRecord {
        ContactRecord {
            full_name: "Alice Johnson".to_string(),
            phone: "123.456.7898".to_string(),
            email: "alice@example.com".to_string(),
            image_ref: None,
            photo: None,
            url: None,
            linkedin_url: None,
            output_path: PathBuf::from("./output/Alice_Johnson.vcf"),
        }
    }

    #[test]
    fn test_minimal_card() {
        let card = render_card(&record());
        assert_eq!(
            card.content,
            "BEGIN:VCARD\nVERSION:3.0\nFN:Alice Johnson\nTEL:123.456.7898\nEMAIL:alice@example.com\nEND:VCARD\n"
        );
        assert!(!card.content.contains("PHOTO"));
        assert!(!card.content.contains("URL"));
        assert_eq!(card.file_name(), Some("Alice_Johnson.vcf"));
    }

    #[test]
    fn test_full_card_order() {
        let mut r = record();
        r.photo = Some(EncodedPhoto::jpeg(b"img"));
        r.url = Some("https://x.com".to_string());
        r.linkedin_url = Some("https://linkedin.com/in/alice".to_string());

        let content = render_card(&r).content;
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.first(), Some(&"BEGIN:VCARD"));
        assert_eq!(lines.last(), Some(&"END:VCARD"));
        assert_eq!(lines[5], "PHOTO;ENCODING=b;TYPE=JPEG:aW1n");
        assert_eq!(lines[6], "URL:https://x.com");
        assert_eq!(lines[7], "X-SOCIALPROFILE;TYPE=linkedin:https://linkedin.com/in/alice");
    }

    #[test]
    fn test_no_double_substitution() {
        let mut r = record();
        r.full_name = "TEL:EMAIL:".to_string();
        let content = render_card(&r).content;
        assert!(content.contains("FN:TEL:EMAIL:\n"));
        assert!(content.contains("TEL:123.456.7898\n"));
        assert_eq!(content.matches(BEGIN).count(), 1);
        assert_eq!(content.matches(END).count(), 1);
    }
}
