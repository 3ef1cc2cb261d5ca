//! Field Validators - Shape Checks, Not Proofs
//!
//! Validators are pure. Phone is a fixed-width grouping formatter,
//! email is a coarse shape check, URL must parse as absolute.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Separator between phone digit groups in canonical form.
pub const PHONE_SEPARATOR: &str = ".";

/// Punctuation removed from a phone number before counting digits.
const PHONE_STRIP: &[char] = &['-', '.', '(', ')', '+', '/'];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FullName,
    Phone,
    Email,
    Image,
    Url,
    LinkedinUrl,
}

impl Field {
    pub fn column(&self) -> &'static str {
        match self {
            Field::FullName => "Full Name",
            Field::Phone => "Phone",
            Field::Email => "Email",
            Field::Image => "Image",
            Field::Url => "URL",
            Field::LinkedinUrl => "LinkedIn URL",
        }
    }
}

/// A failed field check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldViolation {
    pub rule: String,
    pub field: Field,
    pub message: String,
    pub actual: Option<String>,
}

impl FieldViolation {
    pub fn new(rule: &str, field: Field, message: impl Into<String>, actual: Option<&str>) -> Self {
        Self {
            rule: rule.to_string(),
            field,
            message: message.into(),
            actual: actual.map(str::to_string),
        }
    }
}

/// Format a phone number as `C.AAA.BBB.CCCC` or `AAA.BBB.CCCC`.
///
/// Only 10 and 11 digit numbers are accepted. International numbers of
/// other lengths are rejected on purpose; this is a grouping policy, not
/// an E.164 check.
pub fn validate_phone(raw: &str) -> Option<String> {
    let stripped: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !PHONE_STRIP.contains(c))
        .collect();

    if !stripped.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let groups: [&str; 4] = match stripped.len() {
        11 => [
            &stripped[0..1],
            &stripped[1..4],
            &stripped[4..7],
            &stripped[7..11],
        ],
        10 => ["", &stripped[0..3], &stripped[3..6], &stripped[6..10]],
        _ => return None,
    };

    Some(
        groups
            .iter()
            .filter(|g| !g.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(PHONE_SEPARATOR),
    )
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
    })
}

pub fn validate_email(raw: &str) -> bool {
    email_pattern().is_match(raw)
}

/// Accepts anything that parses as an absolute URL with a scheme.
pub fn validate_url(raw: &str) -> bool {
    Url::parse(raw).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_ten_digits() {
        assert_eq!(validate_phone("1234567898").as_deref(), Some("123.456.7898"));
        assert_eq!(validate_phone("(123) 456-7898").as_deref(), Some("123.456.7898"));
    }

    #[test]
    fn test_phone_eleven_digits() {
        assert_eq!(validate_phone("12345678989").as_deref(), Some("1.234.567.8989"));
        assert_eq!(validate_phone("+1 234-567-8989").as_deref(), Some("1.234.567.8989"));
    }

    #[test]
    fn test_phone_idempotent() {
        for raw in ["1234567898", "12345678989"] {
            let once = validate_phone(raw).unwrap();
            let twice = validate_phone(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_phone_rejects_other_lengths() {
        assert!(validate_phone("123456789").is_none());
        assert!(validate_phone("123456789012").is_none());
        assert!(validate_phone("").is_none());
        assert!(validate_phone("123abc7898").is_none());
        // Valid internationally, outside the grouping policy
        assert!(validate_phone("+44 20 7946 0958 1").is_none());
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_email("alice@example.com"));
        assert!(validate_email("a@b.c"));
        assert!(!validate_email("alice.example.com"));
        assert!(!validate_email("alice@example"));
        assert!(!validate_email("al ice@example.com"));
        assert!(!validate_email("alice@@example.com"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_url_absolute_only() {
        assert!(validate_url("https://x.com"));
        assert!(validate_url("https://www.linkedin.com/in/alice"));
        assert!(validate_url("mailto:alice@example.com"));
        assert!(!validate_url("x.com"));
        assert!(!validate_url("/relative/path"));
        assert!(!validate_url(""));
    }

    #[test]
    fn test_field_columns() {
        assert_eq!(Field::FullName.column(), "Full Name");
        assert_eq!(Field::LinkedinUrl.column(), "LinkedIn URL");
    }
}
