//! Configuration - CLI Flags Over Config File Over Defaults

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::DEFAULT_OUTPUT_DIR;
use crate::report::DEFAULT_REPORT_PATH;
use crate::validation::validate_url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Input is required (--input, --string, or `input`/`inlineCsv` in config)")]
    MissingInput,

    #[error("Base URL is required (--base-url or `baseUrl` in config)")]
    MissingBaseUrl,

    #[error("Base URL is not an absolute URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Unsupported config file extension: {0} (expected .json, .yaml or .yml)")]
    UnsupportedExtension(String),

    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Values that may come from a file or from the command line
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialSettings {
    #[serde(default)]
    pub input: Option<PathBuf>,
    #[serde(default)]
    pub inline_csv: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub image_dir: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub report: Option<PathBuf>,
    #[serde(default)]
    pub manifest: Option<PathBuf>,
}

impl PartialSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let is_json = match ext.as_str() {
            "json" => true,
            "yaml" | "yml" => false,
            _ => return Err(ConfigError::UnsupportedExtension(ext)),
        };

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml::from_str(&content)?)
        }
    }

    /// Fields set in `self` win over `fallback`. The input source is taken
    /// as a whole from the first layer that names one.
    pub fn or(self, fallback: PartialSettings) -> Self {
        let (input, inline_csv) = if self.input.is_some() || self.inline_csv.is_some() {
            (self.input, self.inline_csv)
        } else {
            (fallback.input, fallback.inline_csv)
        };
        Self {
            input,
            inline_csv,
            base_url: self.base_url.or(fallback.base_url),
            image_dir: self.image_dir.or(fallback.image_dir),
            output_dir: self.output_dir.or(fallback.output_dir),
            report: self.report.or(fallback.report),
            manifest: self.manifest.or(fallback.manifest),
        }
    }
}

/// Where the CSV comes from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    File(PathBuf),
    Inline(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub input: InputSource,
    pub base_url: String,
    pub image_dir: PathBuf,
    pub output_dir: PathBuf,
    pub report: PathBuf,
    pub manifest: Option<PathBuf>,
}

impl Settings {
    /// Merge CLI values over an optional config file and apply defaults
    pub fn resolve(cli: PartialSettings, config: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config {
            Some(path) => PartialSettings::load(path)?,
            None => PartialSettings::default(),
        };
        Self::from_partial(cli.or(file))
    }

    pub fn from_partial(partial: PartialSettings) -> Result<Self, ConfigError> {
        // Inline CSV wins over a path given in the same layer
        let input = match (partial.inline_csv, partial.input) {
            (Some(csv), _) => InputSource::Inline(csv),
            (None, Some(path)) => InputSource::File(path),
            (None, None) => return Err(ConfigError::MissingInput),
        };
        let base_url = partial.base_url.ok_or(ConfigError::MissingBaseUrl)?;
        if !validate_url(&base_url) {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }

        Ok(Self {
            input,
            base_url,
            image_dir: partial.image_dir.unwrap_or_else(|| PathBuf::from(".")),
            output_dir: partial
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            report: partial
                .report
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH)),
            manifest: partial.manifest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(input: Option<&str>, base_url: Option<&str>) -> PartialSettings {
        PartialSettings {
            input: input.map(PathBuf::from),
            base_url: base_url.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let s = Settings::resolve(cli(Some("in.csv"), Some("https://h")), None).unwrap();
        assert_eq!(s.input, InputSource::File(PathBuf::from("in.csv")));
        assert_eq!(s.image_dir, PathBuf::from("."));
        assert_eq!(s.output_dir, PathBuf::from("./output"));
        assert_eq!(s.report, PathBuf::from("output.csv"));
        assert_eq!(s.manifest, None);
    }

    #[test]
    fn test_missing_required() {
        assert!(matches!(
            Settings::resolve(cli(None, Some("https://h")), None),
            Err(ConfigError::MissingInput)
        ));
        assert!(matches!(
            Settings::resolve(cli(Some("in.csv"), None), None),
            Err(ConfigError::MissingBaseUrl)
        ));
        assert!(matches!(
            Settings::resolve(cli(Some("in.csv"), Some("cards.example.com")), None),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_cli_over_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.json");
        fs::write(
            &path,
            r#"{"input": "file.csv", "baseUrl": "https://file", "imageDir": "photos"}"#,
        )
        .unwrap();

        let s = Settings::resolve(cli(None, Some("https://cli")), Some(&path)).unwrap();
        assert_eq!(s.input, InputSource::File(PathBuf::from("file.csv")));
        assert_eq!(s.base_url, "https://cli");
        assert_eq!(s.image_dir, PathBuf::from("photos"));
    }

    #[test]
    fn test_inline_csv_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.json");
        fs::write(&path, r#"{"input": "file.csv", "baseUrl": "https://file"}"#).unwrap();

        let inline = PartialSettings {
            inline_csv: Some("Full Name,Phone,Email\n".to_string()),
            ..Default::default()
        };
        let s = Settings::resolve(inline, Some(&path)).unwrap();
        assert_eq!(s.input, InputSource::Inline("Full Name,Phone,Email\n".to_string()));

        // A CLI path beats inline CSV from the config file
        fs::write(
            &path,
            r#"{"inlineCsv": "Full Name,Phone,Email", "baseUrl": "https://file"}"#,
        )
        .unwrap();
        let s = Settings::resolve(cli(Some("cli.csv"), None), Some(&path)).unwrap();
        assert_eq!(s.input, InputSource::File(PathBuf::from("cli.csv")));

        let s = Settings::resolve(PartialSettings::default(), Some(&path)).unwrap();
        assert_eq!(s.input, InputSource::Inline("Full Name,Phone,Email".to_string()));
    }

    #[test]
    fn test_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.yml");
        fs::write(&path, "input: file.csv\nbaseUrl: https://file\nreport: out/report.csv\n").unwrap();

        let s = Settings::resolve(PartialSettings::default(), Some(&path)).unwrap();
        assert_eq!(s.base_url, "https://file");
        assert_eq!(s.report, PathBuf::from("out/report.csv"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = PartialSettings::load(Path::new("cards.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedExtension(ref e) if e == "toml"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.json");
        fs::write(&path, r#"{"inptu": "file.csv"}"#).unwrap();
        assert!(matches!(PartialSettings::load(&path), Err(ConfigError::Json(_))));
    }
}
