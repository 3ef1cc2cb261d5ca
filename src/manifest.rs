//! Run Manifest - SHA-256 Record of a Batch
//!
//! Lists every generated card with its content hash so a run can be
//! checked against the files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::extract::RowFailure;
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    serde_json::to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestCard {
    pub file_name: String,
    pub download_url: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunManifest {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub base_url: String,
    pub cards: Vec<ManifestCard>,
    pub failures: Vec<RowFailure>,
    pub manifest_hash: String,
}

impl RunManifest {
    pub fn new(base_url: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            base_url: base_url.to_string(),
            cards: vec![],
            failures: vec![],
            manifest_hash: String::new(),
        }
    }

    /// Record a card; an entry for the same file is replaced, so the
    /// manifest always describes what is on disk. Returns true on replace.
    pub fn add_card(&mut self, file_name: &str, download_url: &str, content: &[u8]) -> bool {
        let card = ManifestCard {
            file_name: file_name.to_string(),
            download_url: download_url.to_string(),
            sha256: sha256_hex(content),
        };
        match self.cards.iter_mut().find(|c| c.file_name == file_name) {
            Some(existing) => {
                *existing = card;
                true
            }
            None => {
                self.cards.push(card);
                false
            }
        }
    }

    /// Hash of the canonical manifest with `manifestHash` left empty
    pub fn compute_hash(&self) -> Result<String, serde_json::Error> {
        let unsealed = Self {
            manifest_hash: String::new(),
            ..self.clone()
        };
        Ok(sha256_hex(canonical_json(&unsealed)?.as_bytes()))
    }

    pub fn seal(mut self) -> Result<Self, serde_json::Error> {
        self.manifest_hash = self.compute_hash()?;
        Ok(self)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ManifestError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": {"b": 1, "a": 2}});
        assert_eq!(canonical_json(&obj).unwrap(), r#"{"a":2,"m":{"a":2,"b":1},"z":1}"#);
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_seal_is_verifiable() {
        let mut manifest = RunManifest::new("https://cards.example.com");
        manifest.add_card("A.vcf", "https://cards.example.com/download/A.vcf", b"BEGIN:VCARD");
        let sealed = manifest.seal().unwrap();

        assert_eq!(sealed.manifest_hash.len(), 64);
        assert_eq!(sealed.compute_hash().unwrap(), sealed.manifest_hash);
    }

    #[test]
    fn test_add_card_replaces_same_file() {
        let mut manifest = RunManifest::new("https://h");
        assert!(!manifest.add_card("A.vcf", "https://h/download/A.vcf", b"first"));
        assert!(!manifest.add_card("B.vcf", "https://h/download/B.vcf", b"other"));
        assert!(manifest.add_card("A.vcf", "https://h/download/A.vcf", b"second"));

        assert_eq!(manifest.cards.len(), 2);
        assert_eq!(manifest.cards[0].file_name, "A.vcf");
        assert_eq!(manifest.cards[0].sha256, sha256_hex(b"second"));
    }

    #[test]
    fn test_write_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let manifest = RunManifest::new("https://h").seal().unwrap();
        manifest.write_to(&path).unwrap();

        let loaded: RunManifest =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.id, manifest.id);
        assert_eq!(loaded.manifest_hash, manifest.manifest_hash);
        assert_eq!(loaded.engine_version, ENGINE_VERSION);
    }
}
