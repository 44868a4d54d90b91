//! Profile document codec
//!
//! Decodes and encodes stored profile documents. Storage itself belongs to the
//! caller; this module only converts between text and [`Profile`] values.
//!
//! # Document shape
//!
//! ```json
//! {
//!   "name": "Tactical",
//!   "migrationVersion": "2.1.0",
//!   "builds": { "space": { "F1": ["FireAll", "+STOTrayExecByTray 0 0"] } },
//!   "aliases": { "Heal": { "commands": ["Heal1", "Heal2"], "type": "alias" } },
//!   "lastModified": "2024-01-01T00:00:00Z"
//! }
//! ```
//!
//! Unknown fields are kept and written back unchanged.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DocumentError;
use crate::models::{Profile, ProfileCollection};

/// Text encodings a profile document can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Json => write!(f, "json"),
            DocumentFormat::Yaml => write!(f, "yaml"),
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(DocumentFormat::Json),
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            other => Err(DocumentError::UnknownFormat(other.to_string())),
        }
    }
}

/// Decode a single profile
pub fn parse_profile(content: &str, format: DocumentFormat) -> Result<Profile, DocumentError> {
    decode(content, format)
}

/// Decode a single profile, trying JSON first and falling back to YAML
pub fn parse_profile_auto(content: &str) -> Result<Profile, DocumentError> {
    decode_auto(content)
}

/// Decode a multi-profile document
pub fn parse_collection(
    content: &str,
    format: DocumentFormat,
) -> Result<ProfileCollection, DocumentError> {
    decode(content, format)
}

/// Decode a multi-profile document, trying JSON first and falling back to YAML
pub fn parse_collection_auto(content: &str) -> Result<ProfileCollection, DocumentError> {
    decode_auto(content)
}

/// Encode any document as pretty-printed JSON
pub fn to_json_pretty<T: Serialize>(document: &T) -> Result<String, DocumentError> {
    serde_json::to_string_pretty(document).map_err(|e| {
        DocumentError::Serialization(format!("Failed to serialize document: {}", e))
    })
}

/// Encode any document as YAML
pub fn to_yaml<T: Serialize>(document: &T) -> Result<String, DocumentError> {
    serde_yaml::to_string(document).map_err(|e| {
        DocumentError::Serialization(format!("Failed to serialize document: {}", e))
    })
}

/// Encode any document in the requested format
pub fn encode<T: Serialize>(document: &T, format: DocumentFormat) -> Result<String, DocumentError> {
    match format {
        DocumentFormat::Json => to_json_pretty(document),
        DocumentFormat::Yaml => to_yaml(document),
    }
}

fn decode<T: DeserializeOwned>(content: &str, format: DocumentFormat) -> Result<T, DocumentError> {
    match format {
        DocumentFormat::Json => serde_json::from_str(content)
            .map_err(|e| DocumentError::InvalidJson(e.to_string())),
        DocumentFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| DocumentError::InvalidYaml(e.to_string())),
    }
}

fn decode_auto<T: DeserializeOwned>(content: &str) -> Result<T, DocumentError> {
    match decode(content, DocumentFormat::Json) {
        Ok(document) => Ok(document),
        Err(json_err) => {
            tracing::debug!("Document is not JSON ({}), trying YAML", json_err);
            decode(content, DocumentFormat::Yaml)
        }
    }
}
