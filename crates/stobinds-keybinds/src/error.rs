//! Error types for the fallible boundaries of the keybind engine
//!
//! The tokenizer, normalizer, splitter and migrator never fail. These errors
//! only surface when decoding text documents, loading configuration, or
//! assembling a migration registry.

use thiserror::Error;

use crate::version::SemanticVersion;

/// Errors that can occur when parsing a dotted version tag
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Empty version string")]
    Empty,

    #[error("Invalid version '{input}': {message}")]
    Invalid { input: String, message: String },
}

/// Errors that can occur while building a migration registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("A migration step from {from} is already registered")]
    DuplicateStep { from: SemanticVersion },

    #[error("Migration step must advance the version: {from} -> {to}")]
    NonAdvancingStep {
        from: SemanticVersion,
        to: SemanticVersion,
    },
}

/// Errors that can occur when decoding or encoding profile documents
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid JSON document: {0}")]
    InvalidJson(String),

    #[error("Invalid YAML document: {0}")]
    InvalidYaml(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown document format: {0}")]
    UnknownFormat(String),
}

/// Errors that can occur when loading engine configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid JSON configuration: {0}")]
    InvalidJson(String),

    #[error("Invalid YAML configuration: {0}")]
    InvalidYaml(String),

    #[error("Literal symbol for '{name}' must be a single character, got {value:?}")]
    InvalidLiteralSymbol { name: String, value: String },
}
