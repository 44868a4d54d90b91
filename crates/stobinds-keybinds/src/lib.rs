//! Keybind record parsing and profile schema migration
//!
//! This crate is the pure transformation core behind STO keybind profiles:
//! - Field tokenizing of raw keybind lines
//! - Key token normalization with a case-insensitive alias table
//! - Command chain splitting on the `$$` delimiter
//! - Record parsing from keybind text into canonical builds
//! - Schema migration of stored profile documents through an ordered step registry
//! - JSON and YAML profile document decoding and encoding
//!
//! Nothing here performs I/O or decides when migration runs; callers own
//! storage, scheduling and rendering.

pub mod chain;
pub mod clock;
pub mod config;
pub mod document;
pub mod error;
pub mod migrator;
pub mod models;
pub mod normalizer;
pub mod observer;
pub mod parser;
pub mod registry;
pub mod tokenizer;
pub mod version;

// Re-export public types
pub use chain::{split, split_commands, split_value, COMMAND_DELIMITER};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{EngineConfig, DEFAULT_VFX_ALIAS_PREFIX};
pub use document::{
    parse_collection, parse_collection_auto, parse_profile, parse_profile_auto, DocumentFormat,
};
pub use error::{ConfigError, DocumentError, RegistryError, VersionError};
pub use migrator::{needs_normalization, migrate, AppliedStep, MigrationOutcome, Migrator};
pub use models::{
    Alias, AliasCommands, AliasKind, Builds, CommandChain, FieldRecord, KeyToken, Profile,
    ProfileCollection,
};
pub use normalizer::{normalize_key, normalize_literal_key, KeyNormalizer};
pub use observer::{
    MigrationEvent, MigrationObserver, NoopObserver, RecordingObserver, RemovalReason,
    TracingObserver,
};
pub use parser::{parse_binds, ParsedBind, ParsedBinds, RecordParser, SkipReason, SkippedRecord};
pub use registry::{vfx_alias_purge, MigrationRegistry, MigrationStep, StepTransform, VFX_ALIAS_PURGE};
pub use tokenizer::{tokenize_line, tokenize_lines};
pub use version::SemanticVersion;
