//! Keybind record parser
//!
//! Reads keybind text made of field records and produces canonical bind data:
//!
//! ```text
//! # Tactical
//! Key: F1
//! Mode: space
//! Command: FireAll $$ +STOTrayExecByTray 0 0
//! Description: Alpha strike
//!
//! Key: ctrl
//! Commands: target_nearest_enemy
//! ```
//!
//! Blank lines end a record, and so does a second `Key` field. Parsing never
//! fails: records without a usable key are reported as skipped.

use crate::chain;
use crate::models::{Builds, CommandChain, FieldRecord, KeyToken};
use crate::normalizer::KeyNormalizer;
use crate::tokenizer::tokenize_lines;

/// Build mode used when a record names none
pub const DEFAULT_MODE: &str = "space";

/// One key bound to a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBind {
    /// Line of the `Key` field
    pub line: usize,
    pub mode: String,
    pub key: KeyToken,
    pub commands: CommandChain,
    pub description: Option<String>,
}

/// Why a record was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The record has no `Key` field
    MissingKey,
    /// The `Key` field has no value
    EmptyKey,
}

/// A record that produced no bind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedRecord {
    /// First line of the record
    pub line: usize,
    pub reason: SkipReason,
}

/// Everything read from one keybind text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBinds {
    pub binds: Vec<ParsedBind>,
    pub skipped: Vec<SkippedRecord>,
}

impl ParsedBinds {
    /// Fold binds into a `builds` mapping; later binds replace earlier ones
    pub fn into_builds(self) -> Builds {
        let mut builds = Builds::new();
        for bind in self.binds {
            builds
                .entry(bind.mode)
                .or_default()
                .insert(bind.key.to_string(), bind.commands);
        }
        builds
    }
}

/// Parses keybind record text with a [`KeyNormalizer`]
#[derive(Debug, Clone, Default)]
pub struct RecordParser {
    normalizer: KeyNormalizer,
}

impl RecordParser {
    /// Create a parser with the built-in key tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser using a configured normalizer
    pub fn with_normalizer(normalizer: KeyNormalizer) -> Self {
        RecordParser { normalizer }
    }

    /// Parse a whole text
    pub fn parse(&self, content: &str) -> ParsedBinds {
        let mut parsed = ParsedBinds::default();
        let mut pending: Option<PendingRecord> = None;

        for (line_num, record) in tokenize_lines(content) {
            if record.field_name.is_empty() && !record.has_colon {
                self.flush(pending.take(), &mut parsed);
                continue;
            }
            if is_comment(&record) {
                continue;
            }
            if !record.has_colon {
                tracing::trace!(line = line_num, "Ignoring line without a field");
                continue;
            }

            let is_key = field_is(&record, &["key"]);
            if is_key && pending.as_ref().is_some_and(|p| p.key.is_some()) {
                self.flush(pending.take(), &mut parsed);
            }

            let current = pending.get_or_insert_with(|| PendingRecord::new(line_num));
            if is_key {
                current.key = Some((line_num, record));
            } else if field_is(&record, &["command", "commands"]) {
                current.commands.extend(chain::split(&record.value));
            } else if field_is(&record, &["mode", "environment"]) {
                if !record.value.is_empty() {
                    current.mode = Some(record.value.to_lowercase());
                }
            } else if field_is(&record, &["description"]) {
                if !record.value.is_empty() {
                    current.description = Some(record.value);
                }
            } else {
                tracing::trace!(line = line_num, field = %record.field_name, "Ignoring unknown field");
            }
        }
        self.flush(pending, &mut parsed);

        parsed
    }

    fn flush(&self, pending: Option<PendingRecord>, parsed: &mut ParsedBinds) {
        let Some(record) = pending else {
            return;
        };

        let Some((key_line, key_record)) = record.key else {
            tracing::debug!(line = record.start_line, "Skipping keybind record without a key");
            parsed.skipped.push(SkippedRecord {
                line: record.start_line,
                reason: SkipReason::MissingKey,
            });
            return;
        };

        match self.normalizer.normalize(&key_record, key_line) {
            Some(key) => parsed.binds.push(ParsedBind {
                line: key_line,
                mode: record.mode.unwrap_or_else(|| DEFAULT_MODE.to_string()),
                key,
                commands: record.commands,
                description: record.description,
            }),
            None => {
                tracing::debug!(line = key_line, "Skipping keybind record with an empty key");
                parsed.skipped.push(SkippedRecord {
                    line: record.start_line,
                    reason: SkipReason::EmptyKey,
                });
            }
        }
    }
}

/// Parse keybind text with the built-in key tables
pub fn parse_binds(content: &str) -> ParsedBinds {
    RecordParser::new().parse(content)
}

struct PendingRecord {
    start_line: usize,
    key: Option<(usize, FieldRecord)>,
    commands: CommandChain,
    mode: Option<String>,
    description: Option<String>,
}

impl PendingRecord {
    fn new(start_line: usize) -> Self {
        PendingRecord {
            start_line,
            key: None,
            commands: CommandChain::empty(),
            mode: None,
            description: None,
        }
    }
}

fn field_is(record: &FieldRecord, names: &[&str]) -> bool {
    names
        .iter()
        .any(|name| record.field_name.eq_ignore_ascii_case(name))
}

fn is_comment(record: &FieldRecord) -> bool {
    record.field_name.starts_with('#') || record.field_name.starts_with("//")
}
