//! Key token normalization
//!
//! Raw key spellings from keybind text are folded onto canonical names with a
//! case-insensitive lookup. Unknown spellings pass through untouched. A second
//! table maps a few canonical names onto the literal character they type.
//!
//! `alt` canonicalizes to `ALT`, unlike every other modifier. Downstream
//! consumers match on that exact casing, so it must stay.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::config::EngineConfig;
use crate::models::{FieldRecord, KeyToken};

/// Built-in spellings, keyed by lowercase raw text
const KEY_ALIASES: &[(&str, &str)] = &[
    ("space", "Space"),
    ("spacebar", "Space"),
    ("ctrl", "Control"),
    ("control", "Control"),
    ("alt", "ALT"),
    ("shift", "Shift"),
    ("tab", "Tab"),
    ("enter", "Enter"),
    ("return", "Enter"),
    ("esc", "Escape"),
    ("escape", "Escape"),
    ("backspace", "Backspace"),
    ("del", "Delete"),
    ("delete", "Delete"),
    ("ins", "Insert"),
    ("insert", "Insert"),
    ("home", "Home"),
    ("end", "End"),
    ("pgup", "PageUp"),
    ("pageup", "PageUp"),
    ("pgdn", "PageDown"),
    ("pagedown", "PageDown"),
    ("up", "Up"),
    ("down", "Down"),
    ("left", "Left"),
    ("right", "Right"),
    ("semicolon", "SemiColon"),
    ("lbutton", "Lbutton"),
    ("rbutton", "Rbutton"),
    ("mbutton", "Middleclick"),
    ("middleclick", "Middleclick"),
    ("wheelplus", "Wheelplus"),
    ("wheelminus", "Wheelminus"),
];

/// Canonical names that stand for a literal character
const LITERAL_SYMBOLS: &[(&str, char)] = &[("Space", ' '), ("SemiColon", ';')];

static DEFAULT_NORMALIZER: Lazy<KeyNormalizer> = Lazy::new(KeyNormalizer::new);

/// Normalize a record with the built-in tables
pub fn normalize_key(record: &FieldRecord, position: usize) -> Option<KeyToken> {
    DEFAULT_NORMALIZER.normalize(record, position)
}

/// Normalize a record with the built-in tables, resolving literal symbols
pub fn normalize_literal_key(record: &FieldRecord, position: usize) -> Option<KeyToken> {
    DEFAULT_NORMALIZER.normalize_literal(record, position)
}

/// Maps raw key spellings to canonical key tokens
#[derive(Debug, Clone)]
pub struct KeyNormalizer {
    aliases: HashMap<String, String>,
    literals: HashMap<String, char>,
}

impl KeyNormalizer {
    /// Create a normalizer with the built-in tables
    pub fn new() -> Self {
        KeyNormalizer {
            aliases: KEY_ALIASES
                .iter()
                .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
                .collect(),
            literals: LITERAL_SYMBOLS
                .iter()
                .map(|(name, c)| (name.to_string(), *c))
                .collect(),
        }
    }

    /// Create a normalizer with the built-in tables extended by configuration
    ///
    /// Built-in spellings win over configured ones with the same raw text.
    /// Configured names that are themselves spellings of another key are
    /// followed to the end, so normalizing a result never changes it again.
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut normalizer = KeyNormalizer::new();

        for (raw, canonical) in &config.key_aliases {
            normalizer.add_alias(raw, canonical);
        }
        for (name, c) in config.literal_chars() {
            normalizer.add_alias(name, name);
            normalizer.literals.entry(name.to_string()).or_insert(c);
        }
        normalizer.resolve_chains();

        normalizer
    }

    fn resolve_chains(&mut self) {
        let resolved: Vec<(String, String)> = self
            .aliases
            .iter()
            .map(|(raw, canonical)| (raw.clone(), self.resolve(canonical)))
            .filter(|(raw, canonical)| self.aliases.get(raw) != Some(canonical))
            .collect();

        for (raw, canonical) in resolved {
            tracing::debug!(raw = %raw, canonical = %canonical, "Resolved chained key alias");
            self.aliases.insert(raw, canonical);
        }
    }

    fn resolve(&self, canonical: &str) -> String {
        let mut current = canonical.to_string();
        let mut seen = HashSet::new();
        while seen.insert(current.to_lowercase()) {
            match self.aliases.get(&current.to_lowercase()) {
                Some(next) if next != &current => current = next.clone(),
                _ => break,
            }
        }
        function_key(&current.to_lowercase()).unwrap_or(current)
    }

    fn add_alias(&mut self, raw: &str, canonical: &str) {
        let canonical = canonical.trim();
        if raw.trim().is_empty() || canonical.is_empty() {
            return;
        }
        self.aliases
            .entry(raw.trim().to_lowercase())
            .or_insert_with(|| canonical.to_string());
        // keep normalize(normalize(x)) == normalize(x) for configured names
        self.aliases
            .entry(canonical.to_lowercase())
            .or_insert_with(|| canonical.to_string());
    }

    /// Normalize the key carried by a record
    ///
    /// Returns `None` for records that carry no key: no colon, or an empty
    /// value. `position` is only recorded in traces.
    pub fn normalize(&self, record: &FieldRecord, position: usize) -> Option<KeyToken> {
        if !record.has_colon {
            tracing::trace!(position, field = %record.field_name, "No colon, not a key record");
            return None;
        }
        let raw = record.value.trim();
        if raw.is_empty() {
            tracing::trace!(position, field = %record.field_name, "Empty key value");
            return None;
        }

        let canonical = self.canonical_name(raw);
        tracing::trace!(position, raw, canonical = %canonical, "Normalized key");
        Some(KeyToken::Named(canonical))
    }

    /// Normalize a record, then resolve literal symbols such as `Space` -> `' '`
    pub fn normalize_literal(&self, record: &FieldRecord, position: usize) -> Option<KeyToken> {
        self.normalize(record, position)
            .map(|token| self.to_literal(token))
    }

    /// Canonical spelling of a raw key name
    ///
    /// Lookup is case-insensitive; `f<N>` becomes `F<N>`; unknown names are
    /// returned with their original casing.
    pub fn canonical_name(&self, raw: &str) -> String {
        let lower = raw.to_lowercase();
        if let Some(canonical) = self.aliases.get(&lower) {
            return canonical.clone();
        }
        if let Some(canonical) = function_key(&lower) {
            return canonical;
        }
        raw.to_string()
    }

    /// Literal character for a canonical key name, if it has one
    pub fn literal_symbol(&self, canonical: &str) -> Option<char> {
        self.literals.get(canonical).copied()
    }

    /// Replace a named token by its literal character where one is defined
    pub fn to_literal(&self, token: KeyToken) -> KeyToken {
        match token {
            KeyToken::Named(name) => match self.literal_symbol(&name) {
                Some(c) => KeyToken::Literal(c),
                None => KeyToken::Named(name),
            },
            literal @ KeyToken::Literal(_) => literal,
        }
    }
}

impl Default for KeyNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn function_key(lower: &str) -> Option<String> {
    let digits = lower.strip_prefix('f')?;
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("F{}", digits))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(value: &str) -> FieldRecord {
        FieldRecord::new("Key", true, value)
    }

    #[test]
    fn test_normalize_modifiers() {
        let normalizer = KeyNormalizer::new();
        assert_eq!(normalizer.normalize(&key("CTRL"), 0).unwrap(), "Control");
        assert_eq!(normalizer.normalize(&key("control"), 0).unwrap(), "Control");
        assert_eq!(normalizer.normalize(&key("shift"), 0).unwrap(), "Shift");
        assert_eq!(normalizer.normalize(&key("TAB"), 0).unwrap(), "Tab");
    }

    #[test]
    fn test_alt_stays_uppercase() {
        let normalizer = KeyNormalizer::new();
        assert_eq!(normalizer.normalize(&key("alt"), 0).unwrap(), "ALT");
        assert_eq!(normalizer.normalize(&key("Alt"), 0).unwrap(), "ALT");
        assert_eq!(normalizer.normalize(&key("ALT"), 0).unwrap(), "ALT");
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(function_key("f1").as_deref(), Some("F1"));
        assert_eq!(function_key("f12").as_deref(), Some("F12"));
        assert_eq!(function_key("f"), None);
        assert_eq!(function_key("fire"), None);
        assert_eq!(function_key("f1a"), None);
    }

    #[test]
    fn test_pass_through_keeps_casing() {
        let normalizer = KeyNormalizer::new();
        assert_eq!(normalizer.canonical_name("UnknownKey123"), "UnknownKey123");
        assert_eq!(normalizer.canonical_name("numpad5"), "numpad5");
    }

    #[test]
    fn test_rejects_non_key_records() {
        let normalizer = KeyNormalizer::new();
        assert!(normalizer.normalize(&FieldRecord::new("Key", false, "SPACE"), 0).is_none());
        assert!(normalizer.normalize(&FieldRecord::new("Key", true, ""), 0).is_none());
        assert!(normalizer.normalize(&FieldRecord::new("Key", true, "   "), 0).is_none());
    }

    #[test]
    fn test_builtin_table_is_idempotent() {
        let normalizer = KeyNormalizer::new();
        for (_, canonical) in KEY_ALIASES {
            assert_eq!(normalizer.canonical_name(canonical), *canonical);
        }
    }

    #[test]
    fn test_literal_symbols() {
        let normalizer = KeyNormalizer::new();
        assert_eq!(
            normalizer.normalize_literal(&key("space"), 3),
            Some(KeyToken::Literal(' '))
        );
        assert_eq!(
            normalizer.normalize_literal(&key("semicolon"), 3),
            Some(KeyToken::Literal(';'))
        );
        assert_eq!(
            normalizer.normalize_literal(&key("ctrl"), 3),
            Some(KeyToken::Named("Control".to_string()))
        );
    }

    #[test]
    fn test_from_config_extends_tables() {
        let mut config = EngineConfig::default();
        config.key_aliases.insert("LMB".to_string(), "Lbutton".to_string());
        config.key_aliases.insert("alt".to_string(), "Alt".to_string());
        config.key_aliases.insert("thumb".to_string(), "Button4".to_string());
        config.literal_symbols.insert("Comma".to_string(), ",".to_string());

        let normalizer = KeyNormalizer::from_config(&config);
        assert_eq!(normalizer.canonical_name("lmb"), "Lbutton");
        assert_eq!(normalizer.canonical_name("alt"), "ALT");
        assert_eq!(normalizer.canonical_name("THUMB"), "Button4");
        assert_eq!(normalizer.canonical_name("button4"), "Button4");
        assert_eq!(
            normalizer.normalize_literal(&key("comma"), 0),
            Some(KeyToken::Literal(','))
        );
    }

    #[test]
    fn test_configured_aliases_do_not_chain() {
        let mut config = EngineConfig::default();
        config.key_aliases.insert("foo".to_string(), "Bar".to_string());
        config.key_aliases.insert("bar".to_string(), "Baz".to_string());
        config.key_aliases.insert("jump".to_string(), "f5".to_string());
        config.key_aliases.insert("grab".to_string(), "ctrl".to_string());

        let normalizer = KeyNormalizer::from_config(&config);
        for raw in ["foo", "bar", "Baz", "jump", "F5", "grab"] {
            let once = normalizer.canonical_name(raw);
            assert_eq!(normalizer.canonical_name(&once), once, "{} is not stable", raw);
        }
        assert_eq!(normalizer.canonical_name("foo"), "Baz");
        assert_eq!(normalizer.canonical_name("jump"), "F5");
        assert_eq!(normalizer.canonical_name("f5"), "F5");
        assert_eq!(normalizer.canonical_name("grab"), "Control");
    }

    #[test]
    fn test_default_free_functions() {
        assert_eq!(normalize_key(&key("f1"), 0).unwrap(), "F1");
        assert_eq!(normalize_literal_key(&key("SPACE"), 0), Some(KeyToken::Literal(' ')));
    }
}
