//! Engine configuration
//!
//! Every field has a default, so an empty document (`{}` or an empty YAML
//! file) yields the built-in behavior.
//!
//! ```yaml
//! deprecated_alias_prefixes:
//!   - dynFxSetFXExlusionList_
//! key_aliases:
//!   lmb: Lbutton
//! literal_symbols:
//!   Comma: ","
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name prefix of the VFX exclusion aliases dropped by the 2.1.0 schema
pub const DEFAULT_VFX_ALIAS_PREFIX: &str = "dynFxSetFXExlusionList_";

/// Tunable tables for the normalizer and the migration registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Alias names starting with any of these are purged during migration
    pub deprecated_alias_prefixes: Vec<String>,
    /// Extra raw key spellings (matched case-insensitively) and their canonical names
    pub key_aliases: BTreeMap<String, String>,
    /// Extra canonical key names that stand for a single literal character
    pub literal_symbols: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            deprecated_alias_prefixes: vec![DEFAULT_VFX_ALIAS_PREFIX.to_string()],
            key_aliases: BTreeMap::new(),
            literal_symbols: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON text
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(content)
            .map_err(|e| ConfigError::InvalidJson(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(EngineConfig::default());
        }
        let config: EngineConfig = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::InvalidYaml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every literal symbol maps to exactly one character
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in &self.literal_symbols {
            if value.chars().count() != 1 {
                return Err(ConfigError::InvalidLiteralSymbol {
                    name: name.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Literal symbols as characters, skipping invalid entries
    pub(crate) fn literal_chars(&self) -> impl Iterator<Item = (&str, char)> + '_ {
        self.literal_symbols.iter().filter_map(|(name, value)| {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some((name.as_str(), c)),
                _ => None,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.deprecated_alias_prefixes, vec![DEFAULT_VFX_ALIAS_PREFIX]);
        assert!(config.key_aliases.is_empty());
        assert!(config.literal_symbols.is_empty());
    }

    #[test]
    fn test_empty_documents_use_defaults() {
        assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
        assert_eq!(EngineConfig::from_yaml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "deprecated_alias_prefixes": ["old_", "vfx_"],
            "key_aliases": { "lmb": "Lbutton" },
            "literal_symbols": { "Comma": "," }
        }"#;

        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.deprecated_alias_prefixes, vec!["old_", "vfx_"]);
        assert_eq!(config.key_aliases.get("lmb").map(String::as_str), Some("Lbutton"));
        assert_eq!(config.literal_chars().collect::<Vec<_>>(), vec![("Comma", ',')]);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = "key_aliases:\n  lmb: Lbutton\n";
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.key_aliases.len(), 1);
        assert_eq!(config.deprecated_alias_prefixes, vec![DEFAULT_VFX_ALIAS_PREFIX]);
    }

    #[test]
    fn test_invalid_literal_symbol() {
        let json = r#"{ "literal_symbols": { "Comma": ",," } }"#;
        assert!(matches!(
            EngineConfig::from_json_str(json),
            Err(ConfigError::InvalidLiteralSymbol { .. })
        ));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            EngineConfig::from_json_str("not json"),
            Err(ConfigError::InvalidJson(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("key_aliases: [unclosed"),
            Err(ConfigError::InvalidYaml(_))
        ));
    }
}
