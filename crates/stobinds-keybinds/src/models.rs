//! Core data models for keybind records, aliases and profiles

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::chain;
use crate::version::SemanticVersion;

/// One tokenized line of keybind text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRecord {
    /// Text before the first colon, trimmed
    pub field_name: String,
    /// Whether the line contained a colon at all
    pub has_colon: bool,
    /// Text after the first colon, trimmed. Empty when there is no colon.
    pub value: String,
}

impl FieldRecord {
    /// Build a record directly, mostly useful in tests
    pub fn new(field_name: impl Into<String>, has_colon: bool, value: impl Into<String>) -> Self {
        FieldRecord {
            field_name: field_name.into(),
            has_colon,
            value: value.into(),
        }
    }

    /// Records without a colon or without a value never carry a key
    pub fn is_key_bearing(&self) -> bool {
        self.has_colon && !self.value.is_empty()
    }
}

/// Canonical key identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyToken {
    /// A named key such as `Control`, `F1` or `Space`
    Named(String),
    /// A key that stands for a literal character such as `' '` or `';'`
    Literal(char),
}

impl KeyToken {
    /// Named form of the token, if it is one
    pub fn name(&self) -> Option<&str> {
        match self {
            KeyToken::Named(name) => Some(name.as_str()),
            KeyToken::Literal(_) => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, KeyToken::Literal(_))
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Named(name) => write!(f, "{}", name),
            KeyToken::Literal(c) => write!(f, "{}", c),
        }
    }
}

impl PartialEq<str> for KeyToken {
    fn eq(&self, other: &str) -> bool {
        match self {
            KeyToken::Named(name) => name == other,
            KeyToken::Literal(c) => {
                let mut chars = other.chars();
                chars.next() == Some(*c) && chars.next().is_none()
            }
        }
    }
}

impl PartialEq<&str> for KeyToken {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// Ordered list of non-empty, trimmed commands
///
/// Every constructor routes through the splitter, so a chain can never hold an
/// empty or whitespace-only command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CommandChain(Vec<String>);

impl CommandChain {
    /// An empty chain (an unbound key)
    pub fn empty() -> Self {
        CommandChain(Vec::new())
    }

    /// Build a chain from individual commands, trimming and dropping empties
    pub fn from_commands<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        CommandChain(chain::clean_segments(commands))
    }

    pub fn commands(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Append another chain, keeping execution order
    pub fn extend(&mut self, other: CommandChain) {
        self.0.extend(other.0);
    }

    /// Encode the chain as `$$`-delimited text
    pub fn to_text(&self) -> String {
        self.0.join(&format!(" {} ", chain::COMMAND_DELIMITER))
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl FromStr for CommandChain {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(chain::split(s))
    }
}

impl<'a> IntoIterator for &'a CommandChain {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for CommandChain {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for CommandChain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CommandChain {
    /// Accepts an array of commands or a single `$$`-delimited string
    ///
    /// Non-string array elements are skipped and any other shape reads as an
    /// empty chain, so one bad binding never rejects the whole document.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(chain::split_value(&raw))
    }
}

/// Closed set of alias kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AliasKind {
    #[default]
    Alias,
    /// VFX exclusion aliases, removed by the 2.1.0 schema
    DeprecatedVfxAlias,
}

impl AliasKind {
    /// Wire tag used in persisted documents
    pub fn as_str(&self) -> &'static str {
        match self {
            AliasKind::Alias => "alias",
            AliasKind::DeprecatedVfxAlias => "vfx-alias",
        }
    }

    /// Map a wire tag to a kind; anything unrecognized is an ordinary alias
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "vfx-alias" | "vfx_alias" | "vfxalias" => AliasKind::DeprecatedVfxAlias,
            "alias" => AliasKind::Alias,
            other => {
                tracing::trace!("Unknown alias type {:?}, treating as alias", other);
                AliasKind::Alias
            }
        }
    }
}

impl fmt::Display for AliasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AliasKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AliasKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(tag) => Ok(AliasKind::from_tag(&tag)),
            other => {
                tracing::trace!("Alias type {} is not a tag, treating as alias", other);
                Ok(AliasKind::Alias)
            }
        }
    }
}

/// The commands of an alias as they were stored
///
/// Documents written before 2.1.0 may hold a raw `$$` string; migration turns
/// every such value into a [`CommandChain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AliasCommands {
    Legacy(String),
    Chain(CommandChain),
}

impl AliasCommands {
    /// The commands as a chain, splitting the legacy shape on the fly
    pub fn to_chain(&self) -> CommandChain {
        match self {
            AliasCommands::Legacy(raw) => chain::split(raw),
            AliasCommands::Chain(chain) => chain.clone(),
        }
    }

    /// Convert into the chain shape, consuming the value
    pub fn into_chain(self) -> CommandChain {
        match self {
            AliasCommands::Legacy(raw) => chain::split(&raw),
            AliasCommands::Chain(chain) => chain,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, AliasCommands::Legacy(_))
    }
}

impl<'de> Deserialize<'de> for AliasCommands {
    /// A string keeps the legacy shape; anything else is read as a chain
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(raw) => AliasCommands::Legacy(raw),
            other => AliasCommands::Chain(chain::split_value(&other)),
        })
    }
}

impl Default for AliasCommands {
    fn default() -> Self {
        AliasCommands::Chain(CommandChain::empty())
    }
}

impl From<CommandChain> for AliasCommands {
    fn from(chain: CommandChain) -> Self {
        AliasCommands::Chain(chain)
    }
}

/// A named, reusable command chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    /// Filled from the key of the `aliases` map
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub commands: AliasCommands,
    #[serde(rename = "type", default)]
    pub kind: AliasKind,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    /// Fields this model does not know about, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Alias {
    /// Create a new alias
    pub fn new(name: impl Into<String>, commands: CommandChain) -> Self {
        Alias {
            name: name.into(),
            commands: AliasCommands::Chain(commands),
            kind: AliasKind::Alias,
            description: None,
            extra: Map::new(),
        }
    }

    /// Create a deprecated VFX exclusion alias
    pub fn new_vfx(name: impl Into<String>, commands: CommandChain) -> Self {
        Alias {
            kind: AliasKind::DeprecatedVfxAlias,
            ..Alias::new(name, commands)
        }
    }

    /// Create an alias still holding the legacy string shape
    pub fn new_legacy(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Alias {
            commands: AliasCommands::Legacy(raw.into()),
            ..Alias::new(name, CommandChain::empty())
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Build mode (`space`, `ground`) -> key name -> command chain
pub type Builds = BTreeMap<String, BTreeMap<String, CommandChain>>;

/// A user keybind profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    /// `None` when the stored document had no usable version tag
    #[serde(
        default,
        deserialize_with = "lenient_version",
        skip_serializing_if = "Option::is_none"
    )]
    pub migration_version: Option<SemanticVersion>,
    #[serde(default, deserialize_with = "lenient_builds")]
    pub builds: Builds,
    /// `None` when the stored document had no `aliases` field at all
    #[serde(
        default,
        deserialize_with = "named_aliases",
        skip_serializing_if = "Option::is_none"
    )]
    pub aliases: Option<BTreeMap<String, Alias>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<DateTime<Utc>>,
    /// Fields this model does not know about, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// Create an empty profile with no version tag
    pub fn new(name: impl Into<String>) -> Self {
        Profile {
            name: name.into(),
            description: None,
            migration_version: None,
            builds: Builds::new(),
            aliases: None,
            last_modified: None,
            extra: Map::new(),
        }
    }

    /// The version migration starts from: absent means the earliest known schema
    pub fn effective_version(&self) -> SemanticVersion {
        self.migration_version
            .clone()
            .unwrap_or(SemanticVersion::EARLIEST_KNOWN)
    }

    pub fn with_version(mut self, version: SemanticVersion) -> Self {
        self.migration_version = Some(version);
        self
    }

    /// Add or replace an alias, keyed by its name
    pub fn insert_alias(&mut self, alias: Alias) {
        self.aliases
            .get_or_insert_with(BTreeMap::new)
            .insert(alias.name.clone(), alias);
    }

    pub fn with_alias(mut self, alias: Alias) -> Self {
        self.insert_alias(alias);
        self
    }

    pub fn alias(&self, name: &str) -> Option<&Alias> {
        self.aliases.as_ref().and_then(|aliases| aliases.get(name))
    }

    /// Bind a chain to a key in a build mode
    pub fn bind(&mut self, mode: impl Into<String>, key: impl Into<String>, commands: CommandChain) {
        self.builds
            .entry(mode.into())
            .or_default()
            .insert(key.into(), commands);
    }

    /// Look up the chain bound to a key in a build mode
    pub fn binding(&self, mode: &str, key: &str) -> Option<&CommandChain> {
        self.builds.get(mode).and_then(|keys| keys.get(key))
    }
}

/// A stored document holding several profiles
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCollection {
    /// Entries that are not profile objects are dropped
    #[serde(default, deserialize_with = "lenient_profiles")]
    pub profiles: BTreeMap<String, Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_profile: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn lenient_version<'de, D>(deserializer: D) -> Result<Option<SemanticVersion>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(tag)) => SemanticVersion::parse_lenient(&tag),
        Some(Value::Number(n)) => SemanticVersion::parse_lenient(&n.to_string()),
        _ => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        Some(Value::String(text)) => DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .ok(),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn lenient_builds<'de, D>(deserializer: D) -> Result<Builds, D::Error>
where
    D: Deserializer<'de>,
{
    let mut builds = Builds::new();
    let Some(Value::Object(modes)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(builds);
    };

    for (mode, keys) in modes {
        let Value::Object(keys) = keys else {
            tracing::warn!("Ignoring build mode '{}': expected a map of keys", mode);
            continue;
        };
        let bound = keys
            .iter()
            .map(|(key, commands)| (key.clone(), chain::split_value(commands)))
            .collect();
        builds.insert(mode, bound);
    }
    Ok(builds)
}

fn named_aliases<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, Alias>>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(entries)) => entries,
        Some(Value::Null) | None => return Ok(None),
        Some(other) => {
            tracing::warn!("Ignoring aliases field that is not a map: {}", other);
            return Ok(None);
        }
    };

    Ok(Some(
        entries
            .into_iter()
            .filter_map(|(name, value)| {
                alias_from_value(&name, value).map(|mut alias| {
                    alias.name = name.clone();
                    (name, alias)
                })
            })
            .collect(),
    ))
}

/// Objects are read field by field; a bare string or list is taken as the commands
fn alias_from_value(name: &str, value: Value) -> Option<Alias> {
    let value = match value {
        Value::Object(_) => value,
        Value::String(_) | Value::Array(_) => serde_json::json!({ "commands": value }),
        other => {
            tracing::warn!("Dropping alias '{}': {} is not an alias", name, other);
            return None;
        }
    };

    match serde_json::from_value(value) {
        Ok(alias) => Some(alias),
        Err(e) => {
            tracing::warn!("Dropping unreadable alias '{}': {}", name, e);
            None
        }
    }
}

fn lenient_profiles<'de, D>(deserializer: D) -> Result<BTreeMap<String, Profile>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::Object(entries)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };

    Ok(entries
        .into_iter()
        .filter_map(|(id, value)| {
            if !value.is_object() {
                tracing::warn!("Dropping profile '{}': expected an object", id);
                return None;
            }
            match serde_json::from_value(value) {
                Ok(profile) => Some((id, profile)),
                Err(e) => {
                    tracing::warn!("Dropping unreadable profile '{}': {}", id, e);
                    None
                }
            }
        })
        .collect())
}
