//! Three-component schema version tags
//!
//! Profile documents carry their schema version as a dotted string. The string
//! is parsed once at the boundary into a [`SemanticVersion`] and every
//! comparison after that is numeric, component by component.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::VersionError;

/// A `major.minor.patch` version, ordered numerically
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion(semver::Version);

impl SemanticVersion {
    /// The version assumed for documents that carry no usable version tag
    pub const EARLIEST_KNOWN: SemanticVersion = SemanticVersion::new(2, 0, 0);

    /// Create a version from its three components
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion(semver::Version::new(major, minor, patch))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Parse a version tag, returning `None` instead of an error
    pub fn parse_lenient(input: &str) -> Option<Self> {
        match input.parse() {
            Ok(version) => Some(version),
            Err(err) => {
                tracing::trace!("Ignoring unparseable version tag {:?}: {}", input, err);
                None
            }
        }
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0.major, self.0.minor, self.0.patch)
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionError;

    /// Accepts `2.1.0`, `v2.1.0`, and the short forms `2` and `2.1`.
    /// Pre-release and build suffixes are dropped; only the numeric triple is kept.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let core_len = trimmed
            .find(|c: char| c == '-' || c == '+')
            .unwrap_or(trimmed.len());
        let padded = match trimmed[..core_len].matches('.').count() {
            0 => format!("{}.0.0{}", &trimmed[..core_len], &trimmed[core_len..]),
            1 => format!("{}.0{}", &trimmed[..core_len], &trimmed[core_len..]),
            _ => trimmed.to_string(),
        };

        let parsed = semver::Version::parse(&padded).map_err(|e| VersionError::Invalid {
            input: s.to_string(),
            message: e.to_string(),
        })?;

        Ok(SemanticVersion::new(parsed.major, parsed.minor, parsed.patch))
    }
}

impl Serialize for SemanticVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemanticVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
