//! Migration step registry
//!
//! An ordered table of `from -> to` profile transforms. The migrator walks it
//! from the profile's version until no step applies.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::RegistryError;
use crate::models::{AliasCommands, AliasKind, Profile};
use crate::observer::{MigrationObserver, RemovalReason};
use crate::version::SemanticVersion;

/// Name of the built-in `2.0.0 -> 2.1.0` step
pub const VFX_ALIAS_PURGE: &str = "vfx-alias-purge";

/// A transform from one schema version to the next
pub type StepTransform = Arc<dyn Fn(Profile, &dyn MigrationObserver) -> Profile + Send + Sync>;

/// One registered migration step
#[derive(Clone)]
pub struct MigrationStep {
    pub from: SemanticVersion,
    pub to: SemanticVersion,
    pub name: String,
    transform: StepTransform,
}

impl MigrationStep {
    /// Create a new step
    pub fn new<F>(from: SemanticVersion, to: SemanticVersion, name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(Profile, &dyn MigrationObserver) -> Profile + Send + Sync + 'static,
    {
        MigrationStep {
            from,
            to,
            name: name.into(),
            transform: Arc::new(transform),
        }
    }

    /// Run the transform
    pub fn apply(&self, profile: Profile, observer: &dyn MigrationObserver) -> Profile {
        (self.transform)(profile, observer)
    }

    /// Whether this step should run for a profile at `version`
    pub fn covers(&self, version: &SemanticVersion) -> bool {
        &self.from <= version && version < &self.to
    }
}

impl fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationStep")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered set of migration steps, at most one per starting version
#[derive(Debug, Clone)]
pub struct MigrationRegistry {
    steps: Vec<MigrationStep>,
}

impl MigrationRegistry {
    /// Create a registry holding the built-in steps
    pub fn new() -> Self {
        Self::from_config(&EngineConfig::default())
    }

    /// Create a registry with no steps
    pub fn empty() -> Self {
        MigrationRegistry { steps: Vec::new() }
    }

    /// Create a registry holding the built-in steps, tuned by configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        MigrationRegistry {
            steps: vec![vfx_alias_purge(config.deprecated_alias_prefixes.clone())],
        }
    }

    /// Register a step, keeping the table ordered by starting version
    pub fn register(&mut self, step: MigrationStep) -> Result<(), RegistryError> {
        if step.to <= step.from {
            return Err(RegistryError::NonAdvancingStep {
                from: step.from,
                to: step.to,
            });
        }
        if self.steps.iter().any(|existing| existing.from == step.from) {
            return Err(RegistryError::DuplicateStep { from: step.from });
        }

        let idx = self.steps.partition_point(|existing| existing.from < step.from);
        self.steps.insert(idx, step);
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_step(mut self, step: MigrationStep) -> Result<Self, RegistryError> {
        self.register(step)?;
        Ok(self)
    }

    /// Find the step to run for a profile at `version`
    ///
    /// A step registered for exactly `version` wins; otherwise the first step
    /// whose `[from, to)` range contains it.
    pub fn step_for(&self, version: &SemanticVersion) -> Option<&MigrationStep> {
        self.steps
            .iter()
            .find(|step| &step.from == version)
            .or_else(|| self.steps.iter().find(|step| step.covers(version)))
    }

    /// The newest version any step migrates to
    pub fn latest(&self) -> SemanticVersion {
        self.steps
            .iter()
            .map(|step| step.to.clone())
            .max()
            .unwrap_or(SemanticVersion::EARLIEST_KNOWN)
    }

    /// The oldest version any step migrates from
    pub fn earliest(&self) -> SemanticVersion {
        self.steps
            .iter()
            .map(|step| step.from.clone())
            .min()
            .unwrap_or(SemanticVersion::EARLIEST_KNOWN)
    }

    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The `2.0.0 -> 2.1.0` step
///
/// Drops every alias of kind `vfx-alias` and every alias whose name starts
/// with one of `prefixes`. Surviving aliases keep their content; legacy string
/// commands are split into chains in the same pass.
///
/// Steps are selected by version only, so this runs for profiles below 2.1.0
/// and nowhere else. A document already tagged 2.1.0 or later that still holds
/// `vfx-alias` entries keeps them: migrating a current profile only refreshes
/// its stamps, and that takes precedence over "no deprecated alias at 2.1.0".
pub fn vfx_alias_purge(prefixes: Vec<String>) -> MigrationStep {
    MigrationStep::new(
        SemanticVersion::new(2, 0, 0),
        SemanticVersion::new(2, 1, 0),
        VFX_ALIAS_PURGE,
        move |mut profile: Profile, observer: &dyn MigrationObserver| {
            let Some(aliases) = profile.aliases.take() else {
                return profile;
            };

            let mut kept = BTreeMap::new();
            for (name, mut alias) in aliases {
                let removal = match alias.kind {
                    AliasKind::DeprecatedVfxAlias => Some(RemovalReason::DeprecatedKind),
                    AliasKind::Alias if has_prefix(&name, &prefixes) => {
                        Some(RemovalReason::DeprecatedName)
                    }
                    AliasKind::Alias => None,
                };

                if let Some(reason) = removal {
                    observer.alias_removed(&profile.name, &name, reason);
                    continue;
                }

                if alias.commands.is_legacy() {
                    alias.commands = AliasCommands::Chain(alias.commands.into_chain());
                }
                kept.insert(name, alias);
            }

            profile.aliases = Some(kept);
            profile
        },
    )
}

fn has_prefix(name: &str, prefixes: &[String]) -> bool {
    prefixes
        .iter()
        .any(|prefix| !prefix.is_empty() && name.starts_with(prefix.as_str()))
}
