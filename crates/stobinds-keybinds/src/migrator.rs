//! Profile schema migration
//!
//! Brings stored profiles up to the latest schema by walking the
//! [`MigrationRegistry`]. Migration never fails and never touches the
//! caller's profile: every call returns a fresh value whose version tag and
//! `lastModified` are re-stamped, even when no step ran.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::models::{Profile, ProfileCollection};
use crate::observer::{MigrationObserver, RemovalReason, TracingObserver};
use crate::registry::MigrationRegistry;
use crate::version::SemanticVersion;

static DEFAULT_MIGRATOR: Lazy<Migrator> = Lazy::new(Migrator::new);

/// Whether a profile is behind the latest built-in schema
pub fn needs_normalization(profile: &Profile) -> bool {
    DEFAULT_MIGRATOR.needs_normalization(profile)
}

/// Migrate a profile with the built-in steps, the system clock and tracing output
pub fn migrate(profile: &Profile) -> Profile {
    DEFAULT_MIGRATOR.migrate(profile)
}

/// A step that ran during a migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedStep {
    pub name: String,
    pub from: SemanticVersion,
    pub to: SemanticVersion,
}

/// Result of migrating one profile
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    /// The migrated, re-stamped profile
    pub profile: Profile,
    /// Version tag the input carried, if any
    pub original_version: Option<SemanticVersion>,
    /// Steps in the order they ran
    pub applied: Vec<AppliedStep>,
    /// Aliases dropped by the steps
    pub removed_aliases: Vec<String>,
}

impl MigrationOutcome {
    /// Whether at least one step ran
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Runs registered migration steps over profiles
#[derive(Clone)]
pub struct Migrator {
    registry: MigrationRegistry,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn MigrationObserver>,
}

impl Migrator {
    /// Create a migrator with the built-in steps, the system clock and tracing output
    pub fn new() -> Self {
        Self::from_config(&EngineConfig::default())
    }

    /// Create a migrator whose built-in steps are tuned by configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        Migrator {
            registry: MigrationRegistry::from_config(config),
            clock: Arc::new(SystemClock),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_registry(mut self, registry: MigrationRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_observer(mut self, observer: impl MigrationObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Share an observer the caller keeps a handle to
    pub fn with_shared_observer(mut self, observer: Arc<dyn MigrationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// The schema version profiles end up at
    pub fn latest_version(&self) -> SemanticVersion {
        self.registry.latest()
    }

    /// True when the profile has no version tag or one older than the latest schema
    pub fn needs_normalization(&self, profile: &Profile) -> bool {
        match &profile.migration_version {
            None => true,
            Some(version) => version < &self.registry.latest(),
        }
    }

    /// Migrate a profile to the latest schema
    pub fn migrate(&self, profile: &Profile) -> Profile {
        self.migrate_with_report(profile).profile
    }

    /// Migrate a profile and report which steps ran and what they removed
    pub fn migrate_with_report(&self, profile: &Profile) -> MigrationOutcome {
        let reporter = ReportingObserver {
            inner: self.observer.as_ref(),
            removed: Mutex::new(Vec::new()),
        };

        let earliest = self.registry.earliest();
        let mut current = profile.effective_version();
        if current < earliest {
            current = earliest;
        }

        let mut working = profile.clone();
        let mut applied = Vec::new();
        while let Some(step) = self.registry.step_for(&current) {
            self.observer
                .step_applied(&working.name, &step.name, &current, &step.to);
            working = step.apply(working, &reporter);
            applied.push(AppliedStep {
                name: step.name.clone(),
                from: current.clone(),
                to: step.to.clone(),
            });
            current = step.to.clone();
        }

        if applied.is_empty() {
            self.observer.up_to_date(&working.name, &current);
        }

        working.migration_version = Some(current);
        working.last_modified = Some(self.clock.now());

        MigrationOutcome {
            profile: working,
            original_version: profile.migration_version.clone(),
            applied,
            removed_aliases: reporter.into_removed(),
        }
    }

    /// Migrate every profile of a collection independently
    pub fn migrate_collection(&self, collection: &ProfileCollection) -> ProfileCollection {
        ProfileCollection {
            profiles: collection
                .profiles
                .iter()
                .map(|(id, profile)| (id.clone(), self.migrate(profile)))
                .collect(),
            current_profile: collection.current_profile.clone(),
            extra: collection.extra.clone(),
        }
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards notifications while remembering removed aliases
struct ReportingObserver<'a> {
    inner: &'a dyn MigrationObserver,
    removed: Mutex<Vec<String>>,
}

impl ReportingObserver<'_> {
    fn into_removed(self) -> Vec<String> {
        match self.removed.into_inner() {
            Ok(removed) => removed,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl MigrationObserver for ReportingObserver<'_> {
    fn step_applied(&self, profile: &str, step: &str, from: &SemanticVersion, to: &SemanticVersion) {
        self.inner.step_applied(profile, step, from, to);
    }

    fn alias_removed(&self, profile: &str, alias: &str, reason: RemovalReason) {
        match self.removed.lock() {
            Ok(mut removed) => removed.push(alias.to_string()),
            Err(poisoned) => poisoned.into_inner().push(alias.to_string()),
        }
        self.inner.alias_removed(profile, alias, reason);
    }

    fn up_to_date(&self, profile: &str, version: &SemanticVersion) {
        self.inner.up_to_date(profile, version);
    }
}
