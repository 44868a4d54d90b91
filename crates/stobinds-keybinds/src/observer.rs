//! Migration notifications
//!
//! The migrator reports what it does through a [`MigrationObserver`] instead
//! of logging directly. [`TracingObserver`] is the default sink.

use std::sync::Mutex;

use crate::version::SemanticVersion;

/// Why an alias was dropped during migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Declared with the `vfx-alias` kind
    DeprecatedKind,
    /// Named with a deprecated prefix, whatever its kind
    DeprecatedName,
}

/// Something the migrator did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationEvent {
    StepApplied {
        profile: String,
        step: String,
        from: SemanticVersion,
        to: SemanticVersion,
    },
    AliasRemoved {
        profile: String,
        alias: String,
        reason: RemovalReason,
    },
    UpToDate {
        profile: String,
        version: SemanticVersion,
    },
}

/// Receives migration notifications
///
/// All methods default to doing nothing. Notifications never influence the
/// migration result.
pub trait MigrationObserver: Send + Sync {
    fn step_applied(
        &self,
        _profile: &str,
        _step: &str,
        _from: &SemanticVersion,
        _to: &SemanticVersion,
    ) {
    }

    fn alias_removed(&self, _profile: &str, _alias: &str, _reason: RemovalReason) {}

    fn up_to_date(&self, _profile: &str, _version: &SemanticVersion) {}
}

/// Discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl MigrationObserver for NoopObserver {}

/// Emits notifications as `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl MigrationObserver for TracingObserver {
    fn step_applied(&self, profile: &str, step: &str, from: &SemanticVersion, to: &SemanticVersion) {
        tracing::info!(
            "Migrating profile '{}' from {} to {} ({})",
            profile, from, to, step
        );
    }

    fn alias_removed(&self, profile: &str, alias: &str, reason: RemovalReason) {
        match reason {
            RemovalReason::DeprecatedKind => tracing::info!(
                "Removed deprecated VFX alias '{}' from profile '{}'",
                alias, profile
            ),
            RemovalReason::DeprecatedName => tracing::info!(
                "Removed alias '{}' from profile '{}' (deprecated VFX naming)",
                alias, profile
            ),
        }
    }

    fn up_to_date(&self, profile: &str, version: &SemanticVersion) {
        tracing::debug!("Profile '{}' already at schema {}", profile, version);
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<MigrationEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<MigrationEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Names of removed aliases, in notification order
    pub fn removed_aliases(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                MigrationEvent::AliasRemoved { alias, .. } => Some(alias),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: MigrationEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl MigrationObserver for RecordingObserver {
    fn step_applied(&self, profile: &str, step: &str, from: &SemanticVersion, to: &SemanticVersion) {
        self.push(MigrationEvent::StepApplied {
            profile: profile.to_string(),
            step: step.to_string(),
            from: from.clone(),
            to: to.clone(),
        });
    }

    fn alias_removed(&self, profile: &str, alias: &str, reason: RemovalReason) {
        self.push(MigrationEvent::AliasRemoved {
            profile: profile.to_string(),
            alias: alias.to_string(),
            reason,
        });
    }

    fn up_to_date(&self, profile: &str, version: &SemanticVersion) {
        self.push(MigrationEvent::UpToDate {
            profile: profile.to_string(),
            version: version.clone(),
        });
    }
}
