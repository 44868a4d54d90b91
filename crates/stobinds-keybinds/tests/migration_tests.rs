use std::sync::Arc;

use chrono::{TimeZone, Utc};
use stobinds_keybinds::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap()
    }

    fn migrator() -> Migrator {
        Migrator::new().with_clock(FixedClock::new(stamped()))
    }

    #[test]
    fn test_vfx_alias_removed_scenario() {
        let json = r#"{
            "migrationVersion": "2.0.0",
            "aliases": {
                "a": { "commands": ["X"], "type": "alias" },
                "v": { "commands": ["Y"], "type": "vfx-alias" }
            }
        }"#;
        let profile = parse_profile(json, DocumentFormat::Json).unwrap();

        let migrated = migrator().migrate(&profile);
        assert_eq!(migrated.migration_version, Some(SemanticVersion::new(2, 1, 0)));
        assert_eq!(migrated.last_modified, Some(stamped()));

        let aliases = migrated.aliases.as_ref().unwrap();
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases["a"].kind, AliasKind::Alias);
        assert_eq!(
            aliases["a"].commands,
            AliasCommands::Chain(CommandChain::from_commands(["X"]))
        );
    }

    #[test]
    fn test_prefixed_alias_removed_regardless_of_kind() {
        let profile = Profile::new("p")
            .with_alias(Alias::new(
                "dynFxSetFXExlusionList_Ground",
                CommandChain::from_commands(["dynFxSetFXExlusionList Fx_A"]),
            ))
            .with_alias(Alias::new("dynFxOther", CommandChain::from_commands(["keep"])));

        let outcome = migrator().migrate_with_report(&profile);
        assert_eq!(outcome.removed_aliases, vec!["dynFxSetFXExlusionList_Ground"]);
        assert!(outcome.profile.alias("dynFxOther").is_some());
    }

    #[test]
    fn test_legacy_string_commands_become_chains() {
        let json = r#"{
            "name": "Legacy",
            "aliases": { "Heal": { "commands": " Heal1 $$ $$ Heal2 " } }
        }"#;
        let profile = parse_profile(json, DocumentFormat::Json).unwrap();
        assert!(profile.alias("Heal").unwrap().commands.is_legacy());

        let migrated = migrator().migrate(&profile);
        assert_eq!(
            migrated.alias("Heal").unwrap().commands,
            AliasCommands::Chain(CommandChain::from_commands(["Heal1", "Heal2"]))
        );
    }

    #[test]
    fn test_missing_aliases_still_stamped() {
        let profile = parse_profile(r#"{"name": "NoAliases"}"#, DocumentFormat::Json).unwrap();
        let migrated = migrator().migrate(&profile);
        assert!(migrated.aliases.is_none());
        assert_eq!(migrated.migration_version, Some(SemanticVersion::new(2, 1, 0)));
        assert_eq!(migrated.last_modified, Some(stamped()));
    }

    #[test]
    fn test_garbage_version_treated_as_earliest() {
        let json = r#"{
            "migrationVersion": "banana",
            "aliases": { "v": { "commands": ["Y"], "type": "vfx-alias" } }
        }"#;
        let profile = parse_profile(json, DocumentFormat::Json).unwrap();
        assert!(needs_normalization(&profile));

        let migrated = migrator().migrate(&profile);
        assert!(migrated.alias("v").is_none());
        assert!(!migrator().needs_normalization(&migrated));
    }

    #[test]
    fn test_latest_profile_changes_only_timestamp() {
        let json = r#"{
            "name": "Current",
            "migrationVersion": "2.1.0",
            "builds": { "space": { "F1": ["FireAll"] }, "ground": { "F1": ["Crouch"] } },
            "aliases": { "a": { "commands": ["X", "Y"], "type": "alias" } },
            "lastModified": 1600000000000
        }"#;
        let profile = parse_profile(json, DocumentFormat::Json).unwrap();

        let migrated = migrator().migrate(&profile);
        assert_eq!(migrated.builds, profile.builds);
        assert_eq!(migrated.aliases, profile.aliases);
        assert_eq!(migrated.migration_version, profile.migration_version);
        assert_ne!(migrated.last_modified, profile.last_modified);
    }

    #[test]
    fn test_migration_notifications() {
        let observer = Arc::new(RecordingObserver::new());
        let migrator = migrator().with_shared_observer(observer.clone());
        let profile = Profile::new("Tac")
            .with_alias(Alias::new_vfx("v", CommandChain::from_commands(["Y"])))
            .with_alias(Alias::new("x", CommandChain::from_commands(["X"])));

        migrator.migrate(&profile);

        let events = observer.events();
        assert_eq!(
            events[0],
            MigrationEvent::StepApplied {
                profile: "Tac".to_string(),
                step: VFX_ALIAS_PURGE.to_string(),
                from: SemanticVersion::new(2, 0, 0),
                to: SemanticVersion::new(2, 1, 0),
            }
        );
        assert_eq!(
            events[1],
            MigrationEvent::AliasRemoved {
                profile: "Tac".to_string(),
                alias: "v".to_string(),
                reason: RemovalReason::DeprecatedKind,
            }
        );
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_configured_prefixes() {
        let config = EngineConfig::from_json_str(r#"{"deprecated_alias_prefixes": ["old_"]}"#).unwrap();
        let migrator = Migrator::from_config(&config).with_observer(NoopObserver);
        let profile = Profile::new("p")
            .with_alias(Alias::new("old_thing", CommandChain::from_commands(["a"])))
            .with_alias(Alias::new("dynFxSetFXExlusionList_Space", CommandChain::from_commands(["b"])));

        let migrated = migrator.migrate(&profile);
        assert!(migrated.alias("old_thing").is_none());
        assert!(migrated.alias("dynFxSetFXExlusionList_Space").is_some());
    }

    #[test]
    fn test_custom_registry_step() {
        let registry = MigrationRegistry::new()
            .with_step(MigrationStep::new(
                SemanticVersion::new(2, 1, 0),
                SemanticVersion::new(2, 2, 0),
                "ground-build",
                |mut profile: Profile, _: &dyn MigrationObserver| {
                    profile.builds.entry("ground".to_string()).or_default();
                    profile
                },
            ))
            .unwrap();
        let migrator = migrator().with_registry(registry);

        assert!(migrator.needs_normalization(
            &Profile::new("p").with_version(SemanticVersion::new(2, 1, 0))
        ));
        let migrated = migrator.migrate(&Profile::new("p"));
        assert_eq!(migrator.latest_version(), SemanticVersion::new(2, 2, 0));
        assert_eq!(migrated.migration_version, Some(SemanticVersion::new(2, 2, 0)));
        assert!(migrated.builds.contains_key("ground"));
    }

    #[test]
    fn test_collection_profiles_do_not_share_state() {
        let json = r#"{
            "currentProfile": "a",
            "profiles": {
                "a": { "name": "A", "aliases": { "v": { "commands": ["Y"], "type": "vfx-alias" } } },
                "b": { "name": "B", "migrationVersion": "2.1.0",
                       "aliases": { "v": { "commands": ["Y"], "type": "vfx-alias" } } }
            }
        }"#;
        let collection = parse_collection(json, DocumentFormat::Json).unwrap();
        let migrated = migrator().migrate_collection(&collection);

        assert!(migrated.profiles["a"].alias("v").is_none());
        // already current: the step does not run again
        assert!(migrated.profiles["b"].alias("v").is_some());
        assert!(collection.profiles["a"].alias("v").is_some());
    }

    #[test]
    fn test_malformed_profile_does_not_reject_collection() {
        let json = r#"{
            "currentProfile": "good",
            "profiles": {
                "good": {
                    "name": "Good",
                    "aliases": { "a": { "commands": ["X"], "type": "alias" } }
                },
                "bad": {
                    "name": "Bad",
                    "builds": { "space": { "F1": ["a", 1] } },
                    "aliases": {
                        "nulls": { "commands": ["X", null] },
                        "untyped": { "commands": ["Y"], "type": null },
                        "number": { "commands": 42 },
                        "v": { "commands": ["Z"], "type": "vfx-alias" }
                    }
                },
                "gone": null
            }
        }"#;

        let collection = parse_collection(json, DocumentFormat::Json).unwrap();
        assert_eq!(collection.profiles.len(), 2);
        assert!(!collection.profiles.contains_key("gone"));

        let migrated = migrator().migrate_collection(&collection);
        let good = &migrated.profiles["good"];
        assert_eq!(good.alias("a").unwrap().commands.to_chain().commands(), ["X"]);

        let bad = &migrated.profiles["bad"];
        assert_eq!(bad.binding("space", "F1").unwrap().commands(), ["a"]);
        assert_eq!(bad.alias("nulls").unwrap().commands.to_chain().commands(), ["X"]);
        assert_eq!(bad.alias("untyped").unwrap().kind, AliasKind::Alias);
        assert!(bad.alias("number").unwrap().commands.to_chain().is_empty());
        assert!(bad.alias("v").is_none());
        assert_eq!(bad.migration_version, Some(SemanticVersion::new(2, 1, 0)));
    }

    #[test]
    fn test_up_to_date_profile_keeps_vfx_alias() {
        let profile = Profile::new("Current")
            .with_version(SemanticVersion::new(2, 1, 0))
            .with_alias(Alias::new_vfx("v", CommandChain::from_commands(["Y"])));

        let outcome = migrator().migrate_with_report(&profile);
        assert!(!outcome.changed());
        assert!(outcome.removed_aliases.is_empty());
        assert_eq!(outcome.profile.alias("v").unwrap().kind, AliasKind::DeprecatedVfxAlias);
    }
}
