use std::fs;
use std::path::PathBuf;

use semver::Version;
use tempfile::TempDir;
use twilight_data::pack_file;
use twilight_data::*;
use twilight_engine::{ContentAccessError, ContentProvider, ContentRegistry};

fn manifest(id: &str, pack_type: PackType) -> PackManifest {
    let mut manifest = PackManifest::new(id, id, Version::new(1, 0, 0));
    manifest.pack_type = pack_type;
    manifest
}

fn region(id: &str, title: &str) -> RegionDefinition {
    RegionDefinition {
        id: id.to_string(),
        title: LocalizedString::new(title),
        ..RegionDefinition::default()
    }
}

fn pack_with_region(id: &str, region_id: &str, title: &str) -> PackContent {
    let mut content = PackContent::new(manifest(id, PackType::Campaign));
    content.regions.insert(region_id.to_string(), region(region_id, title));
    content
}

fn write_pack(dir: &TempDir, name: &str, content: &PackContent) -> PathBuf {
    let path = dir.path().join(format!("{name}.pack"));
    pack_file::compile(content, &path).expect("compile pack");
    path
}

fn title(registry: &ContentRegistry, region_id: &str) -> Option<String> {
    registry
        .region(region_id)
        .map(|region| region.title.resolve("en").to_string())
}

#[test]
fn later_pack_overrides_and_unload_restores() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = write_pack(&dir, "pack-a", &pack_with_region("pack-a", "r1", "From A"));
    let b = write_pack(&dir, "pack-b", &pack_with_region("pack-b", "r1", "From B"));

    let mut registry = ContentRegistry::new();
    registry.load_pack(&a).expect("load a");
    registry.load_pack(&b).expect("load b");
    assert_eq!(title(&registry, "r1").as_deref(), Some("From B"));

    let overrides: Vec<_> = registry
        .validate_all_content()
        .into_iter()
        .filter(|entry| matches!(entry, ContentValidationError::DuplicateId { .. }))
        .collect();
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0].severity(), Severity::Info);

    registry.unload_pack("pack-b").expect("unload b");
    assert_eq!(title(&registry, "r1").as_deref(), Some("From A"));
    assert_eq!(registry.loaded_pack_ids(), vec!["pack-a"]);
    assert!(registry.merged().overrides.is_empty());
}

#[test]
fn failed_reload_restores_previous_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = write_pack(&dir, "pack-a", &pack_with_region("pack-a", "r1", "From A"));
    let b = write_pack(&dir, "pack-b", &pack_with_region("pack-b", "r2", "From B"));
    let corrupt = dir.path().join("broken.pack");
    fs::write(&corrupt, b"XXXX\x02\x00\x00\x00\x00\x00garbage").expect("write corrupt");

    let mut registry = ContentRegistry::new();
    registry.load_pack(&a).expect("load a");
    registry.load_pack(&b).expect("load b");
    let before = registry.merged().clone();

    let err = registry.safe_reload_pack("pack-a", &corrupt).expect_err("bad magic");
    assert!(matches!(
        err,
        PackLoadError::Format {
            source: PackFileError::InvalidMagic(_),
            ..
        }
    ));
    assert_eq!(registry.loaded_pack_ids(), vec!["pack-a", "pack-b"]);
    assert_eq!(registry.merged(), &before);
    assert_eq!(title(&registry, "r1").as_deref(), Some("From A"));
}

#[test]
fn reload_with_another_pack_id_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = write_pack(&dir, "pack-a", &pack_with_region("pack-a", "r1", "From A"));
    let other = write_pack(&dir, "other", &pack_with_region("pack-z", "r1", "From Z"));

    let mut registry = ContentRegistry::new();
    registry.load_pack(&a).expect("load a");
    let err = registry.safe_reload_pack("pack-a", &other).expect_err("different id");
    assert!(matches!(err, PackLoadError::InvalidManifest { .. }));
    assert_eq!(registry.loaded_pack_ids(), vec!["pack-a"]);
    assert_eq!(title(&registry, "r1").as_deref(), Some("From A"));
}

#[test]
fn successful_reload_keeps_load_position() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = write_pack(&dir, "pack-a", &pack_with_region("pack-a", "r1", "From A"));
    let b = write_pack(&dir, "pack-b", &pack_with_region("pack-b", "r1", "From B"));

    let mut registry = ContentRegistry::new();
    registry.load_pack(&a).expect("load a");
    registry.load_pack(&b).expect("load b");

    let mut updated = pack_with_region("pack-a", "r1", "From A, patched");
    updated.manifest.version = Version::new(1, 1, 0);
    updated.regions.insert("r9".into(), region("r9", "New in A"));
    let a2 = write_pack(&dir, "pack-a-v2", &updated);

    let reloaded = registry.safe_reload_pack("pack-a", &a2).expect("reload");
    assert_eq!(reloaded.manifest().version, Version::new(1, 1, 0));
    assert_eq!(registry.loaded_pack_ids(), vec!["pack-a", "pack-b"]);
    // pack-b still wins r1 because pack-a kept its earlier position.
    assert_eq!(title(&registry, "r1").as_deref(), Some("From B"));
    assert_eq!(title(&registry, "r9").as_deref(), Some("New in A"));
}

#[test]
fn missing_required_dependency_leaves_registry_untouched() {
    let mut registry = ContentRegistry::new();
    registry
        .load_mock_pack(pack_with_region("base-pack", "village", "Village"))
        .expect("base");
    let before = registry.merged().clone();

    let mut dependent = pack_with_region("act-one", "forest", "Forest");
    dependent
        .manifest
        .dependencies
        .push(PackDependency::new("core-heroes", Version::new(2, 0, 0)));

    let err = registry.load_mock_pack(dependent).expect_err("missing dependency");
    assert!(matches!(
        err,
        PackLoadError::MissingDependency { ref dependency, .. } if dependency == "core-heroes"
    ));
    assert_eq!(registry.merged(), &before);
    assert_eq!(registry.loaded_pack_ids(), vec!["base-pack"]);
    assert!(registry.region("forest").is_none());
}

#[test]
fn dependency_versions_are_checked() {
    let mut registry = ContentRegistry::new();
    registry
        .load_mock_pack(PackContent::new(manifest("core-heroes", PackType::Character)))
        .expect("heroes v1");

    let mut strict = PackContent::new(manifest("act-one", PackType::Campaign));
    strict
        .manifest
        .dependencies
        .push(PackDependency::new("core-heroes", Version::new(2, 0, 0)));
    let err = registry.load_mock_pack(strict).expect_err("version mismatch");
    assert!(matches!(err, PackLoadError::DependencyVersionMismatch { .. }));

    let mut relaxed = PackContent::new(manifest("act-two", PackType::Campaign));
    let mut optional = PackDependency::new("core-heroes", Version::new(2, 0, 0));
    optional.is_optional = true;
    relaxed.manifest.dependencies.push(optional);
    let mut absent = PackDependency::new("bonus-pack", Version::new(1, 0, 0));
    absent.is_optional = true;
    relaxed.manifest.dependencies.push(absent);
    registry.load_mock_pack(relaxed).expect("optional dependencies never block");
}

#[test]
fn duplicate_and_incompatible_packs_are_rejected() {
    let mut registry = ContentRegistry::with_core_version(Version::new(1, 5, 0));
    registry
        .load_mock_pack(PackContent::new(manifest("base-pack", PackType::Full)))
        .expect("base");
    assert!(matches!(
        registry.load_mock_pack(PackContent::new(manifest("base-pack", PackType::Full))),
        Err(PackLoadError::PackAlreadyLoaded(_))
    ));

    let mut future = PackContent::new(manifest("future-pack", PackType::Full));
    future.manifest.core_version_min = Version::new(2, 0, 0);
    assert!(matches!(
        registry.load_mock_pack(future),
        Err(PackLoadError::IncompatibleCoreVersion { .. })
    ));

    let bad_id = PackContent::new(manifest("Bad Id", PackType::Full));
    assert!(matches!(
        registry.load_mock_pack(bad_id),
        Err(PackLoadError::InvalidManifest { .. })
    ));
    assert_eq!(registry.loaded_pack_ids(), vec!["base-pack"]);
}

#[test]
fn batch_loads_providers_first_and_roll_back_as_a_unit() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut story = pack_with_region("act-one", "village", "Village");
    story
        .manifest
        .dependencies
        .push(PackDependency::new("core-heroes", Version::new(1, 0, 0)));
    let heroes = PackContent::new(manifest("core-heroes", PackType::Character));
    let story_path = write_pack(&dir, "act-one", &story);
    let heroes_path = write_pack(&dir, "core-heroes", &heroes);

    let mut registry = ContentRegistry::new();
    let loaded: Vec<String> = registry
        .load_packs(&[&story_path, &heroes_path])
        .expect("batch")
        .into_iter()
        .map(|pack| pack.id().to_string())
        .collect();
    assert_eq!(loaded, vec!["core-heroes", "act-one"]);

    let mut fresh = ContentRegistry::new();
    fresh
        .load_mock_pack(PackContent::new(manifest("act-one", PackType::Campaign)))
        .expect("pre-existing");
    let err = fresh
        .load_packs(&[&story_path, &heroes_path])
        .expect_err("act-one already loaded");
    assert!(matches!(err, PackLoadError::PackAlreadyLoaded(_)));
    assert_eq!(fresh.loaded_pack_ids(), vec!["act-one"]);
    assert!(fresh.region("village").is_none());
}

#[test]
fn corrupted_payload_reports_checksum_mismatch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_pack(&dir, "pack-a", &pack_with_region("pack-a", "r1", "From A"));
    let mut bytes = fs::read(&path).expect("read");
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    fs::write(&path, &bytes).expect("write");

    let mut registry = ContentRegistry::new();
    let err = registry.load_pack(&path).expect_err("checksum");
    assert!(matches!(err, PackLoadError::ChecksumMismatch { .. }));
    assert!(registry.loaded_pack_ids().is_empty());
}

fn gameplay_pack() -> PackContent {
    let mut content = PackContent::new(manifest("act-one", PackType::Full));
    content.regions.insert("village".into(), region("village", "Village"));
    content.regions.insert("forest".into(), region("forest", "Forest"));

    let mut storm = EventDefinition {
        id: "storm".into(),
        title: LocalizedString::new("Storm"),
        choices: vec![ChoiceDefinition {
            id: "shelter".into(),
            label: LocalizedString::new("Shelter"),
            ..ChoiceDefinition::default()
        }],
        ..EventDefinition::default()
    };
    storm.availability.region_ids = Some(vec!["forest".into()]);
    storm.availability.min_pressure = Some(30);
    content.events.insert("storm".into(), storm);

    content.cards.insert(
        "strike".into(),
        CardDefinition {
            id: "strike".into(),
            name: LocalizedString::new("Strike"),
            ..CardDefinition::default()
        },
    );
    content.heroes.insert(
        "knight".into(),
        HeroDefinition {
            id: "knight".into(),
            name: LocalizedString::new("Knight"),
            starting_deck_card_ids: vec!["strike".into(), "strike".into(), "lost-card".into()],
            ..HeroDefinition::default()
        },
    );
    content.balance_config = Some(BalanceConfiguration::default());
    content
}

#[test]
fn queries_over_merged_content() {
    let mut registry = ContentRegistry::new();
    registry.load_mock_pack(gameplay_pack()).expect("load");

    assert_eq!(registry.available_events("forest", 40, RegionState::Stable).len(), 1);
    assert!(registry.available_events("forest", 10, RegionState::Stable).is_empty());
    assert!(registry.available_events("village", 40, RegionState::Stable).is_empty());

    assert_eq!(registry.starting_deck("knight").len(), 2);
    assert!(registry.starting_deck("nobody").is_empty());
    assert!(registry.balance_config().is_some());

    let regions: Vec<&str> = registry.all_regions().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(regions, vec!["forest", "village"]);
    assert_eq!(registry.event_definitions_for_region("forest").len(), 1);

    assert!(matches!(
        registry.require_region("swamp"),
        Err(ContentAccessError::NotFound { kind: "region", .. })
    ));
    match registry.require_starting_deck("knight") {
        Err(ContentAccessError::IncompleteContent { kind, id, missing }) => {
            assert_eq!((kind, id.as_str()), ("hero", "knight"));
            assert_eq!(missing, vec!["lost-card".to_string()]);
        },
        other => panic!("expected an incomplete deck, got {other:?}"),
    }
    assert!(matches!(
        registry.require_heroes(2),
        Err(ContentAccessError::InsufficientContent {
            required: 2,
            available: 1,
            ..
        })
    ));
    assert!(registry.check_playable().is_ok());

    match registry.validated() {
        Err(ContentAccessError::ValidationFailed(errors)) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].definition_id(), "knight");
        },
        other => panic!("expected a validation failure, got {other:?}"),
    }
}

#[test]
fn empty_registry_is_not_playable() {
    let registry = ContentRegistry::new();
    assert!(matches!(
        registry.check_playable(),
        Err(ContentAccessError::NoPlayableContent(_))
    ));
    assert!(registry.region("anything").is_none());
    assert!(registry.all_events().is_empty());
}
