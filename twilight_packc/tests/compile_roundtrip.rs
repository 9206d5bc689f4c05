use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use twilight_data::{
    CardRarity, CardType, CompletionCondition, ContentValidationError, EventKind, HeroClass, Influence, MiniGameKind,
    PackLoadError, PackType, RegionState, pack_file,
};
use twilight_engine::ContentRegistry;
use twilight_packc::{CompileError, PackCompiler};

fn write(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, text).expect("write");
}

/// Campaign pack whose village points at a forest it does not define.
fn act_one(root: &TempDir) -> PathBuf {
    let dir = root.path().join("act-one");
    write(
        &dir,
        "manifest.json",
        r#"{
            "id": "act-one",
            "name": {"en": "Act One", "ru": "Акт первый"},
            "version": "1.0",
            "type": "campaign",
            "core_version_min": "1.0.0",
            "dependencies": [{"pack_id": "wilds", "min_version": "1.0.0", "is_optional": true}],
            "entry_region": "village",
            "release_date": "2026-03-01",
            "regions_path": "regions.json",
            "anchors_path": "anchors.json",
            "events_path": "events",
            "quests_path": "quests.json"
        }"#,
    );
    write(
        &dir,
        "regions.json",
        r#"[{"id": "village", "title": "Village", "neighbors": ["forest"], "anchor_id": "chapel", "initial_state": "STABLE"}]"#,
    );
    write(
        &dir,
        "anchors.json",
        r#"[{"id": "chapel", "title": "Chapel", "region_id": "village", "type": "shrine", "influence": "light"}]"#,
    );
    write(
        &dir,
        "events/01_market.json",
        r#"[{
            "id": "market_day",
            "title": "Market Day",
            "availability": {"region_ids": ["village"], "conditions": ["WorldTension < 50"]},
            "choices": [{"id": "buy", "label": "Buy bread", "consequences": {"resource_changes": {"supplies": 2}}}]
        }]"#,
    );
    write(
        &dir,
        "events/02_raid.json",
        r#"[{
            "id": "raid",
            "title": "Raiders",
            "event_kind": {"mini_game": "combat"},
            "challenge": {"difficulty": 7},
            "choices": [{"id": "fight", "label": "Fight"}]
        }]"#,
    );
    write(
        &dir,
        "quests.json",
        r#"[{
            "id": "first-steps",
            "title": "First Steps",
            "type": "main",
            "auto_start": true,
            "objectives": [
                {"id": "visit", "completion_condition": {"visit_region": "village"}, "next_objective_id": "pray"},
                {"id": "pray", "completion_condition": {"type": "event_completed", "event_id": "market_day"}}
            ]
        }]"#,
    );
    dir
}

/// Region pack that supplies the forest.
fn wilds(root: &TempDir) -> PathBuf {
    let dir = root.path().join("wilds");
    write(
        &dir,
        "manifest.json",
        r#"{"id": "wilds", "name": "Wilds", "version": "1.0.0", "type": "full",
            "core_version_min": "1.0.0", "regions_path": "regions.json"}"#,
    );
    write(
        &dir,
        "regions.json",
        r#"[{"id": "forest", "title": "Forest", "region_type": "forest", "neighbor_ids": ["village"]}]"#,
    );
    dir
}

#[test]
fn compiled_pack_loads_into_the_registry() {
    let root = tempfile::tempdir().expect("tempdir");
    let source = act_one(&root);
    let out = root.path().join("packs/act-one.pack");

    let result = PackCompiler::new().compile(&source, &out).expect("compile");
    assert_eq!(result.counts.regions, 1);
    assert_eq!(result.counts.events, 2);
    assert_eq!(result.counts.quests, 1);
    assert_eq!(result.counts.anchors, 1);
    assert!(matches!(
        result.warnings.as_slice(),
        [ContentValidationError::BrokenReference { target, .. }] if target == "forest"
    ));
    assert!(pack_file::is_valid_pack_file(&out));

    let mut registry = ContentRegistry::new();
    registry.load_pack(&out).expect("load");

    let village = registry.region("village").expect("village");
    assert_eq!(village.neighbor_ids, vec!["forest".to_string()]);
    assert_eq!(village.initial_state, RegionState::Stable);
    assert_eq!(registry.anchor("chapel").map(|anchor| anchor.region_id.as_str()), Some("village"));

    let raid = registry.event("raid").expect("raid");
    assert_eq!(raid.event_kind, EventKind::MiniGame(MiniGameKind::Combat));
    assert_eq!(raid.mini_game_challenge.as_ref().map(|challenge| challenge.difficulty), Some(7));
    assert_eq!(registry.event("market_day").map(|event| event.weight), Some(10));

    let quest = registry.quest("first-steps").expect("quest");
    assert_eq!(
        quest.objectives[1].completion_condition,
        CompletionCondition::EventCompleted {
            event_id: "market_day".into()
        }
    );
    assert_eq!(registry.pack("act-one").map(|pack| pack.manifest().name.resolve("ru")), Some("Акт первый"));
}

#[test]
fn second_pack_resolves_the_dangling_neighbor() {
    let root = tempfile::tempdir().expect("tempdir");
    let compiler = PackCompiler::new();
    let act_one_pack = root.path().join("act-one.pack");
    let wilds_pack = root.path().join("wilds.pack");
    compiler.compile(&act_one(&root), &act_one_pack).expect("act one");
    compiler.compile(&wilds(&root), &wilds_pack).expect("wilds");

    let mut registry = ContentRegistry::new();
    registry.load_packs(&[&act_one_pack, &wilds_pack]).expect("load both");
    // full packs load before campaigns
    assert_eq!(registry.load_order(), ["wilds".to_string(), "act-one".to_string()]);
    assert!(
        registry
            .validate_all_content()
            .iter()
            .all(|entry| !matches!(entry, ContentValidationError::BrokenReference { .. }))
    );
}

#[test]
fn unknown_expression_variable_fails_the_compile() {
    let root = tempfile::tempdir().expect("tempdir");
    let source = act_one(&root);
    write(
        &source,
        "events/03_typo.json",
        r#"[{"id": "typo", "title": "Typo", "availability": {"condition": "WorldTenshun > 5"},
             "choices": [{"id": "ok", "label": "OK"}]}]"#,
    );
    let out = root.path().join("act-one.pack");

    match PackCompiler::new().compile(&source, &out) {
        Err(CompileError::ValidationFailed(errors)) => {
            assert!(errors.iter().any(|entry| matches!(
                entry,
                ContentValidationError::InvalidExpression { id, .. } if id == "typo"
            )));
        },
        other => panic!("expected a validation failure, got {other:?}"),
    }
    assert!(!out.exists());
}

#[test]
fn duplicate_ids_across_files_are_rejected() {
    let root = tempfile::tempdir().expect("tempdir");
    let source = act_one(&root);
    write(
        &source,
        "events/03_again.json",
        r#"[{"id": "raid", "title": "Raiders again", "choices": [{"id": "run", "label": "Run"}]}]"#,
    );
    assert!(matches!(
        PackCompiler::new().validate(&source),
        Err(CompileError::DuplicateId { kind: "event", .. })
    ));
}

#[test]
fn missing_content_file_is_reported() {
    let root = tempfile::tempdir().expect("tempdir");
    let source = act_one(&root);
    fs::remove_file(source.join("quests.json")).expect("remove");
    assert!(matches!(
        PackCompiler::new().validate(&source),
        Err(CompileError::Load(PackLoadError::FileNotFound(_)))
    ));
}

#[test]
fn loosely_cased_enums_in_direct_content_still_compile() {
    let root = tempfile::tempdir().expect("tempdir");
    let dir = root.path().join("core-heroes");
    write(
        &dir,
        "manifest.json",
        r#"{"id": "core-heroes", "name": "Core Heroes", "version": "1.0.0", "type": "Character",
            "core_version_min": "1.0.0", "heroes_path": "heroes.json", "cards_path": "cards.json"}"#,
    );
    write(
        &dir,
        "heroes.json",
        r#"[{"id": "sir-aldo", "name": "Sir Aldo", "hero_class": "Paladin", "starting_deck_card_ids": ["ember"]}]"#,
    );
    write(
        &dir,
        "cards.json",
        r#"[{"id": "ember", "name": "Ember", "card_type": "SPELL", "rarity": "Mythic", "balance": "Light"}]"#,
    );
    let out = root.path().join("core-heroes.pack");
    PackCompiler::new().compile(&dir, &out).expect("compile");

    let mut registry = ContentRegistry::new();
    registry.load_pack(&out).expect("load");
    assert_eq!(
        registry.pack("core-heroes").map(|pack| pack.manifest().pack_type),
        Some(PackType::Character)
    );
    assert_eq!(registry.hero("sir-aldo").map(|hero| hero.hero_class), Some(HeroClass::Warrior));
    let ember = registry.card("ember").expect("ember");
    assert_eq!(ember.card_type, CardType::Spell);
    assert_eq!(ember.rarity, CardRarity::Common);
    assert_eq!(ember.balance, Influence::Light);
}
