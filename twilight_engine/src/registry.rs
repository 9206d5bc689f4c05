//! The runtime content registry.
//!
//! Packs are loaded from compiled `.pack` files (or registered from memory), merged in load
//! order, and queried by the gameplay layer. Merged state is always the fold of `load_order`
//! through [`merge_content`], so unloading and failed reloads rebuild it from scratch.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use semver::Version;
use twilight_data::pack_file::{self, PACK_EXTENSION};
use twilight_data::*;

use crate::error::ContentAccessError;
use crate::merge::{MergedContent, merge_content};

#[derive(Debug, Clone)]
pub struct ContentRegistry {
    loaded_packs: HashMap<String, LoadedPack>,
    load_order: Vec<String>,
    merged: MergedContent,
    core_version: Version,
    expressions: ExpressionValidator,
}

impl Default for ContentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentRegistry {
    /// Empty registry checking compatibility against this build's core version.
    pub fn new() -> Self {
        Self::with_core_version(core_version())
    }

    /// Empty registry that reports `version` as the running core.
    pub fn with_core_version(version: Version) -> Self {
        Self {
            loaded_packs: HashMap::new(),
            load_order: Vec::new(),
            merged: MergedContent::default(),
            core_version: version,
            expressions: ExpressionValidator::default(),
        }
    }

    /// Replace the expression whitelist used by [`validate_all_content`](Self::validate_all_content).
    #[must_use]
    pub fn with_expression_validator(mut self, expressions: ExpressionValidator) -> Self {
        self.expressions = expressions;
        self
    }

    pub fn core_version(&self) -> &Version {
        &self.core_version
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Load one compiled pack.
    ///
    /// # Errors
    /// Any [`PackLoadError`]. On error the registry is unchanged.
    pub fn load_pack(&mut self, path: &Path) -> Result<&LoadedPack, PackLoadError> {
        let content = read_pack(path)?;
        let id = self.register(LoadedPack::new(content, Some(path.to_path_buf())))?;
        self.get_loaded(&id)
    }

    /// Load several packs as one batch.
    ///
    /// Packs are ordered by [`PackType::load_priority`] and then so that dependencies inside
    /// the batch load first. Either every pack loads or none does.
    ///
    /// # Errors
    /// The first [`PackLoadError`]; `CircularDependency` if the batch cannot be ordered.
    pub fn load_packs<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<Vec<&LoadedPack>, PackLoadError> {
        let mut batch = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            batch.push((read_pack(path)?, path.to_path_buf()));
        }
        let ordered = order_for_loading(batch)?;

        let order_before = self.load_order.clone();
        let mut loaded = Vec::with_capacity(ordered.len());
        for (content, path) in ordered {
            match self.register(LoadedPack::new(content, Some(path))) {
                Ok(id) => loaded.push(id),
                Err(err) => {
                    warn!(
                        "batch load failed after {} of {} packs, rolling back: {err}",
                        loaded.len(),
                        paths.len()
                    );
                    for id in &loaded {
                        self.loaded_packs.remove(id);
                    }
                    self.load_order = order_before;
                    self.rebuild();
                    return Err(err);
                },
            }
        }

        Ok(loaded.iter().filter_map(|id| self.loaded_packs.get(id)).collect())
    }

    /// Register content that never touched disk (tests, code-defined packs).
    ///
    /// # Errors
    /// As [`load_pack`](Self::load_pack) minus file errors.
    pub fn load_mock_pack(&mut self, content: PackContent) -> Result<&LoadedPack, PackLoadError> {
        let id = self.register(LoadedPack::new(content, None))?;
        self.get_loaded(&id)
    }

    /// Remove a pack and rebuild merged state from the remaining load order.
    ///
    /// # Errors
    /// `PackNotLoaded` if no pack has that id.
    pub fn unload_pack(&mut self, pack_id: &str) -> Result<LoadedPack, PackLoadError> {
        let pack = self
            .loaded_packs
            .remove(pack_id)
            .ok_or_else(|| PackLoadError::PackNotLoaded(pack_id.to_string()))?;
        self.load_order.retain(|id| id != pack_id);

        let dependents: Vec<&str> = self
            .loaded_packs
            .values()
            .filter(|other| other.manifest().dependencies.iter().any(|dep| dep.pack_id == pack_id))
            .map(LoadedPack::id)
            .collect();
        if !dependents.is_empty() {
            warn!("unloaded pack '{pack_id}' is still required by: {}", dependents.join(", "));
        }

        self.rebuild();
        info!("unloaded pack '{pack_id}'; {} pack(s) remain", self.load_order.len());
        Ok(pack)
    }

    /// Replace a loaded pack with the file at `path`, keeping its place in the load order.
    ///
    /// On any failure (unreadable file, different pack id, failed checks) the previous pack
    /// and load order are restored before the error is returned.
    ///
    /// # Errors
    /// `PackNotLoaded` if `pack_id` isn't loaded, else the replacement's load error.
    pub fn safe_reload_pack(&mut self, pack_id: &str, path: &Path) -> Result<&LoadedPack, PackLoadError> {
        let previous = self
            .loaded_packs
            .get(pack_id)
            .cloned()
            .ok_or_else(|| PackLoadError::PackNotLoaded(pack_id.to_string()))?;
        let order_before = self.load_order.clone();

        self.unload_pack(pack_id)?;
        match self.load_replacement(pack_id, path) {
            Ok(()) => {
                self.load_order = order_before;
                self.rebuild();
                info!("reloaded pack '{pack_id}' from {}", path.display());
                self.get_loaded(pack_id)
            },
            Err(err) => {
                warn!("reload of pack '{pack_id}' failed, restoring previous version: {err}");
                self.loaded_packs.insert(pack_id.to_string(), previous);
                self.load_order = order_before;
                self.rebuild();
                Err(err)
            },
        }
    }

    fn load_replacement(&mut self, pack_id: &str, path: &Path) -> Result<(), PackLoadError> {
        let content = read_pack(path)?;
        if content.id() != pack_id {
            return Err(PackLoadError::InvalidManifest {
                pack_id: pack_id.to_string(),
                reason: format!("replacement file declares pack '{}'", content.id()),
            });
        }
        self.register(LoadedPack::new(content, Some(path.to_path_buf())))?;
        Ok(())
    }

    /// Check a pack against current state, then append and merge it. Nothing changes on error.
    fn register(&mut self, pack: LoadedPack) -> Result<String, PackLoadError> {
        let manifest = pack.manifest();
        let pack_id = manifest.id.clone();

        if self.loaded_packs.contains_key(&pack_id) {
            return Err(PackLoadError::PackAlreadyLoaded(pack_id));
        }

        let issues = manifest.validate();
        if !issues.is_empty() {
            let reason = issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
            return Err(PackLoadError::InvalidManifest { pack_id, reason });
        }

        if !manifest.is_compatible_with(&self.core_version) {
            return Err(PackLoadError::IncompatibleCoreVersion {
                pack_id,
                required: manifest.core_requirement(),
                current: self.core_version.clone(),
            });
        }

        for dependency in &manifest.dependencies {
            match self.loaded_packs.get(&dependency.pack_id) {
                None if dependency.is_optional => {
                    debug!("optional dependency '{}' of '{pack_id}' is not loaded", dependency.pack_id);
                },
                None => {
                    return Err(PackLoadError::MissingDependency {
                        pack_id,
                        dependency: dependency.pack_id.clone(),
                    });
                },
                Some(found) if !dependency.accepts(&found.manifest().version) => {
                    let found = found.manifest().version.clone();
                    if dependency.is_optional {
                        warn!(
                            "optional dependency '{}' of '{pack_id}' is v{found}, wanted {}",
                            dependency.pack_id,
                            dependency.requirement()
                        );
                    } else {
                        return Err(PackLoadError::DependencyVersionMismatch {
                            pack_id,
                            dependency: dependency.pack_id.clone(),
                            required: dependency.requirement(),
                            found,
                        });
                    }
                },
                Some(_) => {},
            }
        }

        let overrides_before = self.merged.overrides.len();
        self.merged = merge_content(std::mem::take(&mut self.merged), &pack.content);
        for record in &self.merged.overrides[overrides_before..] {
            warn!(
                "{} '{}' from pack '{}' overrides pack '{}'",
                record.kind, record.id, record.pack, record.previous_pack
            );
        }

        info!(
            "loaded pack '{}' v{} ({})",
            pack_id,
            pack.manifest().version,
            pack.content.counts()
        );
        self.load_order.push(pack_id.clone());
        self.loaded_packs.insert(pack_id.clone(), pack);
        Ok(pack_id)
    }

    fn rebuild(&mut self) {
        self.merged = self
            .load_order
            .iter()
            .filter_map(|id| self.loaded_packs.get(id))
            .fold(MergedContent::default(), |merged, pack| merge_content(merged, &pack.content));
        debug!("rebuilt merged content from {} pack(s)", self.load_order.len());
    }

    fn get_loaded(&self, pack_id: &str) -> Result<&LoadedPack, PackLoadError> {
        self.loaded_packs
            .get(pack_id)
            .ok_or_else(|| PackLoadError::PackNotLoaded(pack_id.to_string()))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn region(&self, id: &str) -> Option<&RegionDefinition> {
        self.merged.regions.get(id)
    }

    pub fn event(&self, id: &str) -> Option<&EventDefinition> {
        self.merged.events.get(id)
    }

    pub fn quest(&self, id: &str) -> Option<&QuestDefinition> {
        self.merged.quests.get(id)
    }

    pub fn anchor(&self, id: &str) -> Option<&AnchorDefinition> {
        self.merged.anchors.get(id)
    }

    pub fn hero(&self, id: &str) -> Option<&HeroDefinition> {
        self.merged.heroes.get(id)
    }

    pub fn card(&self, id: &str) -> Option<&CardDefinition> {
        self.merged.cards.get(id)
    }

    pub fn enemy(&self, id: &str) -> Option<&EnemyDefinition> {
        self.merged.enemies.get(id)
    }

    pub fn fate_card(&self, id: &str) -> Option<&FateCard> {
        self.merged.fate_cards.get(id)
    }

    pub fn ability(&self, id: &str) -> Option<&AbilityDefinition> {
        self.merged.abilities.get(id)
    }

    pub fn behavior(&self, id: &str) -> Option<&BehaviorDefinition> {
        self.merged.behaviors.get(id)
    }

    pub fn all_regions(&self) -> Vec<&RegionDefinition> {
        self.merged.regions.values().collect()
    }

    pub fn all_events(&self) -> Vec<&EventDefinition> {
        self.merged.events.values().collect()
    }

    pub fn all_quests(&self) -> Vec<&QuestDefinition> {
        self.merged.quests.values().collect()
    }

    pub fn all_anchors(&self) -> Vec<&AnchorDefinition> {
        self.merged.anchors.values().collect()
    }

    pub fn all_heroes(&self) -> Vec<&HeroDefinition> {
        self.merged.heroes.values().collect()
    }

    pub fn all_cards(&self) -> Vec<&CardDefinition> {
        self.merged.cards.values().collect()
    }

    pub fn all_enemies(&self) -> Vec<&EnemyDefinition> {
        self.merged.enemies.values().collect()
    }

    pub fn all_fate_cards(&self) -> Vec<&FateCard> {
        self.merged.fate_cards.values().collect()
    }

    pub fn all_abilities(&self) -> Vec<&AbilityDefinition> {
        self.merged.abilities.values().collect()
    }

    pub fn all_behaviors(&self) -> Vec<&BehaviorDefinition> {
        self.merged.behaviors.values().collect()
    }

    /// Events whose availability admits this region, pressure and region state.
    pub fn available_events(&self, region_id: &str, pressure: i32, region_state: RegionState) -> Vec<&EventDefinition> {
        self.merged
            .events
            .values()
            .filter(|event| event.availability.matches(region_id, pressure, region_state))
            .collect()
    }

    /// Cards of a hero's starting deck, in deck order. Unknown heroes and cards are skipped.
    pub fn starting_deck(&self, hero_id: &str) -> Vec<&CardDefinition> {
        self.hero(hero_id)
            .map(|hero| {
                hero.starting_deck_card_ids
                    .iter()
                    .filter_map(|card_id| self.card(card_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn balance_config(&self) -> Option<&BalanceConfiguration> {
        self.merged.balance_config.as_ref()
    }

    /// Pack ids in load order.
    pub fn loaded_pack_ids(&self) -> Vec<&str> {
        self.load_order.iter().map(String::as_str).collect()
    }

    pub fn load_order(&self) -> &[String] {
        &self.load_order
    }

    pub fn pack(&self, pack_id: &str) -> Option<&LoadedPack> {
        self.loaded_packs.get(pack_id)
    }

    pub fn is_loaded(&self, pack_id: &str) -> bool {
        self.loaded_packs.contains_key(pack_id)
    }

    pub fn merged(&self) -> &MergedContent {
        &self.merged
    }

    // -----------------------------------------------------------------------
    // Explicit-failure accessors
    // -----------------------------------------------------------------------

    /// # Errors
    /// `NotFound` if the region is not loaded.
    pub fn require_region(&self, id: &str) -> Result<&RegionDefinition, ContentAccessError> {
        self.region(id).ok_or_else(|| ContentAccessError::not_found("region", id))
    }

    /// # Errors
    /// `NotFound` if the event is not loaded.
    pub fn require_event(&self, id: &str) -> Result<&EventDefinition, ContentAccessError> {
        self.event(id).ok_or_else(|| ContentAccessError::not_found("event", id))
    }

    /// # Errors
    /// `NotFound` if the quest is not loaded, `IncompleteContent` if it has no objectives.
    pub fn require_quest(&self, id: &str) -> Result<&QuestDefinition, ContentAccessError> {
        let quest = self.quest(id).ok_or_else(|| ContentAccessError::not_found("quest", id))?;
        if quest.objectives.is_empty() {
            return Err(ContentAccessError::IncompleteContent {
                kind: "quest",
                id: id.to_string(),
                missing: vec!["objectives".to_string()],
            });
        }
        Ok(quest)
    }

    /// # Errors
    /// `NotFound` if the hero is not loaded.
    pub fn require_hero(&self, id: &str) -> Result<&HeroDefinition, ContentAccessError> {
        self.hero(id).ok_or_else(|| ContentAccessError::not_found("hero", id))
    }

    /// The full starting deck, failing instead of skipping unresolved cards.
    ///
    /// # Errors
    /// `NotFound` for an unknown hero, `IncompleteContent` if the deck is empty or any card
    /// is missing.
    pub fn require_starting_deck(&self, hero_id: &str) -> Result<Vec<&CardDefinition>, ContentAccessError> {
        let hero = self.require_hero(hero_id)?;
        let missing: Vec<String> = hero
            .starting_deck_card_ids
            .iter()
            .filter(|card_id| self.card(card_id).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ContentAccessError::IncompleteContent {
                kind: "hero",
                id: hero_id.to_string(),
                missing,
            });
        }
        let deck = self.starting_deck(hero_id);
        if deck.is_empty() {
            return Err(ContentAccessError::IncompleteContent {
                kind: "hero",
                id: hero_id.to_string(),
                missing: vec!["starting_deck_card_ids".to_string()],
            });
        }
        Ok(deck)
    }

    /// # Errors
    /// `InsufficientContent` when fewer than `count` heroes are loaded.
    pub fn require_heroes(&self, count: usize) -> Result<Vec<&HeroDefinition>, ContentAccessError> {
        let heroes = self.all_heroes();
        if heroes.len() < count {
            return Err(ContentAccessError::InsufficientContent {
                kind: "hero",
                required: count,
                available: heroes.len(),
            });
        }
        Ok(heroes)
    }

    /// A game can start: at least one pack, region and hero.
    ///
    /// # Errors
    /// `NoPlayableContent` naming the first thing missing.
    pub fn check_playable(&self) -> Result<(), ContentAccessError> {
        if self.load_order.is_empty() {
            return Err(ContentAccessError::NoPlayableContent("no packs loaded".to_string()));
        }
        if self.merged.regions.is_empty() {
            return Err(ContentAccessError::NoPlayableContent("no regions defined".to_string()));
        }
        if self.merged.heroes.is_empty() {
            return Err(ContentAccessError::NoPlayableContent("no heroes defined".to_string()));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Cross-reference and expression problems in merged content, followed by one
    /// informational entry per cross-pack override.
    pub fn validate_all_content(&self) -> Vec<ContentValidationError> {
        let mut entries = validate_content(&self.merged.content_set(), &self.expressions);
        entries.extend(self.merged.override_entries());
        entries
    }

    /// # Errors
    /// `ValidationFailed` with every error-severity entry, if there are any.
    pub fn validated(&self) -> Result<(), ContentAccessError> {
        let errors: Vec<ContentValidationError> = self
            .validate_all_content()
            .into_iter()
            .filter(ContentValidationError::is_error)
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ContentAccessError::ValidationFailed(errors))
        }
    }
}

/// Decode a `.pack` file, mapping container failures onto load errors.
fn read_pack(path: &Path) -> Result<PackContent, PackLoadError> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(PACK_EXTENSION) {
        return Err(PackLoadError::ContentLoadFailed {
            file: path.to_path_buf(),
            reason: format!("expected a .{PACK_EXTENSION} file"),
        });
    }
    if !path.is_file() {
        return Err(PackLoadError::FileNotFound(path.to_path_buf()));
    }
    pack_file::load(path).map_err(|err| PackLoadError::from_pack_file(path, err))
}

/// Order a batch by pack type priority, then pull in-batch dependencies ahead of dependents.
///
/// # Errors
/// `CircularDependency` with the offending chain.
pub fn order_for_loading(
    mut batch: Vec<(PackContent, PathBuf)>,
) -> Result<Vec<(PackContent, PathBuf)>, PackLoadError> {
    batch.sort_by_key(|(content, _)| content.manifest.pack_type.load_priority());

    let order = {
        let index: HashMap<&str, usize> = batch
            .iter()
            .enumerate()
            .rev()
            .map(|(i, (content, _))| (content.id(), i))
            .collect();
        let mut order = Vec::with_capacity(batch.len());
        let mut done = HashSet::new();
        let mut stack = Vec::new();
        for i in 0..batch.len() {
            visit(i, &batch, &index, &mut done, &mut stack, &mut order)?;
        }
        order
    };

    let mut slots: Vec<Option<(PackContent, PathBuf)>> = batch.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}

fn visit(
    i: usize,
    batch: &[(PackContent, PathBuf)],
    index: &HashMap<&str, usize>,
    done: &mut HashSet<usize>,
    stack: &mut Vec<usize>,
    order: &mut Vec<usize>,
) -> Result<(), PackLoadError> {
    if done.contains(&i) {
        return Ok(());
    }
    if let Some(start) = stack.iter().position(|&j| j == i) {
        let mut chain: Vec<String> = stack[start..].iter().map(|&j| batch[j].0.id().to_string()).collect();
        chain.push(batch[i].0.id().to_string());
        return Err(PackLoadError::CircularDependency(chain));
    }

    stack.push(i);
    for dependency in &batch[i].0.manifest.dependencies {
        if let Some(&j) = index.get(dependency.pack_id.as_str()) {
            visit(j, batch, index, done, stack, order)?;
        }
    }
    stack.pop();
    done.insert(i);
    order.push(i);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(id: &str, pack_type: PackType, deps: &[&str]) -> (PackContent, PathBuf) {
        let mut manifest = PackManifest::new(id, id, Version::new(1, 0, 0));
        manifest.pack_type = pack_type;
        manifest.dependencies = deps
            .iter()
            .map(|dep| PackDependency::new(*dep, Version::new(1, 0, 0)))
            .collect();
        (PackContent::new(manifest), PathBuf::from(format!("{id}.pack")))
    }

    fn ids(batch: &[(PackContent, PathBuf)]) -> Vec<&str> {
        batch.iter().map(|(content, _)| content.id()).collect()
    }

    #[test]
    fn batches_order_by_type_priority() {
        let ordered = order_for_loading(vec![
            content("act-one", PackType::Campaign, &[]),
            content("core-heroes", PackType::Character, &[]),
            content("tuning", PackType::Balance, &[]),
        ])
        .expect("order");
        assert_eq!(ids(&ordered), vec!["tuning", "core-heroes", "act-one"]);
    }

    #[test]
    fn in_batch_dependencies_load_first() {
        let ordered = order_for_loading(vec![
            content("act-two", PackType::Campaign, &["act-one"]),
            content("act-one", PackType::Campaign, &["core-heroes"]),
            content("core-heroes", PackType::Character, &[]),
        ])
        .expect("order");
        assert_eq!(ids(&ordered), vec!["core-heroes", "act-one", "act-two"]);
    }

    #[test]
    fn cycles_are_reported_with_their_chain() {
        let err = order_for_loading(vec![
            content("pack-a", PackType::Campaign, &["pack-b"]),
            content("pack-b", PackType::Campaign, &["pack-a"]),
        ])
        .expect_err("cycle");
        match err {
            PackLoadError::CircularDependency(chain) => {
                assert_eq!(chain, vec!["pack-a", "pack-b", "pack-a"]);
            },
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn wrong_extension_is_rejected_before_reading() {
        let mut registry = ContentRegistry::new();
        let err = registry.load_pack(Path::new("content/act-one.json")).expect_err("extension");
        assert!(matches!(err, PackLoadError::ContentLoadFailed { .. }));
        let err = registry.load_pack(Path::new("does/not/exist.pack")).expect_err("missing");
        assert!(matches!(err, PackLoadError::FileNotFound(_)));
    }
}
