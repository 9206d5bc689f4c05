//! Override-resolved view of every loaded pack.
//!
//! [`merge_content`] is the only way content enters a [`MergedContent`]; the registry rebuilds
//! from scratch by folding its load order through it.

use std::collections::BTreeMap;

use log::debug;
use twilight_data::*;

/// One id defined by an earlier pack and replaced by a later one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRecord {
    pub kind: &'static str,
    pub id: Id,
    pub previous_pack: String,
    pub pack: String,
}

/// Flattened definitions with later packs winning on id collisions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedContent {
    pub regions: BTreeMap<Id, RegionDefinition>,
    pub events: BTreeMap<Id, EventDefinition>,
    pub quests: BTreeMap<Id, QuestDefinition>,
    pub anchors: BTreeMap<Id, AnchorDefinition>,
    pub heroes: BTreeMap<Id, HeroDefinition>,
    pub cards: BTreeMap<Id, CardDefinition>,
    pub enemies: BTreeMap<Id, EnemyDefinition>,
    pub fate_cards: BTreeMap<Id, FateCard>,
    pub abilities: BTreeMap<Id, AbilityDefinition>,
    pub behaviors: BTreeMap<Id, BehaviorDefinition>,
    /// Whole configuration from the last pack that shipped one.
    pub balance_config: Option<BalanceConfiguration>,
    pub balance_source: Option<String>,
    /// `(kind, id)` to the pack whose definition currently wins.
    pub owners: BTreeMap<(&'static str, Id), String>,
    pub overrides: Vec<OverrideRecord>,
}

impl MergedContent {
    pub fn content_set(&self) -> ContentSet<'_> {
        ContentSet {
            regions: &self.regions,
            events: &self.events,
            quests: &self.quests,
            anchors: &self.anchors,
            heroes: &self.heroes,
            cards: &self.cards,
            enemies: &self.enemies,
            fate_cards: &self.fate_cards,
            abilities: &self.abilities,
            behaviors: &self.behaviors,
        }
    }

    pub fn counts(&self) -> ContentCounts {
        self.content_set().counts()
    }

    /// Pack that supplied the winning definition of `kind` `id`.
    pub fn owner(&self, kind: &'static str, id: &str) -> Option<&str> {
        self.owners.get(&(kind, id.to_string())).map(String::as_str)
    }

    /// Overrides as informational validation entries.
    pub fn override_entries(&self) -> Vec<ContentValidationError> {
        self.overrides
            .iter()
            .map(|record| ContentValidationError::DuplicateId {
                kind: record.kind,
                id: record.id.clone(),
                context: format!("pack '{}' overrides pack '{}'", record.pack, record.previous_pack),
            })
            .collect()
    }
}

/// Fold one pack into `base`. Later definitions replace earlier ones with the same id; each
/// replacement is recorded in `overrides`.
pub fn merge_content(mut base: MergedContent, pack: &PackContent) -> MergedContent {
    let pack_id = pack.id();
    let mut merger = Merger {
        pack_id,
        owners: &mut base.owners,
        overrides: &mut base.overrides,
    };

    merger.merge("region", &mut base.regions, &pack.regions);
    merger.merge("event", &mut base.events, &pack.events);
    merger.merge("quest", &mut base.quests, &pack.quests);
    merger.merge("anchor", &mut base.anchors, &pack.anchors);
    merger.merge("hero", &mut base.heroes, &pack.heroes);
    merger.merge("card", &mut base.cards, &pack.cards);
    merger.merge("enemy", &mut base.enemies, &pack.enemies);
    merger.merge("fate card", &mut base.fate_cards, &pack.fate_cards);
    merger.merge("ability", &mut base.abilities, &pack.abilities);
    merger.merge("behavior", &mut base.behaviors, &pack.behaviors);

    if let Some(config) = &pack.balance_config {
        if let Some(previous) = &base.balance_source {
            debug!("balance configuration from '{pack_id}' replaces the one from '{previous}'");
        }
        base.balance_config = Some(config.clone());
        base.balance_source = Some(pack_id.to_string());
    }

    base
}

/// Fold packs in order into a fresh [`MergedContent`].
pub fn merge_all<'a>(packs: impl IntoIterator<Item = &'a PackContent>) -> MergedContent {
    packs.into_iter().fold(MergedContent::default(), merge_content)
}

struct Merger<'a> {
    pack_id: &'a str,
    owners: &'a mut BTreeMap<(&'static str, Id), String>,
    overrides: &'a mut Vec<OverrideRecord>,
}

impl Merger<'_> {
    fn merge<T: Clone>(&mut self, kind: &'static str, target: &mut BTreeMap<Id, T>, incoming: &BTreeMap<Id, T>) {
        for (id, definition) in incoming {
            target.insert(id.clone(), definition.clone());
            if let Some(previous) = self.owners.insert((kind, id.clone()), self.pack_id.to_string())
                && previous != self.pack_id
            {
                self.overrides.push(OverrideRecord {
                    kind,
                    id: id.clone(),
                    previous_pack: previous,
                    pack: self.pack_id.to_string(),
                });
            }
        }
    }
}
