//! Decoded pack content and the loaded-pack record kept by the registry.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::balance::BalanceConfiguration;
use crate::defs::*;
use crate::manifest::PackManifest;

/// Everything one pack contributes, keyed by definition id.
///
/// This is the JSON document stored (compressed) inside a `.pack` file. Fields added after the
/// first format revision default to empty so older payloads still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackContent {
    pub manifest: PackManifest,
    #[serde(default)]
    pub regions: BTreeMap<Id, RegionDefinition>,
    #[serde(default)]
    pub events: BTreeMap<Id, EventDefinition>,
    #[serde(default)]
    pub quests: BTreeMap<Id, QuestDefinition>,
    #[serde(default)]
    pub anchors: BTreeMap<Id, AnchorDefinition>,
    #[serde(default)]
    pub heroes: BTreeMap<Id, HeroDefinition>,
    #[serde(default)]
    pub cards: BTreeMap<Id, CardDefinition>,
    #[serde(default)]
    pub enemies: BTreeMap<Id, EnemyDefinition>,
    #[serde(default)]
    pub fate_cards: BTreeMap<Id, FateCard>,
    #[serde(default)]
    pub abilities: BTreeMap<Id, AbilityDefinition>,
    #[serde(default)]
    pub behaviors: BTreeMap<Id, BehaviorDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_config: Option<BalanceConfiguration>,
}

impl PackContent {
    /// Empty content for `manifest`.
    pub fn new(manifest: PackManifest) -> Self {
        Self {
            manifest,
            regions: BTreeMap::new(),
            events: BTreeMap::new(),
            quests: BTreeMap::new(),
            anchors: BTreeMap::new(),
            heroes: BTreeMap::new(),
            cards: BTreeMap::new(),
            enemies: BTreeMap::new(),
            fate_cards: BTreeMap::new(),
            abilities: BTreeMap::new(),
            behaviors: BTreeMap::new(),
            balance_config: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn counts(&self) -> ContentCounts {
        self.content_set().counts()
    }

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
}

/// Borrowed view over a full set of definition maps, either one pack's or the merged result.
#[derive(Debug, Clone, Copy)]
pub struct ContentSet<'a> {
    pub regions: &'a BTreeMap<Id, RegionDefinition>,
    pub events: &'a BTreeMap<Id, EventDefinition>,
    pub quests: &'a BTreeMap<Id, QuestDefinition>,
    pub anchors: &'a BTreeMap<Id, AnchorDefinition>,
    pub heroes: &'a BTreeMap<Id, HeroDefinition>,
    pub cards: &'a BTreeMap<Id, CardDefinition>,
    pub enemies: &'a BTreeMap<Id, EnemyDefinition>,
    pub fate_cards: &'a BTreeMap<Id, FateCard>,
    pub abilities: &'a BTreeMap<Id, AbilityDefinition>,
    pub behaviors: &'a BTreeMap<Id, BehaviorDefinition>,
}

impl ContentSet<'_> {
    pub fn counts(&self) -> ContentCounts {
        ContentCounts {
            regions: self.regions.len(),
            events: self.events.len(),
            quests: self.quests.len(),
            anchors: self.anchors.len(),
            heroes: self.heroes.len(),
            cards: self.cards.len(),
            enemies: self.enemies.len(),
            fate_cards: self.fate_cards.len(),
            abilities: self.abilities.len(),
            behaviors: self.behaviors.len(),
        }
    }
}

/// Number of definitions of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentCounts {
    pub regions: usize,
    pub events: usize,
    pub quests: usize,
    pub anchors: usize,
    pub heroes: usize,
    pub cards: usize,
    pub enemies: usize,
    pub fate_cards: usize,
    pub abilities: usize,
    pub behaviors: usize,
}

impl ContentCounts {
    pub fn total(&self) -> usize {
        self.regions
            + self.events
            + self.quests
            + self.anchors
            + self.heroes
            + self.cards
            + self.enemies
            + self.fate_cards
            + self.abilities
            + self.behaviors
    }
}

impl fmt::Display for ContentCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} regions, {} events, {} quests, {} anchors, {} heroes, {} cards, {} enemies, {} fate cards, \
             {} abilities, {} behaviors",
            self.regions,
            self.events,
            self.quests,
            self.anchors,
            self.heroes,
            self.cards,
            self.enemies,
            self.fate_cards,
            self.abilities,
            self.behaviors
        )
    }
}

/// A pack held by the registry: its content plus where and when it was loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPack {
    pub content: PackContent,
    /// `None` for packs registered from memory.
    pub source_path: Option<PathBuf>,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedPack {
    pub fn new(content: PackContent, source_path: Option<PathBuf>) -> Self {
        Self {
            content,
            source_path,
            loaded_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        self.content.id()
    }

    pub fn manifest(&self) -> &PackManifest {
        &self.content.manifest
    }
}
