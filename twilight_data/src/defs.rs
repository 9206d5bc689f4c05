//! Content definitions: the packed shape of every entity a pack can carry.
//!
//! Small enums deserialize through their `from_key` lookups, so an unknown or oddly cased
//! value falls back to the enum's default instead of rejecting the whole file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable identifier used across content references.
pub type Id = String;

/// Locale used when a translation is missing.
pub const DEFAULT_LOCALE: &str = "en";

/// Player-facing text keyed by locale.
///
/// Authoring files may give either a bare string (stored under [`DEFAULT_LOCALE`]) or a
/// `{ "en": "...", "ru": "..." }` map; the packed form is always the map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "LocalizedRepr", into = "BTreeMap<String, String>")]
pub struct LocalizedString {
    translations: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LocalizedRepr {
    Plain(String),
    Map(BTreeMap<String, String>),
}

impl From<LocalizedRepr> for LocalizedString {
    fn from(repr: LocalizedRepr) -> Self {
        match repr {
            LocalizedRepr::Plain(text) => LocalizedString::new(text),
            LocalizedRepr::Map(translations) => LocalizedString { translations },
        }
    }
}

impl From<LocalizedString> for BTreeMap<String, String> {
    fn from(value: LocalizedString) -> Self {
        value.translations
    }
}

impl From<&str> for LocalizedString {
    fn from(text: &str) -> Self {
        LocalizedString::new(text)
    }
}

impl LocalizedString {
    /// Text in the default locale only.
    pub fn new(text: impl Into<String>) -> Self {
        let mut translations = BTreeMap::new();
        translations.insert(DEFAULT_LOCALE.to_string(), text.into());
        Self { translations }
    }

    /// Add or replace the translation for `locale`.
    #[must_use]
    pub fn with(mut self, locale: &str, text: impl Into<String>) -> Self {
        self.translations.insert(locale.to_string(), text.into());
        self
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.translations.get(locale).map(String::as_str)
    }

    /// Text for `locale`, falling back to the default locale, then to any translation.
    pub fn resolve(&self, locale: &str) -> &str {
        self.get(locale)
            .or_else(|| self.get(DEFAULT_LOCALE))
            .or_else(|| self.translations.values().next().map(String::as_str))
            .unwrap_or("")
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.translations.keys().map(String::as_str)
    }

    /// True when no translation carries any visible text.
    pub fn is_blank(&self) -> bool {
        self.translations.values().all(|text| text.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Shared enums
// ---------------------------------------------------------------------------

/// Lowercase, trimmed, with `-` and spaces folded to `_`.
pub(crate) fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

/// `From<String>` via `from_key`, for `#[serde(from = "String")]`.
macro_rules! from_key_string {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<String> for $ty {
                fn from(key: String) -> Self {
                    $ty::from_key(&key)
                }
            }
        )*
    };
}

from_key_string!(
    RegionState,
    RegionType,
    Influence,
    AnchorType,
    MiniGameKind,
    QuestProgressAction,
    QuestKind,
    HeroClass,
    CardType,
    CardRarity,
    EnemyType,
    AbilityTrigger,
);

/// Stability state of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum RegionState {
    #[default]
    Stable,
    Borderland,
    Breach,
}

impl RegionState {
    /// Case-insensitive lookup; unknown keys degrade to `Stable`.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "borderland" => RegionState::Borderland,
            "breach" => RegionState::Breach,
            _ => RegionState::Stable,
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            RegionState::Stable => "stable",
            RegionState::Borderland => "borderland",
            RegionState::Breach => "breach",
        }
    }
}

/// Terrain family of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum RegionType {
    Forest,
    Swamp,
    Mountain,
    #[default]
    Settlement,
    Water,
    Wasteland,
    Sacred,
}

impl RegionType {
    /// Case-insensitive lookup; unknown keys degrade to `Settlement`.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "forest" => RegionType::Forest,
            "swamp" => RegionType::Swamp,
            "mountain" => RegionType::Mountain,
            "water" => RegionType::Water,
            "wasteland" => RegionType::Wasteland,
            "sacred" => RegionType::Sacred,
            _ => RegionType::Settlement,
        }
    }
}

/// Light/dark alignment shared by anchors, cards and fate cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Influence {
    Light,
    #[default]
    Neutral,
    Dark,
}

impl Influence {
    /// Case-insensitive lookup; unknown keys degrade to `Neutral`.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "light" => Influence::Light,
            "dark" => Influence::Dark,
            _ => Influence::Neutral,
        }
    }
}

// ---------------------------------------------------------------------------
// Regions and anchors
// ---------------------------------------------------------------------------

/// Region definition consumed by the world simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDefinition {
    pub id: Id,
    pub title: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub region_type: RegionType,
    #[serde(default)]
    pub neighbor_ids: Vec<Id>,
    #[serde(default)]
    pub initially_discovered: bool,
    #[serde(default)]
    pub anchor_id: Option<Id>,
    #[serde(default)]
    pub event_pool_ids: Vec<String>,
    #[serde(default)]
    pub initial_state: RegionState,
    #[serde(default = "default_degradation_weight")]
    pub degradation_weight: i32,
}

impl Default for RegionDefinition {
    fn default() -> Self {
        Self {
            id: Id::new(),
            title: LocalizedString::default(),
            description: LocalizedString::default(),
            region_type: RegionType::default(),
            neighbor_ids: Vec::new(),
            initially_discovered: false,
            anchor_id: None,
            event_pool_ids: Vec::new(),
            initial_state: RegionState::default(),
            degradation_weight: default_degradation_weight(),
        }
    }
}

fn default_degradation_weight() -> i32 {
    1
}

/// Kind of structure an anchor represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum AnchorType {
    #[default]
    Shrine,
    Barrier,
    Lighthouse,
    Totem,
    SacredTree,
    Monument,
}

impl AnchorType {
    /// Case-insensitive lookup; unknown keys degrade to `Shrine`.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "barrier" => AnchorType::Barrier,
            "lighthouse" => AnchorType::Lighthouse,
            "totem" => AnchorType::Totem,
            "sacred_tree" => AnchorType::SacredTree,
            "monument" => AnchorType::Monument,
            _ => AnchorType::Shrine,
        }
    }
}

/// Anchor bound to exactly one region; its integrity governs that region's stability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorDefinition {
    pub id: Id,
    pub title: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    pub region_id: Id,
    #[serde(default)]
    pub anchor_type: AnchorType,
    #[serde(default)]
    pub initial_influence: Influence,
    #[serde(default = "default_anchor_power")]
    pub power: i32,
    #[serde(default = "default_integrity")]
    pub max_integrity: i32,
    #[serde(default = "default_integrity")]
    pub initial_integrity: i32,
}

impl Default for AnchorDefinition {
    fn default() -> Self {
        Self {
            id: Id::new(),
            title: LocalizedString::default(),
            description: LocalizedString::default(),
            region_id: Id::new(),
            anchor_type: AnchorType::default(),
            initial_influence: Influence::default(),
            power: default_anchor_power(),
            max_integrity: default_integrity(),
            initial_integrity: default_integrity(),
        }
    }
}

fn default_anchor_power() -> i32 {
    5
}

fn default_integrity() -> i32 {
    100
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Mini-game family an event can hand off to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum MiniGameKind {
    #[default]
    Combat,
    Ritual,
    Exploration,
    Dialogue,
    Puzzle,
}

impl MiniGameKind {
    /// Case-insensitive lookup; unknown keys degrade to `Combat`.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "ritual" => MiniGameKind::Ritual,
            "exploration" => MiniGameKind::Exploration,
            "dialogue" => MiniGameKind::Dialogue,
            "puzzle" => MiniGameKind::Puzzle,
            _ => MiniGameKind::Combat,
        }
    }
}

/// How an event is resolved: inline choices or a mini-game.
///
/// Serialized as `"inline"` or `{"mini_game": "combat"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    #[default]
    Inline,
    MiniGame(MiniGameKind),
}

/// Gates on whether an event may occur. `None` lists are wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventAvailability {
    #[serde(default)]
    pub region_states: Option<Vec<RegionState>>,
    #[serde(default)]
    pub region_ids: Option<Vec<Id>>,
    #[serde(default)]
    pub min_pressure: Option<i32>,
    #[serde(default)]
    pub max_pressure: Option<i32>,
    #[serde(default)]
    pub min_balance: Option<i32>,
    #[serde(default)]
    pub max_balance: Option<i32>,
    #[serde(default)]
    pub required_flags: Vec<String>,
    #[serde(default)]
    pub forbidden_flags: Vec<String>,
    /// Condition expressions that must all hold at runtime.
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl EventAvailability {
    /// Region id, region state and pressure gates. Flags, balance and expressions are left to
    /// the gameplay layer.
    pub fn matches(&self, region_id: &str, pressure: i32, region_state: RegionState) -> bool {
        let region_ok = self
            .region_ids
            .as_ref()
            .is_none_or(|ids| ids.iter().any(|id| id == region_id));
        let state_ok = self
            .region_states
            .as_ref()
            .is_none_or(|states| states.contains(&region_state));
        let min_ok = self.min_pressure.is_none_or(|min| pressure >= min);
        let max_ok = self.max_pressure.is_none_or(|max| pressure <= max);
        region_ok && state_ok && min_ok && max_ok
    }
}

/// Event definition with its choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub id: Id,
    pub title: LocalizedString,
    #[serde(default)]
    pub body: LocalizedString,
    #[serde(default)]
    pub event_kind: EventKind,
    #[serde(default)]
    pub pool_ids: Vec<String>,
    #[serde(default)]
    pub availability: EventAvailability,
    #[serde(default = "default_event_weight")]
    pub weight: i32,
    #[serde(default)]
    pub is_one_time: bool,
    #[serde(default)]
    pub is_instant: bool,
    #[serde(default)]
    pub cooldown: u32,
    #[serde(default)]
    pub choices: Vec<ChoiceDefinition>,
    #[serde(default)]
    pub mini_game_challenge: Option<MiniGameChallengeDefinition>,
}

impl Default for EventDefinition {
    fn default() -> Self {
        Self {
            id: Id::new(),
            title: LocalizedString::default(),
            body: LocalizedString::default(),
            event_kind: EventKind::default(),
            pool_ids: Vec::new(),
            availability: EventAvailability::default(),
            weight: default_event_weight(),
            is_one_time: false,
            is_instant: false,
            cooldown: 0,
            choices: Vec::new(),
            mini_game_challenge: None,
        }
    }
}

/// Weight given to events that do not specify one.
pub const DEFAULT_EVENT_WEIGHT: i32 = 10;

fn default_event_weight() -> i32 {
    DEFAULT_EVENT_WEIGHT
}

/// A single choice offered by an event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChoiceDefinition {
    pub id: Id,
    pub label: LocalizedString,
    #[serde(default)]
    pub tooltip: Option<LocalizedString>,
    #[serde(default)]
    pub requirements: Option<ChoiceRequirements>,
    #[serde(default)]
    pub consequences: ChoiceConsequences,
}

/// Preconditions for picking a choice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChoiceRequirements {
    #[serde(default)]
    pub min_resources: BTreeMap<String, i32>,
    #[serde(default)]
    pub required_flags: Vec<String>,
    #[serde(default)]
    pub forbidden_flags: Vec<String>,
    #[serde(default)]
    pub min_balance: Option<i32>,
    #[serde(default)]
    pub max_balance: Option<i32>,
    #[serde(default)]
    pub conditions: Vec<String>,
}

/// World changes applied when a choice resolves.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChoiceConsequences {
    #[serde(default)]
    pub resource_changes: BTreeMap<String, i32>,
    #[serde(default)]
    pub set_flags: Vec<String>,
    #[serde(default)]
    pub clear_flags: Vec<String>,
    #[serde(default)]
    pub balance_delta: i32,
    #[serde(default)]
    pub tension_delta: i32,
    #[serde(default)]
    pub region_state_change: Option<RegionStateChange>,
    #[serde(default)]
    pub quest_progress: Option<QuestProgressTrigger>,
    #[serde(default)]
    pub result_key: Option<String>,
}

/// Moves a region (the current one when `region_id` is `None`) to a new state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionStateChange {
    #[serde(default)]
    pub region_id: Option<Id>,
    pub new_state: RegionState,
}

/// What a consequence does to a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum QuestProgressAction {
    Start,
    #[default]
    Advance,
    Complete,
    Fail,
}

impl QuestProgressAction {
    /// Case-insensitive lookup; unknown keys degrade to `Advance`.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "start" => QuestProgressAction::Start,
            "complete" => QuestProgressAction::Complete,
            "fail" => QuestProgressAction::Fail,
            _ => QuestProgressAction::Advance,
        }
    }
}

/// Quest progress caused by a consequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestProgressTrigger {
    pub quest_id: Id,
    #[serde(default)]
    pub objective_id: Option<Id>,
    #[serde(default)]
    pub action: QuestProgressAction,
}

/// Mini-game challenge attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniGameChallengeDefinition {
    pub id: Id,
    #[serde(default)]
    pub challenge_kind: MiniGameKind,
    #[serde(default = "default_challenge_difficulty")]
    pub difficulty: i32,
    #[serde(default)]
    pub enemy_id: Option<Id>,
    #[serde(default)]
    pub title: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub victory_consequences: ChoiceConsequences,
    #[serde(default)]
    pub defeat_consequences: ChoiceConsequences,
}

impl Default for MiniGameChallengeDefinition {
    fn default() -> Self {
        Self {
            id: Id::new(),
            challenge_kind: MiniGameKind::default(),
            difficulty: default_challenge_difficulty(),
            enemy_id: None,
            title: LocalizedString::default(),
            description: LocalizedString::default(),
            victory_consequences: ChoiceConsequences::default(),
            defeat_consequences: ChoiceConsequences::default(),
        }
    }
}

/// Difficulty given to challenges that do not specify one.
pub const DEFAULT_CHALLENGE_DIFFICULTY: i32 = 5;

fn default_challenge_difficulty() -> i32 {
    DEFAULT_CHALLENGE_DIFFICULTY
}

// ---------------------------------------------------------------------------
// Quests
// ---------------------------------------------------------------------------

/// Quest category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum QuestKind {
    Main,
    #[default]
    Side,
    Exploration,
    Challenge,
}

impl QuestKind {
    /// Case-insensitive lookup; unknown keys degrade to `Side`.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "main" => QuestKind::Main,
            "exploration" => QuestKind::Exploration,
            "challenge" => QuestKind::Challenge,
            _ => QuestKind::Side,
        }
    }
}

/// When an objective counts as complete.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompletionCondition {
    FlagSet { flag: String },
    VisitRegion { region_id: Id },
    EventCompleted { event_id: Id },
    DefeatEnemy { enemy_id: Id },
    CollectItem { item_id: Id },
    ChoiceMade { event_id: Id, choice_id: Id },
    ResourceThreshold { resource: String, min_value: i32 },
    #[default]
    Manual,
}

/// One step of a quest. `next_objective_id` and `alternative_next_ids` form the quest graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveDefinition {
    pub id: Id,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub completion_condition: CompletionCondition,
    #[serde(default = "default_target_value")]
    pub target_value: i32,
    #[serde(default)]
    pub next_objective_id: Option<Id>,
    #[serde(default)]
    pub alternative_next_ids: Vec<Id>,
    #[serde(default)]
    pub is_optional: bool,
}

impl Default for ObjectiveDefinition {
    fn default() -> Self {
        Self {
            id: Id::new(),
            description: LocalizedString::default(),
            completion_condition: CompletionCondition::default(),
            target_value: default_target_value(),
            next_objective_id: None,
            alternative_next_ids: Vec::new(),
            is_optional: false,
        }
    }
}

fn default_target_value() -> i32 {
    1
}

/// Gates on when a quest may start.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestAvailability {
    #[serde(default)]
    pub required_flags: Vec<String>,
    #[serde(default)]
    pub forbidden_flags: Vec<String>,
    #[serde(default)]
    pub min_pressure: Option<i32>,
    #[serde(default)]
    pub max_pressure: Option<i32>,
    #[serde(default)]
    pub region_states: Option<Vec<RegionState>>,
}

/// Rewards (or penalties) applied when a quest resolves.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestRewards {
    #[serde(default)]
    pub resource_changes: BTreeMap<String, i32>,
    #[serde(default)]
    pub set_flags: Vec<String>,
    #[serde(default)]
    pub card_ids: Vec<Id>,
    #[serde(default)]
    pub balance_delta: i32,
}

/// Quest definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestDefinition {
    pub id: Id,
    pub title: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub quest_kind: QuestKind,
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default)]
    pub availability: QuestAvailability,
    #[serde(default)]
    pub objectives: Vec<ObjectiveDefinition>,
    #[serde(default)]
    pub completion_rewards: QuestRewards,
    #[serde(default)]
    pub failure_penalties: QuestRewards,
}

impl QuestDefinition {
    /// Entry point of the objective graph.
    pub fn first_objective(&self) -> Option<&ObjectiveDefinition> {
        self.objectives.first()
    }

    pub fn objective(&self, id: &str) -> Option<&ObjectiveDefinition> {
        self.objectives.iter().find(|objective| objective.id == id)
    }
}

// ---------------------------------------------------------------------------
// Heroes, cards, enemies
// ---------------------------------------------------------------------------

/// Hero archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum HeroClass {
    #[default]
    Warrior,
    Mage,
    Ranger,
    Priest,
    Shadow,
}

impl HeroClass {
    /// Case-insensitive lookup; unknown keys degrade to `Warrior`.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "mage" => HeroClass::Mage,
            "ranger" => HeroClass::Ranger,
            "priest" => HeroClass::Priest,
            "shadow" => HeroClass::Shadow,
            _ => HeroClass::Warrior,
        }
    }
}

/// Starting statistics for a hero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroStats {
    pub health: i32,
    pub max_health: i32,
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
    pub faith: i32,
    pub max_faith: i32,
    pub starting_balance: i32,
}

impl Default for HeroStats {
    fn default() -> Self {
        Self {
            health: 10,
            max_health: 10,
            strength: 5,
            dexterity: 5,
            constitution: 5,
            intelligence: 5,
            wisdom: 5,
            charisma: 5,
            faith: 3,
            max_faith: 10,
            starting_balance: 50,
        }
    }
}

/// How a hero becomes selectable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HeroAvailability {
    #[default]
    AlwaysAvailable,
    RequiresUnlock { condition: String },
    DlcPack { pack_id: String },
}

/// Playable hero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeroDefinition {
    pub id: Id,
    pub name: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub hero_class: HeroClass,
    #[serde(default)]
    pub base_stats: HeroStats,
    #[serde(default)]
    pub ability_ids: Vec<Id>,
    #[serde(default, alias = "starting_deck_card_IDs")]
    pub starting_deck_card_ids: Vec<Id>,
    #[serde(default)]
    pub availability: HeroAvailability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum CardType {
    #[default]
    Attack,
    Defense,
    Spell,
    Item,
    Ritual,
    Resource,
    Curse,
    Special,
}

impl CardType {
    /// Unknown keys degrade to `Attack`.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "defense" | "defence" => CardType::Defense,
            "spell" => CardType::Spell,
            "item" => CardType::Item,
            "ritual" => CardType::Ritual,
            "resource" => CardType::Resource,
            "curse" => CardType::Curse,
            "special" => CardType::Special,
            _ => CardType::Attack,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum CardRarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl CardRarity {
    /// Unknown keys degrade to `Common`.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "uncommon" => CardRarity::Uncommon,
            "rare" => CardRarity::Rare,
            "epic" => CardRarity::Epic,
            "legendary" => CardRarity::Legendary,
            _ => CardRarity::Common,
        }
    }
}

/// Card definition shared by hero decks, loot and rewards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: Id,
    pub name: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub card_type: CardType,
    #[serde(default)]
    pub rarity: CardRarity,
    #[serde(default)]
    pub cost: i32,
    #[serde(default)]
    pub power: i32,
    #[serde(default)]
    pub defense: i32,
    #[serde(default)]
    pub balance: Influence,
    #[serde(default)]
    pub faith_cost: i32,
    #[serde(default)]
    pub ability_ids: Vec<Id>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum EnemyType {
    #[default]
    Beast,
    Spirit,
    Undead,
    Demon,
    Human,
    Boss,
}

impl EnemyType {
    /// Unknown keys degrade to `Beast`.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "spirit" => EnemyType::Spirit,
            "undead" => EnemyType::Undead,
            "demon" => EnemyType::Demon,
            "human" => EnemyType::Human,
            "boss" => EnemyType::Boss,
            _ => EnemyType::Beast,
        }
    }
}

/// Enemy definition consumed by the combat layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyDefinition {
    pub id: Id,
    pub name: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub enemy_type: EnemyType,
    #[serde(default = "default_enemy_health")]
    pub health: i32,
    #[serde(default = "default_enemy_power")]
    pub power: i32,
    #[serde(default)]
    pub defense: i32,
    #[serde(default = "default_enemy_difficulty")]
    pub difficulty: i32,
    #[serde(default)]
    pub loot_card_ids: Vec<Id>,
    #[serde(default)]
    pub faith_reward: i32,
    #[serde(default)]
    pub balance_delta: i32,
    #[serde(default)]
    pub behavior_id: Option<Id>,
}

impl Default for EnemyDefinition {
    fn default() -> Self {
        Self {
            id: Id::new(),
            name: LocalizedString::default(),
            description: LocalizedString::default(),
            enemy_type: EnemyType::default(),
            health: default_enemy_health(),
            power: default_enemy_power(),
            defense: 0,
            difficulty: default_enemy_difficulty(),
            loot_card_ids: Vec::new(),
            faith_reward: 0,
            balance_delta: 0,
            behavior_id: None,
        }
    }
}

fn default_enemy_health() -> i32 {
    10
}

fn default_enemy_power() -> i32 {
    3
}

fn default_enemy_difficulty() -> i32 {
    1
}

/// Card from the fate deck used by combat resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FateCard {
    pub id: Id,
    #[serde(default)]
    pub name: LocalizedString,
    #[serde(default)]
    pub modifier: i32,
    #[serde(default)]
    pub is_critical: bool,
    #[serde(default)]
    pub is_sticky: bool,
    #[serde(default)]
    pub suit: Option<Influence>,
}

// ---------------------------------------------------------------------------
// Abilities and behaviors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum AbilityTrigger {
    #[default]
    Passive,
    OnPlay,
    OnTurnStart,
    OnDamage,
    Manual,
}

impl AbilityTrigger {
    /// Unknown keys degrade to `Passive`.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "on_play" | "onplay" => AbilityTrigger::OnPlay,
            "on_turn_start" | "onturnstart" => AbilityTrigger::OnTurnStart,
            "on_damage" | "ondamage" => AbilityTrigger::OnDamage,
            "manual" => AbilityTrigger::Manual,
            _ => AbilityTrigger::Passive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityEffect {
    pub kind: String,
    #[serde(default)]
    pub value: i32,
}

/// Hero or card ability.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AbilityDefinition {
    pub id: Id,
    pub name: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub trigger: AbilityTrigger,
    #[serde(default)]
    pub effects: Vec<AbilityEffect>,
    #[serde(default)]
    pub cooldown: u32,
}

/// Weighted enemy action guarded by a condition expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorRule {
    pub condition: String,
    pub action: String,
    #[serde(default = "default_rule_weight")]
    pub weight: i32,
}

fn default_rule_weight() -> i32 {
    1
}

/// Enemy decision rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorDefinition {
    pub id: Id,
    #[serde(default)]
    pub rules: Vec<BehaviorRule>,
    #[serde(default = "default_action")]
    pub default_action: String,
}

fn default_action() -> String {
    "attack".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localized_string_accepts_plain_text_and_maps() {
        let plain: LocalizedString = serde_json::from_str("\"Village\"").expect("plain");
        assert_eq!(plain.resolve("ru"), "Village");

        let map: LocalizedString = serde_json::from_str(r#"{"en":"Village","ru":"Деревня"}"#).expect("map");
        assert_eq!(map.resolve("ru"), "Деревня");
        assert_eq!(serde_json::to_string(&plain).expect("encode"), r#"{"en":"Village"}"#);
    }

    #[test]
    fn enum_keys_fall_back_instead_of_failing() {
        assert_eq!(RegionState::from_key("BREACH"), RegionState::Breach);
        assert_eq!(RegionState::from_key("collapsed"), RegionState::Stable);
        assert_eq!(AnchorType::from_key("Sacred-Tree"), AnchorType::SacredTree);
        assert_eq!(MiniGameKind::from_key("riddle"), MiniGameKind::Combat);
        assert_eq!(QuestKind::from_key(""), QuestKind::Side);
        assert_eq!(AbilityTrigger::from_key("On-Turn-Start"), AbilityTrigger::OnTurnStart);
        assert_eq!(CardRarity::from_key("LEGENDARY"), CardRarity::Legendary);
    }

    #[test]
    fn directly_authored_enums_deserialize_leniently() {
        let hero: HeroDefinition =
            serde_json::from_str(r#"{"id": "sir-aldo", "name": "Aldo", "hero_class": "Paladin"}"#).expect("hero");
        assert_eq!(hero.hero_class, HeroClass::Warrior);
        let hero: HeroDefinition =
            serde_json::from_str(r#"{"id": "vesna", "name": "Vesna", "hero_class": "PRIEST"}"#).expect("hero");
        assert_eq!(hero.hero_class, HeroClass::Priest);

        let card: CardDefinition = serde_json::from_str(
            r#"{"id": "ember", "name": "Ember", "card_type": "Spell", "rarity": "mythic", "balance": "Dark"}"#,
        )
        .expect("card");
        assert_eq!(card.card_type, CardType::Spell);
        assert_eq!(card.rarity, CardRarity::Common);
        assert_eq!(card.balance, Influence::Dark);

        let enemy: EnemyDefinition =
            serde_json::from_str(r#"{"id": "wight", "name": "Wight", "enemy_type": "Undead"}"#).expect("enemy");
        assert_eq!(enemy.enemy_type, EnemyType::Undead);

        // the packed form still writes the canonical key
        assert_eq!(serde_json::to_string(&HeroClass::Priest).expect("encode"), "\"priest\"");
    }

    #[test]
    fn event_kind_wire_shapes() {
        assert_eq!(serde_json::to_string(&EventKind::Inline).expect("inline"), "\"inline\"");
        assert_eq!(
            serde_json::to_string(&EventKind::MiniGame(MiniGameKind::Combat)).expect("mini game"),
            r#"{"mini_game":"combat"}"#
        );
    }

    #[test]
    fn availability_wildcards_and_pressure_range() {
        let availability = EventAvailability {
            region_ids: Some(vec!["village".into()]),
            min_pressure: Some(20),
            max_pressure: Some(60),
            ..EventAvailability::default()
        };
        assert!(availability.matches("village", 30, RegionState::Breach));
        assert!(!availability.matches("forest", 30, RegionState::Stable));
        assert!(!availability.matches("village", 61, RegionState::Stable));
        assert!(EventAvailability::default().matches("anywhere", -5, RegionState::Borderland));
    }

    #[test]
    fn definitions_fill_defaults() {
        let event: EventDefinition = serde_json::from_str(r#"{"id":"e1","title":"Storm"}"#).expect("event");
        assert_eq!(event.weight, DEFAULT_EVENT_WEIGHT);
        assert!(!event.is_one_time);
        assert_eq!(event.event_kind, EventKind::Inline);

        let anchor: AnchorDefinition =
            serde_json::from_str(r#"{"id":"a1","title":"Shrine","region_id":"village"}"#).expect("anchor");
        assert_eq!(anchor.initial_integrity, 100);
    }
}
