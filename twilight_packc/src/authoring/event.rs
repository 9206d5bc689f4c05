//! Event authoring schema: events, their choices, gates and consequences.

use std::collections::BTreeMap;

use serde::Deserialize;
use twilight_data::{
    ChoiceConsequences, ChoiceDefinition, ChoiceRequirements, EventAvailability, EventDefinition, EventKind,
    LocalizedString, MiniGameKind, QuestProgressAction, QuestProgressTrigger, RegionState, RegionStateChange,
};

use super::{RawChallenge, region_states};

#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub id: String,
    #[serde(default, alias = "name")]
    title: LocalizedString,
    #[serde(default, alias = "description")]
    body: LocalizedString,
    #[serde(default, alias = "kind")]
    event_kind: Option<RawEventKind>,
    #[serde(default)]
    pool_ids: Vec<String>,
    #[serde(default)]
    availability: Option<RawAvailability>,
    #[serde(default)]
    weight: Option<i32>,
    #[serde(default)]
    is_one_time: Option<bool>,
    #[serde(default)]
    is_instant: Option<bool>,
    #[serde(default)]
    cooldown: Option<u32>,
    #[serde(default)]
    choices: Vec<RawChoice>,
    #[serde(default, alias = "challenge")]
    mini_game_challenge: Option<RawChallenge>,
}

/// `event_kind` as written: `"inline"`, `"combat"`, `{"mini_game": "ritual"}`, or anything else.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawEventKind {
    Named(String),
    MiniGame { mini_game: String },
    Other(serde_json::Value),
}

impl RawEventKind {
    /// Unrecognised shapes and names resolve to [`EventKind::Inline`].
    pub fn to_kind(&self) -> EventKind {
        match self {
            RawEventKind::Named(name) => match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
                "mini_game" | "minigame" | "combat" => EventKind::MiniGame(MiniGameKind::Combat),
                "ritual" | "exploration" | "dialogue" | "puzzle" => EventKind::MiniGame(MiniGameKind::from_key(name)),
                _ => EventKind::Inline,
            },
            RawEventKind::MiniGame { mini_game } => EventKind::MiniGame(MiniGameKind::from_key(mini_game)),
            RawEventKind::Other(_) => EventKind::Inline,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAvailability {
    #[serde(default)]
    region_states: Option<Vec<String>>,
    #[serde(default)]
    region_ids: Option<Vec<String>>,
    #[serde(default)]
    min_pressure: Option<i32>,
    #[serde(default)]
    max_pressure: Option<i32>,
    #[serde(default)]
    min_balance: Option<i32>,
    #[serde(default)]
    max_balance: Option<i32>,
    #[serde(default)]
    required_flags: Vec<String>,
    #[serde(default)]
    forbidden_flags: Vec<String>,
    #[serde(default)]
    conditions: Vec<String>,
    /// Single-expression shorthand, appended to `conditions`.
    #[serde(default)]
    condition: Option<String>,
}

impl RawAvailability {
    pub fn to_definition(&self) -> EventAvailability {
        let mut conditions = self.conditions.clone();
        conditions.extend(self.condition.iter().cloned());
        EventAvailability {
            region_states: region_states(self.region_states.as_ref()),
            region_ids: self.region_ids.clone(),
            min_pressure: self.min_pressure,
            max_pressure: self.max_pressure,
            min_balance: self.min_balance,
            max_balance: self.max_balance,
            required_flags: self.required_flags.clone(),
            forbidden_flags: self.forbidden_flags.clone(),
            conditions,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawChoice {
    id: String,
    #[serde(default, alias = "text")]
    label: LocalizedString,
    #[serde(default)]
    tooltip: Option<LocalizedString>,
    #[serde(default)]
    requirements: Option<ChoiceRequirements>,
    #[serde(default)]
    consequences: Option<RawConsequences>,
}

impl RawChoice {
    pub fn to_definition(&self) -> ChoiceDefinition {
        ChoiceDefinition {
            id: self.id.clone(),
            label: self.label.clone(),
            tooltip: self.tooltip.clone(),
            requirements: self.requirements.clone(),
            consequences: self
                .consequences
                .as_ref()
                .map(RawConsequences::to_definition)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConsequences {
    #[serde(default)]
    resource_changes: BTreeMap<String, i32>,
    #[serde(default)]
    set_flags: Vec<String>,
    #[serde(default)]
    clear_flags: Vec<String>,
    #[serde(default)]
    balance_delta: i32,
    #[serde(default)]
    tension_delta: i32,
    #[serde(default)]
    region_state_change: Option<RawRegionStateChange>,
    #[serde(default)]
    quest_progress: Option<RawQuestProgress>,
    #[serde(default)]
    result_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRegionStateChange {
    #[serde(default)]
    region_id: Option<String>,
    #[serde(alias = "state")]
    new_state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestProgress {
    quest_id: String,
    #[serde(default)]
    objective_id: Option<String>,
    #[serde(default)]
    action: Option<String>,
}

impl RawConsequences {
    pub fn to_definition(&self) -> ChoiceConsequences {
        ChoiceConsequences {
            resource_changes: self.resource_changes.clone(),
            set_flags: self.set_flags.clone(),
            clear_flags: self.clear_flags.clone(),
            balance_delta: self.balance_delta,
            tension_delta: self.tension_delta,
            region_state_change: self.region_state_change.as_ref().map(|change| RegionStateChange {
                region_id: change.region_id.clone(),
                new_state: RegionState::from_key(&change.new_state),
            }),
            quest_progress: self.quest_progress.as_ref().map(|progress| QuestProgressTrigger {
                quest_id: progress.quest_id.clone(),
                objective_id: progress.objective_id.clone(),
                action: progress
                    .action
                    .as_deref()
                    .map_or(QuestProgressAction::default(), QuestProgressAction::from_key),
            }),
            result_key: self.result_key.clone(),
        }
    }
}

impl RawEvent {
    /// A challenge without an explicit kind makes the event a combat mini-game.
    pub fn to_definition(&self) -> EventDefinition {
        let defaults = EventDefinition::default();
        let mini_game_challenge = self
            .mini_game_challenge
            .as_ref()
            .map(|challenge| challenge.to_definition(&self.id));
        let event_kind = match (&self.event_kind, &mini_game_challenge) {
            (Some(kind), _) => kind.to_kind(),
            (None, Some(challenge)) => EventKind::MiniGame(challenge.challenge_kind),
            (None, None) => EventKind::Inline,
        };
        EventDefinition {
            id: self.id.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            event_kind,
            pool_ids: self.pool_ids.clone(),
            availability: self
                .availability
                .as_ref()
                .map(RawAvailability::to_definition)
                .unwrap_or_default(),
            weight: self.weight.unwrap_or(defaults.weight),
            is_one_time: self.is_one_time.unwrap_or(false),
            is_instant: self.is_instant.unwrap_or(false),
            cooldown: self.cooldown.unwrap_or(0),
            choices: self.choices.iter().map(RawChoice::to_definition).collect(),
            mini_game_challenge,
        }
    }
}
