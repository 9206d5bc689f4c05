//! Quest authoring schema and completion-condition parsing.

use serde::Deserialize;
use serde_json::Value;
use twilight_data::{
    CompletionCondition, LocalizedString, ObjectiveDefinition, QuestAvailability, QuestDefinition, QuestKind,
    QuestRewards,
};

use super::region_states;

#[derive(Debug, Clone, Deserialize)]
pub struct RawQuest {
    pub id: String,
    #[serde(default, alias = "name")]
    title: LocalizedString,
    #[serde(default)]
    description: LocalizedString,
    #[serde(default, alias = "type")]
    quest_kind: Option<String>,
    #[serde(default)]
    auto_start: Option<bool>,
    #[serde(default)]
    availability: Option<RawQuestAvailability>,
    #[serde(default)]
    objectives: Vec<RawObjective>,
    #[serde(default, alias = "rewards")]
    completion_rewards: Option<QuestRewards>,
    #[serde(default, alias = "penalties")]
    failure_penalties: Option<QuestRewards>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuestAvailability {
    #[serde(default)]
    required_flags: Vec<String>,
    #[serde(default)]
    forbidden_flags: Vec<String>,
    #[serde(default)]
    min_pressure: Option<i32>,
    #[serde(default)]
    max_pressure: Option<i32>,
    #[serde(default)]
    region_states: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawObjective {
    id: String,
    #[serde(default)]
    description: LocalizedString,
    /// Kept as raw JSON: both the flat and the legacy `{type, ...}` encodings are accepted.
    #[serde(default)]
    completion_condition: Option<Value>,
    #[serde(default)]
    target_value: Option<i32>,
    #[serde(default)]
    next_objective_id: Option<String>,
    #[serde(default)]
    alternative_next_ids: Vec<String>,
    #[serde(default)]
    is_optional: Option<bool>,
}

impl RawQuest {
    pub fn to_definition(&self) -> QuestDefinition {
        let availability = self.availability.clone().unwrap_or_default();
        QuestDefinition {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            quest_kind: self
                .quest_kind
                .as_deref()
                .map_or(QuestKind::default(), QuestKind::from_key),
            auto_start: self.auto_start.unwrap_or(false),
            availability: QuestAvailability {
                region_states: region_states(availability.region_states.as_ref()),
                required_flags: availability.required_flags,
                forbidden_flags: availability.forbidden_flags,
                min_pressure: availability.min_pressure,
                max_pressure: availability.max_pressure,
            },
            objectives: self.objectives.iter().map(RawObjective::to_definition).collect(),
            completion_rewards: self.completion_rewards.clone().unwrap_or_default(),
            failure_penalties: self.failure_penalties.clone().unwrap_or_default(),
        }
    }
}

impl RawObjective {
    pub fn to_definition(&self) -> ObjectiveDefinition {
        let defaults = ObjectiveDefinition::default();
        ObjectiveDefinition {
            id: self.id.clone(),
            description: self.description.clone(),
            completion_condition: self
                .completion_condition
                .as_ref()
                .map(parse_completion_condition)
                .unwrap_or_default(),
            target_value: self.target_value.unwrap_or(defaults.target_value),
            next_objective_id: self.next_objective_id.clone().filter(|id| !id.is_empty()),
            alternative_next_ids: self.alternative_next_ids.clone(),
            is_optional: self.is_optional.unwrap_or(false),
        }
    }
}

/// Decode a completion condition.
///
/// The flat form names the condition by its single key (`{"flag_set": "gate_open"}`,
/// `{"choice_made": {"event_id": "e", "choice_id": "c"}}`) and is tried first. Next comes the
/// legacy tagged form (`{"type": "flag_set", "flag": "gate_open"}`). Anything else, including
/// the bare string `"manual"`, is [`CompletionCondition::Manual`].
pub fn parse_completion_condition(value: &Value) -> CompletionCondition {
    let Some(object) = value.as_object() else {
        return CompletionCondition::Manual;
    };
    flat_condition(object)
        .or_else(|| legacy_condition(object))
        .unwrap_or(CompletionCondition::Manual)
}

fn flat_condition(object: &serde_json::Map<String, Value>) -> Option<CompletionCondition> {
    let text = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| object.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    };

    if let Some(flag) = text(&["flag_set"]) {
        return Some(CompletionCondition::FlagSet { flag });
    }
    if let Some(region_id) = text(&["visit_region", "region_visited"]) {
        return Some(CompletionCondition::VisitRegion { region_id });
    }
    if let Some(event_id) = text(&["event_completed", "complete_event"]) {
        return Some(CompletionCondition::EventCompleted { event_id });
    }
    if let Some(enemy_id) = text(&["defeat_enemy", "enemy_defeated"]) {
        return Some(CompletionCondition::DefeatEnemy { enemy_id });
    }
    if let Some(item_id) = text(&["collect_item", "item_collected"]) {
        return Some(CompletionCondition::CollectItem { item_id });
    }
    if let Some(choice) = object.get("choice_made").and_then(Value::as_object) {
        let event_id = choice.get("event_id").and_then(Value::as_str)?;
        let choice_id = choice.get("choice_id").and_then(Value::as_str)?;
        return Some(CompletionCondition::ChoiceMade {
            event_id: event_id.to_string(),
            choice_id: choice_id.to_string(),
        });
    }
    if let Some(threshold) = object.get("resource_threshold").and_then(Value::as_object) {
        let resource = threshold.get("resource").and_then(Value::as_str)?;
        let min_value = threshold.get("min_value").and_then(Value::as_i64)?;
        return Some(CompletionCondition::ResourceThreshold {
            resource: resource.to_string(),
            min_value: i32::try_from(min_value).ok()?,
        });
    }
    object.contains_key("manual").then_some(CompletionCondition::Manual)
}

fn legacy_condition(object: &serde_json::Map<String, Value>) -> Option<CompletionCondition> {
    let tag = object.get("type").and_then(Value::as_str)?;
    let mut normalized = object.clone();
    normalized.insert(
        "type".to_string(),
        Value::String(tag.trim().to_ascii_lowercase().replace('-', "_")),
    );
    serde_json::from_value(Value::Object(normalized)).ok()
}
