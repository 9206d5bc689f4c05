//! Mini-game challenge authoring schema, embedded in events.

use serde::Deserialize;
use twilight_data::{LocalizedString, MiniGameChallengeDefinition, MiniGameKind};

use super::RawConsequences;

#[derive(Debug, Clone, Deserialize)]
pub struct RawChallenge {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, alias = "kind")]
    challenge_kind: Option<String>,
    #[serde(default)]
    difficulty: Option<i32>,
    #[serde(default)]
    enemy_id: Option<String>,
    #[serde(default)]
    title: LocalizedString,
    #[serde(default)]
    description: LocalizedString,
    #[serde(default, alias = "on_victory")]
    victory_consequences: Option<RawConsequences>,
    #[serde(default, alias = "on_defeat")]
    defeat_consequences: Option<RawConsequences>,
}

impl RawChallenge {
    /// An unnamed challenge takes its id from the owning event: `<event_id>_challenge`.
    pub fn to_definition(&self, event_id: &str) -> MiniGameChallengeDefinition {
        let defaults = MiniGameChallengeDefinition::default();
        let consequences =
            |raw: Option<&RawConsequences>| raw.map(RawConsequences::to_definition).unwrap_or_default();
        MiniGameChallengeDefinition {
            id: self
                .id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("{event_id}_challenge")),
            challenge_kind: self
                .challenge_kind
                .as_deref()
                .map_or(defaults.challenge_kind, MiniGameKind::from_key),
            difficulty: self.difficulty.unwrap_or(defaults.difficulty),
            enemy_id: self.enemy_id.clone().filter(|id| !id.is_empty()),
            title: self.title.clone(),
            description: self.description.clone(),
            victory_consequences: consequences(self.victory_consequences.as_ref()),
            defeat_consequences: consequences(self.defeat_consequences.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_fields_win() {
        let raw: RawChallenge = serde_json::from_str(
            r#"{
                "id": "duel",
                "challenge_kind": "PUZZLE",
                "difficulty": 8,
                "on_victory": {"set_flags": ["duel_won"]},
                "on_defeat": {"balance_delta": -2}
            }"#,
        )
        .expect("challenge");
        let challenge = raw.to_definition("ignored");
        assert_eq!(challenge.id, "duel");
        assert_eq!(challenge.challenge_kind, MiniGameKind::Puzzle);
        assert_eq!(challenge.difficulty, 8);
        assert_eq!(challenge.victory_consequences.set_flags, vec!["duel_won".to_string()]);
        assert_eq!(challenge.defeat_consequences.balance_delta, -2);
    }
}
