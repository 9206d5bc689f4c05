//! Read-only query surface for the world-simulation layer.
//!
//! Gameplay code depends on [`ContentProvider`] rather than on the registry so it can run
//! against hand-built content in tests.

use twilight_data::*;

use crate::merge::{MergedContent, merge_content};
use crate::registry::ContentRegistry;

pub trait ContentProvider {
    fn all_region_definitions(&self) -> Vec<&RegionDefinition>;
    fn region_definition(&self, id: &str) -> Option<&RegionDefinition>;

    fn all_event_definitions(&self) -> Vec<&EventDefinition>;
    fn event_definition(&self, id: &str) -> Option<&EventDefinition>;

    fn all_quest_definitions(&self) -> Vec<&QuestDefinition>;
    fn quest_definition(&self, id: &str) -> Option<&QuestDefinition>;

    fn all_anchor_definitions(&self) -> Vec<&AnchorDefinition>;
    fn anchor_definition(&self, id: &str) -> Option<&AnchorDefinition>;

    /// Validation entries for the content behind this provider.
    fn validate(&self) -> Vec<ContentValidationError>;

    /// Events that may fire in `region_id`: explicit region lists must name it, `None` admits all.
    fn event_definitions_for_region(&self, region_id: &str) -> Vec<&EventDefinition> {
        self.all_event_definitions()
            .into_iter()
            .filter(|event| {
                event
                    .availability
                    .region_ids
                    .as_ref()
                    .is_none_or(|ids| ids.iter().any(|id| id == region_id))
            })
            .collect()
    }

    fn event_definitions_for_pool(&self, pool_id: &str) -> Vec<&EventDefinition> {
        self.all_event_definitions()
            .into_iter()
            .filter(|event| event.pool_ids.iter().any(|pool| pool == pool_id))
            .collect()
    }

    fn anchor_for_region(&self, region_id: &str) -> Option<&AnchorDefinition> {
        self.all_anchor_definitions()
            .into_iter()
            .find(|anchor| anchor.region_id == region_id)
    }

    fn all_mini_game_challenges(&self) -> Vec<&MiniGameChallengeDefinition> {
        self.all_event_definitions()
            .into_iter()
            .filter_map(|event| event.mini_game_challenge.as_ref())
            .collect()
    }

    fn mini_game_challenge(&self, id: &str) -> Option<&MiniGameChallengeDefinition> {
        self.all_mini_game_challenges()
            .into_iter()
            .find(|challenge| challenge.id == id)
    }
}

impl ContentProvider for ContentRegistry {
    fn all_region_definitions(&self) -> Vec<&RegionDefinition> {
        self.all_regions()
    }

    fn region_definition(&self, id: &str) -> Option<&RegionDefinition> {
        self.region(id)
    }

    fn all_event_definitions(&self) -> Vec<&EventDefinition> {
        self.all_events()
    }

    fn event_definition(&self, id: &str) -> Option<&EventDefinition> {
        self.event(id)
    }

    fn all_quest_definitions(&self) -> Vec<&QuestDefinition> {
        self.all_quests()
    }

    fn quest_definition(&self, id: &str) -> Option<&QuestDefinition> {
        self.quest(id)
    }

    fn all_anchor_definitions(&self) -> Vec<&AnchorDefinition> {
        self.all_anchors()
    }

    fn anchor_definition(&self, id: &str) -> Option<&AnchorDefinition> {
        self.anchor(id)
    }

    fn validate(&self) -> Vec<ContentValidationError> {
        self.validate_all_content()
    }
}

/// Provider over content held directly in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContentProvider {
    content: MergedContent,
    expressions: ExpressionValidator,
}

impl InMemoryContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider seeded with everything in `pack`.
    pub fn from_pack(pack: &PackContent) -> Self {
        Self {
            content: merge_content(MergedContent::default(), pack),
            expressions: ExpressionValidator::default(),
        }
    }

    #[must_use]
    pub fn with_region(mut self, region: RegionDefinition) -> Self {
        self.content.regions.insert(region.id.clone(), region);
        self
    }

    #[must_use]
    pub fn with_event(mut self, event: EventDefinition) -> Self {
        self.content.events.insert(event.id.clone(), event);
        self
    }

    #[must_use]
    pub fn with_quest(mut self, quest: QuestDefinition) -> Self {
        self.content.quests.insert(quest.id.clone(), quest);
        self
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor: AnchorDefinition) -> Self {
        self.content.anchors.insert(anchor.id.clone(), anchor);
        self
    }
}

impl ContentProvider for InMemoryContentProvider {
    fn all_region_definitions(&self) -> Vec<&RegionDefinition> {
        self.content.regions.values().collect()
    }

    fn region_definition(&self, id: &str) -> Option<&RegionDefinition> {
        self.content.regions.get(id)
    }

    fn all_event_definitions(&self) -> Vec<&EventDefinition> {
        self.content.events.values().collect()
    }

    fn event_definition(&self, id: &str) -> Option<&EventDefinition> {
        self.content.events.get(id)
    }

    fn all_quest_definitions(&self) -> Vec<&QuestDefinition> {
        self.content.quests.values().collect()
    }

    fn quest_definition(&self, id: &str) -> Option<&QuestDefinition> {
        self.content.quests.get(id)
    }

    fn all_anchor_definitions(&self) -> Vec<&AnchorDefinition> {
        self.content.anchors.values().collect()
    }

    fn anchor_definition(&self, id: &str) -> Option<&AnchorDefinition> {
        self.content.anchors.get(id)
    }

    fn validate(&self) -> Vec<ContentValidationError> {
        validate_content(&self.content.content_set(), &self.expressions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: &str) -> RegionDefinition {
        RegionDefinition {
            id: id.to_string(),
            title: LocalizedString::new(id),
            ..RegionDefinition::default()
        }
    }

    fn event(id: &str, regions: Option<&[&str]>, pools: &[&str]) -> EventDefinition {
        let mut event = EventDefinition {
            id: id.to_string(),
            title: LocalizedString::new(id),
            pool_ids: pools.iter().map(|p| (*p).to_string()).collect(),
            choices: vec![ChoiceDefinition {
                id: "go".into(),
                label: LocalizedString::new("Go"),
                ..ChoiceDefinition::default()
            }],
            ..EventDefinition::default()
        };
        event.availability.region_ids = regions.map(|ids| ids.iter().map(|r| (*r).to_string()).collect());
        event
    }

    #[test]
    fn region_and_pool_filters() {
        let mut ambush = event("ambush", None, &["forest_pool"]);
        ambush.mini_game_challenge = Some(MiniGameChallengeDefinition {
            id: "ambush_fight".into(),
            ..MiniGameChallengeDefinition::default()
        });
        let provider = InMemoryContentProvider::new()
            .with_region(region("village"))
            .with_region(region("forest"))
            .with_event(event("market", Some(&["village"]), &["village_pool"]))
            .with_event(ambush);

        let village: Vec<&str> = provider
            .event_definitions_for_region("village")
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(village, vec!["ambush", "market"]);

        let forest: Vec<&str> = provider
            .event_definitions_for_region("forest")
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(forest, vec!["ambush"]);

        assert_eq!(provider.event_definitions_for_pool("village_pool").len(), 1);
        assert_eq!(
            provider.mini_game_challenge("ambush_fight").map(|c| c.id.as_str()),
            Some("ambush_fight")
        );
        assert!(provider.validate().is_empty());
    }

    #[test]
    fn anchor_lookup_by_region() {
        let provider = InMemoryContentProvider::new()
            .with_region(region("village"))
            .with_anchor(AnchorDefinition {
                id: "shrine".into(),
                title: LocalizedString::new("Shrine"),
                region_id: "village".into(),
                ..AnchorDefinition::default()
            });
        assert_eq!(
            provider.anchor_for_region("village").map(|a| a.id.as_str()),
            Some("shrine")
        );
        assert!(provider.anchor_for_region("forest").is_none());
    }
}
