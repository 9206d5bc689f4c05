//! Region authoring schema.

use serde::Deserialize;
use twilight_data::{LocalizedString, RegionDefinition, RegionState, RegionType};

#[derive(Debug, Clone, Deserialize)]
/// Region as written in `regions.json`.
pub struct RawRegion {
    pub id: String,
    #[serde(default, alias = "name")]
    title: LocalizedString,
    #[serde(default)]
    description: LocalizedString,
    #[serde(default, alias = "type")]
    region_type: Option<String>,
    #[serde(default, alias = "neighbors")]
    neighbor_ids: Vec<String>,
    #[serde(default)]
    initially_discovered: Option<bool>,
    #[serde(default)]
    anchor_id: Option<String>,
    #[serde(default)]
    event_pool_ids: Vec<String>,
    #[serde(default)]
    initial_state: Option<String>,
    #[serde(default)]
    degradation_weight: Option<i32>,
}

impl RawRegion {
    pub fn to_definition(&self) -> RegionDefinition {
        let defaults = RegionDefinition::default();
        RegionDefinition {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            region_type: self
                .region_type
                .as_deref()
                .map_or(defaults.region_type, RegionType::from_key),
            neighbor_ids: self.neighbor_ids.clone(),
            initially_discovered: self.initially_discovered.unwrap_or(false),
            anchor_id: self.anchor_id.clone().filter(|id| !id.is_empty()),
            event_pool_ids: self.event_pool_ids.clone(),
            initial_state: self
                .initial_state
                .as_deref()
                .map_or(defaults.initial_state, RegionState::from_key),
            degradation_weight: self.degradation_weight.unwrap_or(defaults.degradation_weight),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_region_is_coerced() {
        let raw: RawRegion = serde_json::from_str(
            r#"{
                "id": "village",
                "title": {"en": "Village", "ru": "Деревня"},
                "region_type": "FOREST",
                "neighbors": ["forest"],
                "anchor_id": "",
                "initial_state": "Borderland"
            }"#,
        )
        .expect("region");
        let region = raw.to_definition();
        assert_eq!(region.region_type, RegionType::Forest);
        assert_eq!(region.neighbor_ids, vec!["forest".to_string()]);
        assert_eq!(region.anchor_id, None);
        assert_eq!(region.initial_state, RegionState::Borderland);
        assert_eq!(region.degradation_weight, 1);
        assert_eq!(region.title.resolve("ru"), "Деревня");
    }

    #[test]
    fn unknown_keys_fall_back() {
        let raw: RawRegion =
            serde_json::from_str(r#"{"id": "x", "title": "X", "region_type": "lava", "initial_state": "molten"}"#)
                .expect("region");
        let region = raw.to_definition();
        assert_eq!(region.region_type, RegionType::Settlement);
        assert_eq!(region.initial_state, RegionState::Stable);
    }
}
