//! Anchor authoring schema.

use serde::Deserialize;
use twilight_data::{AnchorDefinition, AnchorType, Influence, LocalizedString};

#[derive(Debug, Clone, Deserialize)]
pub struct RawAnchor {
    pub id: String,
    #[serde(default, alias = "name")]
    title: LocalizedString,
    #[serde(default)]
    description: LocalizedString,
    region_id: String,
    #[serde(default, alias = "type")]
    anchor_type: Option<String>,
    #[serde(default, alias = "influence")]
    initial_influence: Option<String>,
    #[serde(default)]
    power: Option<i32>,
    #[serde(default)]
    max_integrity: Option<i32>,
    #[serde(default)]
    initial_integrity: Option<i32>,
}

impl RawAnchor {
    /// Missing `initial_integrity` starts the anchor at full integrity.
    pub fn to_definition(&self) -> AnchorDefinition {
        let defaults = AnchorDefinition::default();
        let max_integrity = self.max_integrity.unwrap_or(defaults.max_integrity);
        AnchorDefinition {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            region_id: self.region_id.clone(),
            anchor_type: self
                .anchor_type
                .as_deref()
                .map_or(defaults.anchor_type, AnchorType::from_key),
            initial_influence: self
                .initial_influence
                .as_deref()
                .map_or(defaults.initial_influence, Influence::from_key),
            power: self.power.unwrap_or(defaults.power),
            max_integrity,
            initial_integrity: self.initial_integrity.unwrap_or(max_integrity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_defaults_follow_max() {
        let raw: RawAnchor = serde_json::from_str(
            r#"{"id": "old-oak", "title": "Old Oak", "region_id": "forest", "type": "Sacred_Tree", "max_integrity": 80}"#,
        )
        .expect("anchor");
        let anchor = raw.to_definition();
        assert_eq!(anchor.anchor_type, AnchorType::SacredTree);
        assert_eq!(anchor.max_integrity, 80);
        assert_eq!(anchor.initial_integrity, 80);
        assert_eq!(anchor.initial_influence, Influence::Neutral);
        assert_eq!(anchor.power, 5);
    }

    #[test]
    fn region_id_is_required() {
        assert!(serde_json::from_str::<RawAnchor>(r#"{"id": "a", "title": "A"}"#).is_err());
    }
}
