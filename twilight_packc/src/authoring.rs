//! Authoring JSON schemas.
//!
//! Pack sources are hand-written, so the `Raw*` types here are deliberately loose: enum-like
//! strings are matched case-insensitively and fall back to a default instead of failing,
//! optional fields are filled in, and a few fields accept more than one shape. Each type
//! converts into its strict definition with `to_definition()`.
//!
//! Heroes, cards, enemies, fate cards, abilities, behaviors and the balance configuration are
//! authored directly in their definition shape.

pub mod anchor;
pub mod challenge;
pub mod event;
pub mod quest;
pub mod region;

pub use anchor::RawAnchor;
pub use challenge::RawChallenge;
pub use event::{RawAvailability, RawChoice, RawConsequences, RawEvent, RawEventKind};
pub use quest::{RawObjective, RawQuest, RawQuestAvailability, parse_completion_condition};
pub use region::RawRegion;

use twilight_data::RegionState;

/// Coerce an optional list of state keys; `None` stays a wildcard.
fn region_states(keys: Option<&Vec<String>>) -> Option<Vec<RegionState>> {
    keys.map(|keys| keys.iter().map(|key| RegionState::from_key(key)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_state_lists_keep_wildcards() {
        assert_eq!(region_states(None), None);
        let keys = vec!["Breach".to_string(), "nonsense".to_string()];
        assert_eq!(
            region_states(Some(&keys)),
            Some(vec![RegionState::Breach, RegionState::Stable])
        );
    }
}
