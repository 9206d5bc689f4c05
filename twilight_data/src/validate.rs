//! Cross-reference validation over a merged (or single-pack) content graph.
//!
//! Every problem is collected into a list with a severity; nothing here fails fast.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::defs::*;
use crate::expression::{ExpressionError, ExpressionValidator};
use crate::pack::ContentSet;

/// How much a validation entry matters to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// Problem found in a content graph. Collected, never thrown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentValidationError {
    /// `kind` `id` points at a `target_kind` that does not exist.
    BrokenReference {
        kind: &'static str,
        id: String,
        target_kind: &'static str,
        target: String,
        context: String,
    },
    /// The same id was defined more than once; `context` says where.
    DuplicateId {
        kind: &'static str,
        id: String,
        context: String,
    },
    MissingRequiredField {
        kind: &'static str,
        id: String,
        field: &'static str,
    },
    InvalidRange {
        kind: &'static str,
        id: String,
        context: String,
    },
    InvalidExpression {
        kind: &'static str,
        id: String,
        expression: String,
        error: ExpressionError,
    },
    /// Following `next_objective_id` from the first objective came back to `objective_id`.
    PossibleCycle { quest_id: String, objective_id: String },
}

impl ContentValidationError {
    /// Cross-pack overrides are informational, possible cycles are warnings, the rest are errors.
    pub fn severity(&self) -> Severity {
        match self {
            ContentValidationError::DuplicateId { .. } => Severity::Info,
            ContentValidationError::PossibleCycle { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    /// Kind of the definition the entry is about ("region", "quest", ...).
    pub fn kind(&self) -> &'static str {
        match self {
            ContentValidationError::BrokenReference { kind, .. }
            | ContentValidationError::DuplicateId { kind, .. }
            | ContentValidationError::MissingRequiredField { kind, .. }
            | ContentValidationError::InvalidRange { kind, .. }
            | ContentValidationError::InvalidExpression { kind, .. } => kind,
            ContentValidationError::PossibleCycle { .. } => "quest",
        }
    }

    /// Id of the offending definition.
    pub fn definition_id(&self) -> &str {
        match self {
            ContentValidationError::BrokenReference { id, .. }
            | ContentValidationError::DuplicateId { id, .. }
            | ContentValidationError::MissingRequiredField { id, .. }
            | ContentValidationError::InvalidRange { id, .. }
            | ContentValidationError::InvalidExpression { id, .. } => id,
            ContentValidationError::PossibleCycle { quest_id, .. } => quest_id,
        }
    }
}

impl fmt::Display for ContentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentValidationError::BrokenReference {
                kind,
                id,
                target_kind,
                target,
                context,
            } => {
                write!(f, "{kind} '{id}' references missing {target_kind} '{target}' ({context})")
            },
            ContentValidationError::DuplicateId { kind, id, context } => {
                write!(f, "duplicate {kind} id '{id}' ({context})")
            },
            ContentValidationError::MissingRequiredField { kind, id, field } => {
                write!(f, "{kind} '{id}' is missing required field '{field}'")
            },
            ContentValidationError::InvalidRange { kind, id, context } => {
                write!(f, "{kind} '{id}' has an invalid range ({context})")
            },
            ContentValidationError::InvalidExpression {
                kind,
                id,
                expression,
                error,
            } => {
                write!(f, "{kind} '{id}' has invalid expression '{expression}': {error}")
            },
            ContentValidationError::PossibleCycle { quest_id, objective_id } => {
                write!(f, "quest '{quest_id}' may loop back to objective '{objective_id}'")
            },
        }
    }
}

impl std::error::Error for ContentValidationError {}

/// Cross-reference, range and expression checks over a complete content graph.
///
/// Run this over merged content: a reference made by one pack may be satisfied by another.
///
/// ```
/// use std::collections::BTreeMap;
/// use twilight_data::{ContentSet, ExpressionValidator, RegionDefinition, validate_content};
///
/// let mut regions = BTreeMap::new();
/// regions.insert(
///     "village".to_string(),
///     RegionDefinition {
///         id: "village".into(),
///         title: "Village".into(),
///         neighbor_ids: vec!["forest".into()],
///         ..RegionDefinition::default()
///     },
/// );
/// let empty = twilight_data::PackContent::new(twilight_data::PackManifest::new(
///     "demo",
///     "Demo",
///     semver::Version::new(1, 0, 0),
/// ));
/// let set = ContentSet {
///     regions: &regions,
///     ..empty.content_set()
/// };
/// let errors = validate_content(&set, &ExpressionValidator::default());
/// assert_eq!(errors.len(), 1);
/// ```
pub fn validate_content(content: &ContentSet<'_>, expressions: &ExpressionValidator) -> Vec<ContentValidationError> {
    let mut errors = Vec::new();

    for region in content.regions.values() {
        require_text("region", &region.id, "title", &region.title, &mut errors);
        for neighbor in &region.neighbor_ids {
            check_ref(
                ("region", region.id.as_str()),
                "region",
                neighbor,
                content.regions,
                "neighbor_ids",
                &mut errors,
            );
        }
        if let Some(anchor) = &region.anchor_id {
            check_ref(("region", region.id.as_str()), "anchor", anchor, content.anchors, "anchor_id", &mut errors);
        }
        if region.degradation_weight < 0 {
            errors.push(ContentValidationError::InvalidRange {
                kind: "region",
                id: region.id.clone(),
                context: format!("degradation_weight {} is negative", region.degradation_weight),
            });
        }
    }

    for anchor in content.anchors.values() {
        require_text("anchor", &anchor.id, "title", &anchor.title, &mut errors);
        check_ref(
            ("anchor", anchor.id.as_str()),
            "region",
            &anchor.region_id,
            content.regions,
            "region_id",
            &mut errors,
        );
        if !(0..=100).contains(&anchor.max_integrity) || !(0..=anchor.max_integrity).contains(&anchor.initial_integrity)
        {
            errors.push(ContentValidationError::InvalidRange {
                kind: "anchor",
                id: anchor.id.clone(),
                context: format!(
                    "initial_integrity {} must lie in 0..={} and max_integrity in 0..=100",
                    anchor.initial_integrity, anchor.max_integrity
                ),
            });
        }
    }

    for event in content.events.values() {
        validate_event(event, content, expressions, &mut errors);
    }

    for quest in content.quests.values() {
        validate_quest(quest, content, &mut errors);
    }

    for hero in content.heroes.values() {
        require_text("hero", &hero.id, "name", &hero.name, &mut errors);
        for card in &hero.starting_deck_card_ids {
            check_ref(
                ("hero", hero.id.as_str()),
                "card",
                card,
                content.cards,
                "starting_deck_card_ids",
                &mut errors,
            );
        }
        for ability in &hero.ability_ids {
            check_ref(("hero", hero.id.as_str()), "ability", ability, content.abilities, "ability_ids", &mut errors);
        }
    }

    for card in content.cards.values() {
        for ability in &card.ability_ids {
            check_ref(("card", card.id.as_str()), "ability", ability, content.abilities, "ability_ids", &mut errors);
        }
    }

    for enemy in content.enemies.values() {
        for card in &enemy.loot_card_ids {
            check_ref(("enemy", enemy.id.as_str()), "card", card, content.cards, "loot_card_ids", &mut errors);
        }
        if let Some(behavior) = &enemy.behavior_id {
            check_ref(
                ("enemy", enemy.id.as_str()),
                "behavior",
                behavior,
                content.behaviors,
                "behavior_id",
                &mut errors,
            );
        }
        if enemy.health <= 0 {
            errors.push(ContentValidationError::InvalidRange {
                kind: "enemy",
                id: enemy.id.clone(),
                context: format!("health {} must be positive", enemy.health),
            });
        }
    }

    for behavior in content.behaviors.values() {
        for rule in &behavior.rules {
            check_expression(("behavior", behavior.id.as_str()), &rule.condition, expressions, &mut errors);
        }
    }

    errors
}

fn validate_event(
    event: &EventDefinition,
    content: &ContentSet<'_>,
    expressions: &ExpressionValidator,
    errors: &mut Vec<ContentValidationError>,
) {
    let owner = ("event", event.id.as_str());
    require_text("event", &event.id, "title", &event.title, errors);
    if event.choices.is_empty() {
        errors.push(ContentValidationError::MissingRequiredField {
            kind: "event",
            id: event.id.clone(),
            field: "choices",
        });
    }
    if event.weight < 0 {
        errors.push(ContentValidationError::InvalidRange {
            kind: "event",
            id: event.id.clone(),
            context: format!("weight {} is negative", event.weight),
        });
    }

    let availability = &event.availability;
    for region in availability.region_ids.iter().flatten() {
        check_ref(owner, "region", region, content.regions, "availability.region_ids", errors);
    }
    check_bounds(owner, "pressure", availability.min_pressure, availability.max_pressure, errors);
    check_bounds(owner, "balance", availability.min_balance, availability.max_balance, errors);
    for condition in &availability.conditions {
        check_expression(owner, condition, expressions, errors);
    }

    for choice in &event.choices {
        if let Some(requirements) = &choice.requirements {
            check_bounds(
                owner,
                "choice balance",
                requirements.min_balance,
                requirements.max_balance,
                errors,
            );
            for condition in &requirements.conditions {
                check_expression(owner, condition, expressions, errors);
            }
        }
        validate_consequences(owner, &choice.consequences, content, errors);
    }

    if let Some(challenge) = &event.mini_game_challenge {
        if let Some(enemy) = &challenge.enemy_id {
            check_ref(
                owner,
                "enemy",
                enemy,
                content.enemies,
                "mini_game_challenge.enemy_id",
                errors,
            );
        }
        validate_consequences(owner, &challenge.victory_consequences, content, errors);
        validate_consequences(owner, &challenge.defeat_consequences, content, errors);
    }
}

fn validate_consequences(
    owner: (&'static str, &str),
    consequences: &ChoiceConsequences,
    content: &ContentSet<'_>,
    errors: &mut Vec<ContentValidationError>,
) {
    if let Some(change) = &consequences.region_state_change
        && let Some(region) = &change.region_id
    {
        check_ref(owner, "region", region, content.regions, "region_state_change", errors);
    }
    if let Some(progress) = &consequences.quest_progress {
        check_ref(owner, "quest", &progress.quest_id, content.quests, "quest_progress", errors);
    }
}

fn validate_quest(quest: &QuestDefinition, content: &ContentSet<'_>, errors: &mut Vec<ContentValidationError>) {
    let owner = ("quest", quest.id.as_str());
    require_text("quest", &quest.id, "title", &quest.title, errors);
    if quest.objectives.is_empty() {
        errors.push(ContentValidationError::MissingRequiredField {
            kind: "quest",
            id: quest.id.clone(),
            field: "objectives",
        });
    }

    let objective_ids: HashSet<&str> = quest.objectives.iter().map(|o| o.id.as_str()).collect();
    for objective in &quest.objectives {
        let next_ids = objective.next_objective_id.iter().chain(&objective.alternative_next_ids);
        for next in next_ids {
            if !objective_ids.contains(next.as_str()) {
                errors.push(ContentValidationError::BrokenReference {
                    kind: "quest",
                    id: quest.id.clone(),
                    target_kind: "objective",
                    target: next.clone(),
                    context: format!("objective '{}'", objective.id),
                });
            }
        }
        if objective.target_value < 1 {
            errors.push(ContentValidationError::InvalidRange {
                kind: "quest",
                id: quest.id.clone(),
                context: format!("objective '{}' target_value {} < 1", objective.id, objective.target_value),
            });
        }
    }

    // Only the primary chain is walked; alternative branches may legitimately rejoin it.
    if let Some(first) = quest.first_objective() {
        let mut visited = HashSet::new();
        let mut current = first;
        visited.insert(current.id.as_str());
        while let Some(next) = &current.next_objective_id {
            if !visited.insert(next.as_str()) {
                errors.push(ContentValidationError::PossibleCycle {
                    quest_id: quest.id.clone(),
                    objective_id: next.clone(),
                });
                break;
            }
            let Some(objective) = quest.objective(next) else {
                break;
            };
            current = objective;
        }
    }

    for card in quest
        .completion_rewards
        .card_ids
        .iter()
        .chain(&quest.failure_penalties.card_ids)
    {
        check_ref(owner, "card", card, content.cards, "reward card_ids", errors);
    }
    check_bounds(
        owner,
        "pressure",
        quest.availability.min_pressure,
        quest.availability.max_pressure,
        errors,
    );
}

fn check_ref<T>(
    owner: (&'static str, &str),
    target_kind: &'static str,
    target: &str,
    defined: &BTreeMap<Id, T>,
    context: &str,
    errors: &mut Vec<ContentValidationError>,
) {
    if !defined.contains_key(target) {
        errors.push(ContentValidationError::BrokenReference {
            kind: owner.0,
            id: owner.1.to_string(),
            target_kind,
            target: target.to_string(),
            context: context.to_string(),
        });
    }
}

fn check_bounds(
    owner: (&'static str, &str),
    what: &str,
    min: Option<i32>,
    max: Option<i32>,
    errors: &mut Vec<ContentValidationError>,
) {
    if let (Some(min), Some(max)) = (min, max)
        && min > max
    {
        errors.push(ContentValidationError::InvalidRange {
            kind: owner.0,
            id: owner.1.to_string(),
            context: format!("min {what} {min} > max {what} {max}"),
        });
    }
}

fn check_expression(
    owner: (&'static str, &str),
    expression: &str,
    expressions: &ExpressionValidator,
    errors: &mut Vec<ContentValidationError>,
) {
    if let Err(error) = expressions.validate(expression) {
        errors.push(ContentValidationError::InvalidExpression {
            kind: owner.0,
            id: owner.1.to_string(),
            expression: expression.to_string(),
            error,
        });
    }
}

fn require_text(
    kind: &'static str,
    id: &str,
    field: &'static str,
    text: &LocalizedString,
    errors: &mut Vec<ContentValidationError>,
) {
    if text.is_blank() {
        errors.push(ContentValidationError::MissingRequiredField {
            kind,
            id: id.to_string(),
            field,
        });
    }
}

#[cfg(test)]
mod tests {
    use semver::Version;

    use super::*;
    use crate::manifest::PackManifest;
    use crate::pack::PackContent;

    fn region(id: &str, neighbors: &[&str]) -> RegionDefinition {
        RegionDefinition {
            id: id.to_string(),
            title: LocalizedString::new(format!("Region {id}")),
            neighbor_ids: neighbors.iter().map(|n| (*n).to_string()).collect(),
            ..RegionDefinition::default()
        }
    }

    fn objective(id: &str, next: Option<&str>) -> ObjectiveDefinition {
        ObjectiveDefinition {
            id: id.to_string(),
            next_objective_id: next.map(str::to_string),
            ..ObjectiveDefinition::default()
        }
    }

    fn quest(id: &str, objectives: Vec<ObjectiveDefinition>) -> QuestDefinition {
        QuestDefinition {
            id: id.to_string(),
            title: LocalizedString::new("Quest"),
            objectives,
            ..QuestDefinition::default()
        }
    }

    fn event(id: &str) -> EventDefinition {
        EventDefinition {
            id: id.to_string(),
            title: LocalizedString::new("Event"),
            choices: vec![ChoiceDefinition {
                id: "ok".into(),
                label: LocalizedString::new("Ok"),
                ..ChoiceDefinition::default()
            }],
            ..EventDefinition::default()
        }
    }

    fn base() -> PackContent {
        let mut content = PackContent::new(PackManifest::new("test-pack", "Test", Version::new(1, 0, 0)));
        content.regions.insert("village".into(), region("village", &["forest"]));
        content.regions.insert("forest".into(), region("forest", &["village"]));
        content
    }

    fn run(content: &PackContent) -> Vec<ContentValidationError> {
        validate_content(&content.content_set(), &ExpressionValidator::default())
    }

    #[test]
    fn clean_content_passes() {
        let mut content = base();
        content.events.insert("storm".into(), event("storm"));
        content
            .quests
            .insert("q".into(), quest("q", vec![objective("a", Some("b")), objective("b", None)]));
        assert!(run(&content).is_empty(), "{:?}", run(&content));
    }

    #[test]
    fn dangling_references_are_reported() {
        let mut content = base();
        content.regions.insert("ruins".into(), region("ruins", &["nowhere"]));
        content.anchors.insert(
            "shrine".into(),
            AnchorDefinition {
                id: "shrine".into(),
                title: LocalizedString::new("Shrine"),
                region_id: "atlantis".into(),
                ..AnchorDefinition::default()
            },
        );
        content.heroes.insert(
            "knight".into(),
            HeroDefinition {
                id: "knight".into(),
                name: LocalizedString::new("Knight"),
                starting_deck_card_ids: vec!["strike".into()],
                ..HeroDefinition::default()
            },
        );
        let mut gated = event("ambush");
        gated.availability.region_ids = Some(vec!["swamp".into()]);
        content.events.insert("ambush".into(), gated);

        let errors = run(&content);
        let broken: Vec<(&str, &str)> = errors
            .iter()
            .filter_map(|err| match err {
                ContentValidationError::BrokenReference { kind, target, .. } => Some((*kind, target.as_str())),
                _ => None,
            })
            .collect();
        assert!(broken.contains(&("region", "nowhere")));
        assert!(broken.contains(&("anchor", "atlantis")));
        assert!(broken.contains(&("hero", "strike")));
        assert!(broken.contains(&("event", "swamp")));
        assert!(errors.iter().all(ContentValidationError::is_error));
    }

    #[test]
    fn objective_chain_problems() {
        let mut content = base();
        content
            .quests
            .insert("lost".into(), quest("lost", vec![objective("a", Some("ghost"))]));
        content.quests.insert(
            "loop".into(),
            quest(
                "loop",
                vec![objective("a", Some("b")), objective("b", Some("c")), objective("c", Some("a"))],
            ),
        );

        let errors = run(&content);
        assert!(errors.iter().any(|err| matches!(
            err,
            ContentValidationError::BrokenReference { id, target, .. } if id == "lost" && target == "ghost"
        )));
        let cycle = errors
            .iter()
            .find(|err| matches!(err, ContentValidationError::PossibleCycle { .. }))
            .expect("cycle warning");
        assert_eq!(cycle.severity(), Severity::Warning);
        assert_eq!(cycle.definition_id(), "loop");
    }

    #[test]
    fn alternative_branches_are_not_walked_for_cycles() {
        let mut content = base();
        let mut start = objective("a", Some("b"));
        start.alternative_next_ids = vec!["a".into()];
        content
            .quests
            .insert("branch".into(), quest("branch", vec![start, objective("b", None)]));
        assert!(run(&content).is_empty());
    }

    #[test]
    fn bad_expressions_and_ranges() {
        let mut content = base();
        let mut storm = event("storm");
        storm.availability.conditions = vec!["WorldResonanse > 3".into()];
        storm.availability.min_pressure = Some(80);
        storm.availability.max_pressure = Some(20);
        content.events.insert("storm".into(), storm);
        let mut empty = event("empty");
        empty.choices.clear();
        content.events.insert("empty".into(), empty);

        let errors = run(&content);
        assert!(errors.iter().any(|err| matches!(
            err,
            ContentValidationError::InvalidExpression { error: ExpressionError::UnknownVariable(name), .. }
                if name == "WorldResonanse"
        )));
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ContentValidationError::InvalidRange { id, .. } if id == "storm"))
        );
        assert!(errors.iter().any(|err| matches!(
            err,
            ContentValidationError::MissingRequiredField { id, field: "choices", .. } if id == "empty"
        )));
    }
}
