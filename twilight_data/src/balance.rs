//! Game-balance constants.
//!
//! A pack may ship a `BalanceConfiguration`; the registry keeps the one from the most
//! recently loaded pack that provided it. Every field has a default so a pack can author only
//! the values it cares about.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfiguration {
    pub resources: ResourceBalance,
    pub pressure: PressureBalance,
    pub combat: CombatBalance,
    pub time_costs: TimeCosts,
    pub anchor: AnchorBalance,
    pub end_conditions: EndConditions,
}

/// Player resource limits and starting values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceBalance {
    pub max_health: i32,
    pub starting_health: i32,
    pub max_faith: i32,
    pub starting_faith: i32,
    pub starting_supplies: i32,
    pub max_supplies: i32,
    pub starting_gold: i32,
    pub starting_balance: i32,
}

impl Default for ResourceBalance {
    fn default() -> Self {
        Self {
            max_health: 20,
            starting_health: 10,
            max_faith: 10,
            starting_faith: 3,
            starting_supplies: 5,
            max_supplies: 20,
            starting_gold: 0,
            starting_balance: 50,
        }
    }
}

/// World tension (pressure) escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureBalance {
    pub starting_pressure: i32,
    pub min_pressure: i32,
    pub max_pressure: i32,
    pub pressure_per_turn: i32,
    pub escalation_interval: i32,
    pub escalation_amount: i32,
    pub borderland_threshold: i32,
    pub breach_threshold: i32,
}

impl Default for PressureBalance {
    fn default() -> Self {
        Self {
            starting_pressure: 0,
            min_pressure: 0,
            max_pressure: 100,
            pressure_per_turn: 1,
            escalation_interval: 3,
            escalation_amount: 3,
            borderland_threshold: 30,
            breach_threshold: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatBalance {
    pub base_damage: i32,
    pub power_modifier: f64,
    pub defense_reduction: f64,
    pub min_dice_value: i32,
    pub max_dice_value: i32,
    pub critical_chance: f64,
    pub max_enemies_per_fight: i32,
    pub actions_per_turn: i32,
}

impl Default for CombatBalance {
    fn default() -> Self {
        Self {
            base_damage: 3,
            power_modifier: 1.0,
            defense_reduction: 0.5,
            min_dice_value: 1,
            max_dice_value: 6,
            critical_chance: 0.1,
            max_enemies_per_fight: 3,
            actions_per_turn: 3,
        }
    }
}

/// Day cost of each world action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeCosts {
    pub travel: i32,
    pub explore: i32,
    pub rest: i32,
    pub trade: i32,
    pub strengthen_anchor: i32,
    pub combat: i32,
}

impl Default for TimeCosts {
    fn default() -> Self {
        Self {
            travel: 1,
            explore: 1,
            rest: 1,
            trade: 0,
            strengthen_anchor: 1,
            combat: 0,
        }
    }
}

/// Integrity thresholds that move a region between stable, borderland and breach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorBalance {
    pub max_integrity: i32,
    pub strengthen_amount: i32,
    pub strengthen_cost_faith: i32,
    pub stable_threshold: i32,
    pub breach_threshold: i32,
    pub decay_per_turn: i32,
}

impl Default for AnchorBalance {
    fn default() -> Self {
        Self {
            max_integrity: 100,
            strengthen_amount: 15,
            strengthen_cost_faith: 1,
            stable_threshold: 70,
            breach_threshold: 30,
            decay_per_turn: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndConditions {
    pub death_health: i32,
    pub pressure_loss: i32,
    pub breach_loss_count: Option<i32>,
    pub victory_quests: Vec<String>,
    pub max_days: Option<i32>,
}

impl Default for EndConditions {
    fn default() -> Self {
        Self {
            death_health: 0,
            pressure_loss: 100,
            breach_loss_count: None,
            victory_quests: Vec::new(),
            max_days: None,
        }
    }
}
