//! Host-facing configuration: what a caller provides to start a battle, and
//! the engine-wide tunables that would otherwise be scattered `const`s.
//!
//! There is no config-file format or env-var parsing here — nothing calls
//! for runtime-tunable constants, so `BattleConfig` stays a plain struct
//! with a `Default` impl rather than growing a loader.

use serde::{Deserialize, Serialize};

use crate::ids::{AnomalyId, CardId, EnemyId};

/// Describes one battle to set up: the player's starting deck and HP, the
/// enemy composition, and any anomaly bundle modifying the encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSpec {
    pub seed: u32,
    pub player_max_hp: i32,
    pub player_deck: Vec<CardId>,
    pub enemies: Vec<EnemyId>,
    #[serde(default)]
    pub anomalies: Vec<AnomalyId>,
    /// Starting player stats. Omit to start at 0, same as a fresh
    /// `PlayerCombatant`.
    #[serde(default)]
    pub player_strength: i32,
    #[serde(default)]
    pub player_agility: i32,
    #[serde(default)]
    pub player_insight: i32,
}

/// Engine-wide tunables, in lieu of scattered magic constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleConfig {
    /// Maximum cards a single planning submission may contain.
    pub max_submit_cards: u8,
    /// Maximum timeline slots available in one turn.
    pub max_slots: u32,
    /// Maximum summed `action_cost` a single submission may spend.
    pub max_energy: u32,
    /// Baseline critical-hit chance before token modifiers, in [0, 1].
    pub base_crit_chance: f64,
    /// Starting hand size drawn at the top of a turn.
    pub starting_hand_size: u8,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            max_submit_cards: 5,
            max_slots: 12,
            max_energy: 6,
            base_crit_chance: 0.05,
            starting_hand_size: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_bounds() {
        let cfg = BattleConfig::default();
        assert!(cfg.max_submit_cards > 0);
        assert!(cfg.max_slots > 0);
        assert!((0.0..=1.0).contains(&cfg.base_crit_chance));
    }
}
