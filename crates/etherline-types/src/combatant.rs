//! Combatant state shared by the player side and each enemy unit.

use serde::{Deserialize, Serialize};

use crate::card::RuntimeCardInstance;
use crate::enums::EnemyMode;
use crate::enums::PlanOrigin;
use crate::ids::{CardId, EnemyId, EnemyUnitId};
use crate::token::TokenMap;

/// Maximum number of cards an enemy plan may draft for a single turn.
pub const MAX_PLAN_INTENTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerCombatant {
    pub hp: i32,
    pub max_hp: i32,
    pub block: u32,
    pub tokens: TokenMap,
    /// Added directly into the damage pipeline's stage-1 base, alongside
    /// (not instead of) whatever the `strength` token's stacks already
    /// contribute through `token_engine::attack_modifiers`.
    pub strength: i32,
    /// Reserved combatant stat; no system reads it yet.
    pub agility: i32,
    /// Gates how much of an enemy's drafted plan `view::snapshot` reveals,
    /// roughly -3..+3. Read by the host, not branched on by the engine.
    pub insight: i32,
}

impl PlayerCombatant {
    pub fn new(max_hp: i32) -> Self {
        Self { hp: max_hp, max_hp, block: 0, tokens: TokenMap::new(), strength: 0, agility: 0, insight: 0 }
    }

    pub fn is_defeated(&self) -> bool {
        self.hp <= 0
    }
}

/// The enemy planner's chosen cards for the upcoming turn, plus whether a
/// downstream effect has since edited the draft in place. `actions` are real
/// catalog cards drafted from the unit's `EnemyDef::deck`, the same shape the
/// scheduler places onto the shared timeline for the player's hand — an
/// enemy's attack is not a separate abstraction, it is a `RuntimeCardInstance`
/// like any other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyPlan {
    pub mode: EnemyMode,
    pub actions: Vec<RuntimeCardInstance>,
    /// One-line, insight-gated summary of the draft (e.g. "aggressive: 2
    /// attacks, 1 skill") shown to the player before the timeline resolves.
    pub hint: String,
    pub origin: PlanOrigin,
}

impl EnemyPlan {
    pub fn card_count(&self) -> usize {
        self.actions.len()
    }
}

/// Static catalog definition for one enemy unit template. An `EnemyId` in an
/// `EncounterSpec` may expand to several `EnemyUnit`s if `unit_count > 1`
/// (a "group" encounter entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyDef {
    pub id: EnemyId,
    pub name: String,
    pub max_hp: i32,
    pub unit_count: u8,
    pub preferred_mode: EnemyMode,
    /// Cards this unit's planner may draft from. Unlike the player's deck
    /// there is no draw/discard cycle — the same pool is available every
    /// turn, mode-weighted by `preferred_mode`.
    pub deck: Vec<CardId>,
    /// Cards drafted per turn, capped by `MAX_PLAN_INTENTS`.
    pub cards_per_turn: u8,
    /// Base combatant stats, copied onto every `EnemyUnit` spawned from this
    /// template. See `PlayerCombatant` for what each one does.
    #[serde(default)]
    pub strength: i32,
    #[serde(default)]
    pub agility: i32,
    #[serde(default)]
    pub insight: i32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyUnit {
    pub unit_id: EnemyUnitId,
    pub def_id: EnemyId,
    pub hp: i32,
    pub max_hp: i32,
    /// Mirrors `PlayerCombatant.block` — an enemy's drafted card can gain
    /// block exactly like a player card can, absorbed by the same damage
    /// pipeline. Cleared at end of turn.
    pub block: u32,
    pub tokens: TokenMap,
    pub plan: Option<EnemyPlan>,
    pub strength: i32,
    pub agility: i32,
    pub insight: i32,
}

impl EnemyUnit {
    pub fn new(unit_id: EnemyUnitId, def_id: EnemyId, max_hp: i32, strength: i32, agility: i32, insight: i32) -> Self {
        Self {
            unit_id,
            def_id,
            hp: max_hp,
            max_hp,
            block: 0,
            tokens: TokenMap::new(),
            plan: None,
            strength,
            agility,
            insight,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.hp <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CardUidGen;

    #[test]
    fn plan_card_count_matches_drafted_actions() {
        let mut gen = CardUidGen::default();
        let actions = vec![
            RuntimeCardInstance::new(CardId::from("grunt_slash"), gen.next()),
            RuntimeCardInstance::new(CardId::from("grunt_slash"), gen.next()),
        ];
        let plan = EnemyPlan {
            mode: EnemyMode::Aggressive,
            actions,
            hint: "aggressive: 2 attacks".into(),
            origin: PlanOrigin::Generated,
        };
        assert_eq!(plan.card_count(), 2);
    }

    #[test]
    fn fresh_units_start_at_max_hp_and_undefeated() {
        let unit = EnemyUnit::new(EnemyUnitId(0), EnemyId::from("grunt"), 20, 2, 0, -1);
        assert_eq!(unit.hp, unit.max_hp);
        assert!(!unit.is_defeated());
    }

    #[test]
    fn zero_hp_player_is_defeated() {
        let mut p = PlayerCombatant::new(30);
        p.hp = 0;
        assert!(p.is_defeated());
    }
}
