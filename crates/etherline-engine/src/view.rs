//! Read-only projections of `BattleState` for a host to render, with enemy
//! intent detail gated behind an "insight" flag so a host can model
//! fog-of-war over enemy plans without the engine itself branching on it.

use etherline_types::{
    BattlePhase, CardId, EnemyMode, EnemyUnitId, PendingSelectionKind, PlayerCombatant, RuntimeCardInstance,
};
use serde::{Deserialize, Serialize};

use crate::battle::Battle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyUnitView {
    pub unit_id: EnemyUnitId,
    pub def_id: CardId,
    pub hp: i32,
    pub max_hp: i32,
    /// `Some` once `insight >= 1`; otherwise the host sees that an enemy has
    /// *a* plan without its specifics.
    pub revealed_intent: Option<EnemyMode>,
    /// `Some` once `insight >= 3` — the plan's full drafted hint string.
    pub revealed_hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub phase: BattlePhase,
    pub turn: u32,
    pub player: PlayerCombatant,
    pub hand: Vec<RuntimeCardInstance>,
    pub enemies: Vec<EnemyUnitView>,
    pub ether: u32,
    pub ether_slots: u32,
    pub pending_kind: Option<PendingSelectionKind>,
    pub rewind_available: bool,
}

/// Projects `battle`'s internal state into a `BattleSnapshot`. `insight`
/// gates how much of an enemy's drafted plan is revealed: below 1 the plan
/// stays entirely hidden, `>= 1` reveals the planned mode, and `>= 3` also
/// reveals the plan's hint string.
pub fn snapshot(battle: &Battle, insight: i32) -> BattleSnapshot {
    let state = battle.state();
    BattleSnapshot {
        phase: state.phase,
        turn: state.turn,
        player: state.player.clone(),
        hand: state.hand.clone(),
        enemies: state
            .enemies
            .iter()
            .map(|e| EnemyUnitView {
                unit_id: e.unit_id,
                def_id: etherline_types::CardId::from(e.def_id.as_str()),
                hp: e.hp,
                max_hp: e.max_hp,
                revealed_intent: if insight >= 1 { e.plan.as_ref().map(|p| p.mode) } else { None },
                revealed_hint: if insight >= 3 { e.plan.as_ref().map(|p| p.hint.clone()) } else { None },
            })
            .collect(),
        ether: state.ether,
        ether_slots: state.ether_slots,
        pending_kind: state.pending.active.as_ref().map(|p| p.kind),
        rewind_available: state.phase == BattlePhase::AwaitingResponse && !state.rewound_this_turn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::Battle;
    use etherline_types::EncounterSpec;

    fn battle() -> Battle {
        Battle::new(EncounterSpec {
            seed: 1,
            player_max_hp: 30,
            player_deck: vec![CardId::from("strike"), CardId::from("guard")],
            enemies: vec![etherline_types::EnemyId::from("grunt")],
            anomalies: vec![],
            player_strength: 0,
            player_agility: 0,
            player_insight: 0,
        })
        .unwrap()
    }

    #[test]
    fn insight_below_one_hides_enemy_intent() {
        let b = battle();
        let snap = snapshot(&b, 0);
        assert!(snap.enemies.iter().all(|e| e.revealed_intent.is_none()));
        assert!(snap.enemies.iter().all(|e| e.revealed_hint.is_none()));
    }

    #[test]
    fn insight_at_least_one_reveals_enemy_intent_once_planned() {
        let mut b = battle();
        b.debug_force_plan_all();
        let snap = snapshot(&b, 1);
        assert!(snap.enemies.iter().any(|e| e.revealed_intent.is_some()));
        assert!(snap.enemies.iter().all(|e| e.revealed_hint.is_none()));
    }

    #[test]
    fn insight_at_least_three_also_reveals_the_hint() {
        let mut b = battle();
        b.debug_force_plan_all();
        let snap = snapshot(&b, 3);
        assert!(snap.enemies.iter().any(|e| e.revealed_hint.is_some()));
    }
}
