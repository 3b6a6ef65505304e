//! Closed enumerations shared across the catalog and the engine.

use serde::{Deserialize, Serialize};

/// Whether a token is consumed at end of the turn it was applied in, persists
/// for a fixed number of turns, or lasts until explicitly removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenDuration {
    /// Cleared at end of the current turn.
    Turn,
    /// Cleared only by an explicit removal effect.
    Permanent,
    /// Consumed the first time it is read (e.g. a single counter charge).
    Usage,
}

/// Buff vs. debuff, for UI grouping and for effects that target "all
/// negative tokens" etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenCategory {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardCategory {
    Attack,
    Skill,
    Power,
    Status,
    Curse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Special,
}

/// Behavioral traits carried by a card definition. Distinct from the
/// per-instance `CardRuntimeFlags` on `RuntimeCardInstance`: a trait is a
/// property of the catalog entry, a flag is a property of one instance in
/// play (e.g. whether this particular `Ghost` copy has already fired).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardTrait {
    /// Removed from the deck for the rest of combat after being played.
    Outcast,
    /// Triggers a follow-up card selection when played.
    Chain,
    /// Resolves without occupying a timeline slot, then vanishes.
    Ghost,
    /// Inserted ahead of its own resolution point as a preview/feint.
    Fleche,
}

/// Special, non-generic resolution behavior a card definition may carry on
/// top of its ordinary effect list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpecialCardKind {
    /// Opens the breach selection sub-phase.
    Breach,
    /// Creates a fixed number of temporary fencing cards into the queue.
    CreateFencingCards { count: u8 },
    /// Summons a coordinated squad of follow-up strikes.
    ExecutionSquad { unit_count: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattlePhase {
    /// Player is choosing cards to place on the timeline.
    Planning,
    /// A chain/breach/sub-selection is pending and blocks further planning.
    PendingSelection,
    /// The timeline is being resolved card-by-card.
    Resolving,
    /// A single rewind window is open (one `respond_snapshot` available).
    AwaitingResponse,
    /// Turn has fully resolved; recovery/cleanup has run.
    TurnComplete,
    /// One side has been reduced to zero HP; no further commands accepted.
    BattleOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyMode {
    Aggressive,
    Defensive,
    Balanced,
}

/// Distinguishes an enemy plan the planner generated fresh from one the
/// planner generated and then a player-visible effect altered in place.
/// Replaces a plain "manually_modified" boolean: re-running the planner on
/// an `Edited` plan must not silently clobber the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanOrigin {
    Generated,
    Edited,
}

/// Poker-style combo rank over a hand's `action_cost` multiset, per the
/// ranking table (highest match wins). `Flush` here means "≥4 cards, all
/// sharing `attack` or all sharing `general`/`defense`" rather than a
/// matching-suit poker flush — there is no rank-adjacency "straight" in this
/// game's scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComboName {
    HighCard,
    Pair,
    TwoPair,
    Triple,
    Flush,
    FullHouse,
    FourOfAKind,
    FiveOfAKind,
}

impl ComboName {
    /// Ether multiplier awarded for this combo, per the ranking table.
    pub fn multiplier(self) -> f64 {
        match self {
            ComboName::HighCard => 1.0,
            ComboName::Pair => 2.0,
            ComboName::TwoPair => 2.5,
            ComboName::Triple => 3.0,
            ComboName::Flush => 3.5,
            ComboName::FullHouse => 3.75,
            ComboName::FourOfAKind => 4.0,
            ComboName::FiveOfAKind => 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageElement {
    Physical,
    Fire,
    Frost,
    Shock,
    Void,
}

/// Which side a queued timeline entry (or a combo/ether accrual) belongs to.
/// `Ord` so it can key a `BTreeMap` — player sorts before every enemy unit,
/// and enemy units sort by their unit id, giving a deterministic tiebreak
/// wherever two entries share a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "side", rename_all = "snake_case")]
pub enum Actor {
    Player,
    Enemy { unit: crate::ids::EnemyUnitId },
}

impl Actor {
    pub fn is_player(self) -> bool {
        matches!(self, Actor::Player)
    }

    /// The side a card belonging to this actor opposes — used to find a
    /// crossed-pair partner and a counter/reflect target.
    pub fn opponent_is(self, other: Actor) -> bool {
        self.is_player() != other.is_player()
    }
}

/// A bonus a card's effect unlocks only when it fires as part of a crossed
/// pair (two opposite-actor entries sharing one timeline slot). Fires at
/// most once per pair, per §4.5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CrossBonus {
    /// Multiplies this card's own damage effect by `factor`.
    DamageMultiplier { factor_bp: u32 },
    /// The next crit roll this card makes always succeeds.
    GuaranteedCrit,
    /// Grants `stacks` of `token` to the caster.
    AddTokenToCaster { token: crate::ids::TokenId, stacks: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::EnemyUnitId;

    #[test]
    fn player_actor_sorts_before_every_enemy_unit() {
        assert!(Actor::Player < Actor::Enemy { unit: EnemyUnitId(0) });
    }

    #[test]
    fn opponent_is_distinguishes_side_not_identity() {
        let player = Actor::Player;
        let enemy_a = Actor::Enemy { unit: EnemyUnitId(0) };
        let enemy_b = Actor::Enemy { unit: EnemyUnitId(1) };
        assert!(player.opponent_is(enemy_a));
        assert!(!enemy_a.opponent_is(enemy_b));
    }

    #[test]
    fn combo_multipliers_are_strictly_increasing_by_rank() {
        let order = [
            ComboName::HighCard,
            ComboName::Pair,
            ComboName::TwoPair,
            ComboName::Triple,
            ComboName::Flush,
            ComboName::FullHouse,
            ComboName::FourOfAKind,
            ComboName::FiveOfAKind,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].multiplier() < pair[1].multiplier());
        }
    }

    #[test]
    fn rarity_ordering_matches_catalog_intent() {
        assert!(Rarity::Common < Rarity::Uncommon);
        assert!(Rarity::Uncommon < Rarity::Rare);
        assert!(Rarity::Rare < Rarity::Special);
    }
}
