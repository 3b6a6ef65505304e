//! The command log: an append-only, ordered record of everything that
//! happened while resolving a turn. This is what a host replays to animate
//! or narrate a battle, and what `tools/etherline-sim` diffs to check that
//! two runs from the same seed produced byte-identical outcomes.

use serde::{Deserialize, Serialize};

use crate::enums::{BattlePhase, ComboName, DamageElement};
use crate::ids::{CardId, CardUid, EnemyUnitId, TokenId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    PhaseChanged { from: BattlePhase, to: BattlePhase },
    CardsSubmitted { uids: Vec<CardUid> },
    CardResolved { uid: CardUid, def_id: CardId },
    DamageDealt {
        source: DamageSource,
        target: DamageSource,
        amount: u32,
        element: DamageElement,
        blocked: u32,
        was_crit: bool,
    },
    AttackDodged { source: DamageSource, target: DamageSource },
    LifestealHealed { source: DamageSource, amount: u32 },
    ReflectFired { source: DamageSource, reflected_amount: u32 },
    BlockGained { target: DamageSource, amount: u32 },
    TokenApplied { target: DamageSource, token: TokenId, stacks: u32 },
    TokenRemoved { target: DamageSource, token: TokenId, stacks: u32 },
    ComboDetected { combo: ComboName, multiplier_bp: u32 },
    EtherGained { amount: u32, slots_after: u32 },
    EtherDeflated { amount_lost: u32 },
    BreachOpened,
    BreachResolved { chosen: CardId },
    EnemyPlanGenerated { unit: EnemyUnitId, drafted: Vec<CardId>, hint: String },
    EnemyPlanEdited { unit: EnemyUnitId },
    EnemyDefeated { unit: EnemyUnitId },
    PlayerDefeated,
    BattleWon,
    Rewound { to_turn: u32 },
    RecoverySettled { unit: EnemyUnitId, survived: bool },
    /// `queue` was found empty mid-resolve and rebuilt from `fixed_order`.
    QueueRecovered { rebuilt_len: usize },
    CrossFired { first: CardUid, second: CardUid },
    CounterFired { source: DamageSource, reflected_amount: u32 },
    /// A card reached its resolution point but its `required_tokens` gate
    /// failed against the caster's own tokens; its effects, special, and
    /// combo/chain/fleche follow-ups were all skipped.
    Fizzled { uid: CardUid, def_id: CardId },
    AnomalyDetected { context: String, detail: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "side", rename_all = "snake_case")]
pub enum DamageSource {
    Player,
    Enemy { unit: EnemyUnitId },
}
