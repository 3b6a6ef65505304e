//! Card catalog shape and the runtime instance of a card in play.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::enums::{CardCategory, CardTrait, CrossBonus, DamageElement, Rarity, SpecialCardKind};
use crate::ids::{CardId, CardUid, TokenId};
use crate::token::TokenMap;

/// A single effect a card applies when it resolves. Cards carry an ordered
/// list of these; the damage pipeline and token engine interpret them in
/// order, left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CardEffect {
    /// Deal `amount` hits of `element` damage to the current target.
    /// `crush_multiplier` divides the defender's effective block for this
    /// attack (1 = no change) while still consuming the full, unscaled
    /// block on the defender's side — a card with crush punches through
    /// more block than it spends.
    Damage {
        amount: u32,
        element: DamageElement,
        hits: u8,
        #[serde(default = "default_crush_multiplier")]
        crush_multiplier: u32,
    },
    /// Grant `amount` block to the caster.
    Block { amount: u32 },
    /// Apply `stacks` of `token` to `target`.
    ApplyToken { token: TokenId, stacks: u32, target: EffectTarget },
    /// Remove up to `stacks` of `token` from `target` (0 = remove all).
    RemoveToken { token: TokenId, stacks: u32, target: EffectTarget },
    /// Draw `count` cards from the player's deck into the hand.
    Draw { count: u8 },
    /// Gain `amount` ether immediately, outside the normal combo accrual.
    GainEther { amount: u32 },
    /// Open the breach sub-selection (see `SpecialCardKind::Breach`).
    OpenBreach,
    /// Destroys the next not-yet-resolved action from `target`'s drafted
    /// plan and marks it `PlanOrigin::Edited`, so the planner leaves the
    /// edit alone on the following turn instead of silently regenerating it.
    DisruptEnemyPlan { target: EffectTarget },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTarget {
    Caster,
    PrimaryEnemy,
    AllEnemies,
}

/// Flags describing runtime-only behavior of a specific card copy. This is
/// the single place `ghost`/`fleche`/`outcast`-used metadata lives, instead
/// of being smuggled onto ad hoc optional fields of the card object itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRuntimeFlags {
    /// Set once an `Outcast` card has been played; it is removed from the
    /// deck for the rest of combat rather than returned to the discard pile.
    pub outcast_spent: bool,
    /// Set for a `Ghost` copy created to preview a future resolution; such
    /// copies never occupy a persistent timeline slot.
    pub is_ghost: bool,
    /// Set for a `Fleche` copy inserted ahead of its own resolution point.
    pub is_fleche_preview: bool,
    /// Number of `Fleche` hops this specific copy is descended from; a
    /// fleche chain that re-triggers another fleche increments this rather
    /// than resetting, so runaway chains are detectable and cappable.
    pub fleche_chain_count: u32,
    /// The card instance whose resolution produced this one, if any
    /// (breach picks, creation-queue insertions, fleche previews). `None`
    /// for a card the player submitted directly from hand.
    pub created_by: Option<CardUid>,
}

/// Static catalog definition for one card. Looked up by `CardId`; never
/// mutated once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDef {
    pub id: CardId,
    pub name: String,
    pub category: CardCategory,
    pub rarity: Rarity,
    /// Timeline slots this card occupies when placed, before any modifier.
    pub base_speed_cost: u32,
    /// Energy spent from the turn's action budget to play this card. Scored
    /// by the combo detector independently of `base_speed_cost`, which only
    /// governs timeline placement.
    #[serde(default = "default_action_cost")]
    pub action_cost: u32,
    pub traits: ArrayVec<CardTrait, 4>,
    pub special: Option<SpecialCardKind>,
    pub effects: Vec<CardEffect>,
    /// Bonus this card unlocks when it fires as part of a crossed pair with
    /// an opposite-actor entry sharing its timeline slot (§4.5). Absent for
    /// most cards.
    #[serde(default)]
    pub cross_bonus: Option<CrossBonus>,
    /// Tokens the acting combatant must already hold, at or above the given
    /// stacks, for this card's effects to apply. Evaluated against the
    /// caster's own tokens the instant the card would otherwise resolve; a
    /// card that fails this check fizzles instead of applying anything.
    #[serde(default)]
    pub required_tokens: TokenMap,
    /// Enhancement tier, 0 (base) through 5. The catalog default a fresh
    /// `RuntimeCardInstance` starts at; no system yet scales an effect off
    /// it beyond carrying the value through.
    #[serde(default)]
    pub level: u8,
    #[serde(default)]
    pub description: String,
}

impl CardDef {
    pub fn has_trait(&self, t: CardTrait) -> bool {
        self.traits.contains(&t)
    }
}

fn default_action_cost() -> u32 {
    1
}

fn default_crush_multiplier() -> u32 {
    1
}

/// One card as it exists in a player's hand, queue, or discard — a
/// `CardId` reference into the catalog plus a unique runtime identity and
/// its instance-local flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeCardInstance {
    pub def_id: CardId,
    pub uid: CardUid,
    pub flags: CardRuntimeFlags,
    /// Copied from the catalog `CardDef` at construction; instance-local so
    /// a future enhancement effect can bump one drafted copy without
    /// touching the shared catalog definition.
    #[serde(default)]
    pub level: u8,
}

impl RuntimeCardInstance {
    pub fn new(def_id: CardId, uid: CardUid) -> Self {
        Self { def_id, uid, flags: CardRuntimeFlags::default(), level: 0 }
    }

    pub fn new_with_level(def_id: CardId, uid: CardUid, level: u8) -> Self {
        Self { def_id, uid, flags: CardRuntimeFlags::default(), level }
    }
}
