//! The root `BattleState` and the pending-selection queue.
//!
//! The pending-selection queue consolidates what used to be 20-odd scattered
//! `Option<...>` fields (one per kind of thing that could be "currently
//! waiting on the player to pick something") into a single FIFO queue of a
//! closed `PendingSelection` enum. A breach opened while a chain selection
//! is already active simply joins the back of the queue instead of racing
//! with it for a dedicated field.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::card::RuntimeCardInstance;
use crate::combatant::{EnemyUnit, PlayerCombatant};
use crate::enums::{Actor, BattlePhase};
use crate::ids::{CardId, CardUid, CardUidGen};
use crate::rng::RngState;

/// Upper bound on how many distinct selections can be queued at once
/// (chain → breach → creation-queue, nested at most this deep in practice).
pub const MAX_DEFERRED_SELECTIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingSelectionKind {
    /// A `Chain`-trait card just resolved and offers a follow-up pick.
    Chain,
    /// A `Breach`-special card opened the breach sub-phase.
    Breach,
    /// A `CreateFencingCards`-special card is inserting generated cards.
    CreationQueue,
    /// A `Fleche`-trait card just resolved and offers a follow-up pick,
    /// inserted ahead of its own slot instead of after it.
    Fleche,
}

/// One outstanding "the player must pick from these options" request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSelection {
    pub kind: PendingSelectionKind,
    /// The card instance that triggered this selection, if any (creation
    /// queue entries may be triggerless, e.g. a scripted encounter event).
    pub source_uid: Option<CardUid>,
    pub options: Vec<CardId>,
}

/// FIFO queue of outstanding selections. At most one is ever `active` (the
/// one currently presented to the player); the rest wait in `deferred` in
/// the order they were raised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingQueue {
    pub active: Option<PendingSelection>,
    pub deferred: ArrayVec<PendingSelection, MAX_DEFERRED_SELECTIONS>,
}

impl PendingQueue {
    pub fn is_empty(&self) -> bool {
        self.active.is_none() && self.deferred.is_empty()
    }

    /// Enqueues a new selection, promoting it to `active` if nothing is
    /// currently active, otherwise appending to the back of `deferred`.
    pub fn push(&mut self, selection: PendingSelection) {
        if self.active.is_none() {
            self.active = Some(selection);
        } else {
            // Deliberately drops the selection rather than panicking when
            // the queue is saturated; callers should treat this as a
            // catalog-authoring error, not a crash.
            let _ = self.deferred.try_push(selection);
        }
    }

    /// Resolves (clears) the current `active` selection and promotes the
    /// next deferred one, if any. Returns the selection that was active.
    pub fn resolve_active(&mut self) -> Option<PendingSelection> {
        let resolved = self.active.take();
        if !self.deferred.is_empty() {
            self.active = Some(self.deferred.remove(0));
        }
        resolved
    }
}

/// One card's position on the speed timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub uid: CardUid,
    pub def_id: CardId,
    /// Which side placed this card — a player submission or a drafted enemy
    /// unit action. The scheduler merges both sides into one slot-ordered
    /// queue; `actor` is how resolution tells which combatant's tokens and
    /// hp to read and which direction damage flows.
    pub actor: Actor,
    /// Slot index this card currently occupies (lower resolves first).
    pub slot: u32,
    /// Set once the resolution cursor has passed this slot.
    pub resolved: bool,
    /// The opposite-actor entry sharing this slot, if the scheduler found
    /// one when the queue was built. `Some` on both sides of a crossed pair,
    /// pointing at each other; cleared once the cross bonus has fired so a
    /// rewind-and-replay can't double-trigger it.
    pub crossed_with: Option<CardUid>,
    /// Transient preview copy (breach/creation/fleche-inserted); sorts
    /// before a non-ghost entry at the same slot and is excluded from combo
    /// detection.
    #[serde(default)]
    pub is_ghost: bool,
}

/// Tracks, per combo name, how many times this combat has already scored
/// that combo — the Ether Engine's deflation multiplier (`0.8^usage_count`)
/// is keyed on this single count, so nothing else in the engine needs its
/// own copy of a usage tally. Each actor (player, each enemy unit) carries
/// its own `ComboUsage` so one side's plays never dilute the other's
/// deflation curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboUsage {
    pub counts: std::collections::BTreeMap<crate::enums::ComboName, u32>,
}

impl ComboUsage {
    pub fn usage_count(&self, combo: crate::enums::ComboName) -> u32 {
        self.counts.get(&combo).copied().unwrap_or(0)
    }

    /// Records one more scoring of `combo`, returning the usage count that
    /// was in effect *before* this scoring (the count the deflation
    /// multiplier for this scoring should use).
    pub fn record(&mut self, combo: crate::enums::ComboName) -> u32 {
        let entry = self.counts.entry(combo).or_insert(0);
        let before = *entry;
        *entry += 1;
        before
    }
}

/// Tracks cumulative ether lost to the Ether Engine's deflation multiplier,
/// for event-log/host reporting. The multiplier itself is a pure function of
/// `ComboUsage` (see `ether::accumulate`); this struct only accumulates the
/// running total of what was lost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeflationState {
    pub total_deflated: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleState {
    pub phase: BattlePhase,
    pub turn: u32,
    pub rng: RngState,
    pub uid_gen: CardUidGen,

    pub player: PlayerCombatant,
    pub enemies: Vec<EnemyUnit>,

    pub hand: Vec<RuntimeCardInstance>,
    pub deck: Vec<RuntimeCardInstance>,
    pub discard: Vec<RuntimeCardInstance>,

    pub queue: Vec<TimelineEntry>,
    /// Index of the next queue entry the scheduler will cross.
    pub q_index: usize,
    /// Immutable copy of `queue` captured the moment resolution begins.
    /// Never mutated until the next `Planning` phase; the recovery source if
    /// `queue` is ever found empty while `phase == Resolving` with entries
    /// still unresolved.
    pub fixed_order: Vec<TimelineEntry>,

    pub pending: PendingQueue,
    /// Cards produced by a `CreateFencingCards`-style effect, awaiting
    /// insertion onto the timeline once their triggering selection resolves.
    pub creation_queue: Vec<RuntimeCardInstance>,

    /// A card explicitly recalled off the timeline this turn (at most one,
    /// matching the single-rewind-per-turn budget on undo-adjacent actions).
    pub recall_card: Option<RuntimeCardInstance>,

    /// One-shot snapshot for the turn's single allowed rewind. `Some` only
    /// while `phase == AwaitingResponse`.
    pub respond_snapshot: Option<Box<BattleState>>,
    pub rewound_this_turn: bool,

    pub ether: u32,
    pub ether_slots: u32,
    /// Keyed per actor so one side's combo plays never dilute the other's
    /// deflation curve (see `ComboUsage`).
    pub combo_usage: std::collections::BTreeMap<Actor, ComboUsage>,
    pub deflation: DeflationState,

    /// Ghost-card copies vanished after preview resolution, kept only for
    /// event-log attribution, never replayed.
    pub vanished_ghosts: Vec<CardUid>,
    /// Cross-timeline bonus activations triggered this turn (e.g. a card
    /// whose effect strengthens when it crosses another specific card).
    pub cross_bonus_activations: Vec<(CardUid, CardUid)>,
}

impl BattleState {
    /// The combo-usage ledger for `actor`, creating an empty one on first
    /// access so deflation starts at `0.8^0 = 1.0` the first time either
    /// side scores.
    pub fn combo_usage_for(&mut self, actor: Actor) -> &mut ComboUsage {
        self.combo_usage.entry(actor).or_default()
    }
}
