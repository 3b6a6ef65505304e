//! The battle state machine: owns a `BattleState`, a `CommandLog`, and the
//! catalog a battle was built against, and exposes the engine's public
//! operations as methods. Every method is a thin, typed wrapper around a
//! pure helper in `token_engine`/`damage_pipeline`/`combo`/`ether`/
//! `scheduler`/`enemy_planner` — this module's own job is sequencing those
//! helpers and writing to the command log, not computation.
//!
//! Resolution is actor-agnostic: a `TimelineEntry` carries an `Actor` (the
//! player or a specific enemy unit), and every effect-application helper
//! below takes that actor and resolves `Caster`/`PrimaryEnemy`/`AllEnemies`
//! relative to it. A card an enemy unit drafted and a card the player
//! submitted from hand run through the exact same `resolve_card` path —
//! there is no separate "enemy attacks player" code path to keep in sync.

use etherline_data::Catalog;
use etherline_types::{
    Actor, BattleConfig, BattlePhase, CardEffect, CardId, CardUid, CardUidGen, CrossBonus, DamageElement,
    DamageSource, EffectTarget, EncounterSpec, EnemyMode, EnemyUnit, Event, PendingQueue, PendingSelection,
    PendingSelectionKind, PlayerCombatant, RewindError, RuntimeCardInstance, SelectionError, SpecialCardKind,
    SubSelectError, TokenId, BattleState, CatalogError, PhaseError, TimelineEntry,
};
use tracing::{info, warn};

use crate::combo::{self, ComboFace};
use crate::command_log::CommandLog;
use crate::damage_pipeline;
use crate::enemy_planner;
use crate::ether;
use crate::scheduler;
use crate::token_engine;

/// The outcome of advancing the resolution cursor by one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    CardResolved(CardUid),
    AwaitingSelection(PendingSelectionKind),
    TurnComplete,
    BattleOver { player_won: bool },
}

pub struct Battle {
    state: BattleState,
    log: CommandLog,
    config: BattleConfig,
    catalog: Catalog,
    /// Combo faces accumulated from this turn's resolved player plays, fed
    /// to the combo detector once the queue is exhausted. Ether is a
    /// player-only resource, so only the player's plays are scored here —
    /// an enemy unit's drafted cards never accrue ether, win or lose.
    turn_faces: Vec<ComboFace>,
}

impl Battle {
    /// Sets up a fresh battle from `spec`: builds the player's deck and
    /// starting hand, instantiates enemy units (expanding any multi-unit
    /// enemy group) with an initial drafted plan each, applies anomaly
    /// effects, and leaves the battle in `BattlePhase::Planning`.
    pub fn new(spec: EncounterSpec) -> Result<Self, CatalogError> {
        let catalog = Catalog::default();
        catalog.validate()?;

        let mut uid_gen = CardUidGen::default();
        let mut deck: Vec<RuntimeCardInstance> = spec
            .player_deck
            .iter()
            .map(|id| {
                let level = catalog.get_card(id).map(|def| def.level).unwrap_or(0);
                RuntimeCardInstance::new_with_level(id.clone(), uid_gen.next(), level)
            })
            .collect();

        let config = BattleConfig::default();
        let mut rng = etherline_types::RngState::new(spec.seed);

        let mut hand = Vec::new();
        for _ in 0..config.starting_hand_size.min(deck.len() as u8) {
            let idx = rng.pick_index(deck.len());
            hand.push(deck.remove(idx));
        }

        let mut enemies = Vec::new();
        let mut unit_seq = 0u32;
        for enemy_id in &spec.enemies {
            let Some(def) = etherline_data::get_enemy(enemy_id) else {
                return Err(CatalogError::UnknownReference { from: "encounter_spec".into(), to: enemy_id.to_string() });
            };
            for _ in 0..def.unit_count.max(1) {
                let mut unit = EnemyUnit::new(
                    etherline_types::EnemyUnitId(unit_seq),
                    def.id.clone(),
                    def.max_hp,
                    def.strength,
                    def.agility,
                    def.insight,
                );
                unit_seq += 1;
                enemy_planner::plan_for_turn(
                    &mut rng,
                    &mut uid_gen,
                    &catalog,
                    &mut unit,
                    def.preferred_mode,
                    &def.deck,
                    def.cards_per_turn,
                );
                enemies.push(unit);
            }
        }

        let mut player = PlayerCombatant::new(spec.player_max_hp);
        player.strength = spec.player_strength;
        player.agility = spec.player_agility;
        player.insight = spec.player_insight;
        let mut ether_slots = ether::slots_for(0);
        let mut starting_hand_size = config.starting_hand_size;

        for anomaly_id in &spec.anomalies {
            let Some(def) = catalog.get_anomaly(anomaly_id) else {
                return Err(CatalogError::UnknownReference { from: "encounter_spec".into(), to: anomaly_id.to_string() });
            };
            for effect in &def.effects {
                match effect {
                    etherline_types::AnomalyEffect::GrantTokenToPlayer { token, stacks } => {
                        token_engine::apply_token(&mut player.tokens, token, *stacks);
                    }
                    etherline_types::AnomalyEffect::GrantTokenToEnemies { token, stacks } => {
                        for unit in &mut enemies {
                            token_engine::apply_token(&mut unit.tokens, token, *stacks);
                        }
                    }
                    etherline_types::AnomalyEffect::ShiftEtherSlots { delta } => {
                        ether_slots = (ether_slots as i32 + delta).max(0) as u32;
                    }
                    etherline_types::AnomalyEffect::ShiftStartingHandSize { delta } => {
                        starting_hand_size = (starting_hand_size as i8 + delta).max(0) as u8;
                    }
                }
            }
        }

        let state = BattleState {
            phase: BattlePhase::Planning,
            turn: 1,
            rng,
            uid_gen,
            player,
            enemies,
            hand,
            deck,
            discard: Vec::new(),
            queue: Vec::new(),
            q_index: 0,
            fixed_order: Vec::new(),
            pending: PendingQueue::default(),
            creation_queue: Vec::new(),
            recall_card: None,
            respond_snapshot: None,
            rewound_this_turn: false,
            ether: 0,
            ether_slots,
            combo_usage: Default::default(),
            deflation: Default::default(),
            vanished_ghosts: Vec::new(),
            cross_bonus_activations: Vec::new(),
        };

        let mut log = CommandLog::default();
        log.append(Event::PhaseChanged { from: BattlePhase::Planning, to: BattlePhase::Planning });
        for unit in &state.enemies {
            if let Some(plan) = &unit.plan {
                log.append(Event::EnemyPlanGenerated {
                    unit: unit.unit_id,
                    drafted: plan.actions.iter().map(|a| a.def_id.clone()).collect(),
                    hint: plan.hint.clone(),
                });
            }
        }
        info!(turn = state.turn, "battle initialized");

        let _ = starting_hand_size; // reserved for a future re-draw-size hook; hand size is fixed at setup today.

        Ok(Self { state, log, config, catalog, turn_faces: Vec::new() })
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Submits a set of hand cards to the timeline, merges in every living
    /// enemy unit's already-drafted plan, and snapshots the pre-resolution
    /// state for this turn's single allowed rewind.
    pub fn submit_selection(&mut self, uids: Vec<CardUid>) -> Result<(), SelectionError> {
        if !matches!(self.state.phase, BattlePhase::Planning) {
            return Err(SelectionError::WrongPhaseForSelection);
        }
        if uids.len() > self.config.max_submit_cards as usize {
            return Err(SelectionError::TooManyCardsSubmitted { max: self.config.max_submit_cards, attempted: uids.len() as u8 });
        }

        let mut chosen = Vec::with_capacity(uids.len());
        for uid in &uids {
            let pos = self.state.hand.iter().position(|c| &c.uid == uid).ok_or(SelectionError::CardNotInHand(*uid))?;
            chosen.push(self.state.hand.remove(pos));
        }

        let enemy_actions: Vec<(Actor, Vec<RuntimeCardInstance>)> = self
            .state
            .enemies
            .iter()
            .filter(|e| !e.is_defeated())
            .map(|e| (Actor::Enemy { unit: e.unit_id }, e.plan.as_ref().map(|p| p.actions.clone()).unwrap_or_default()))
            .collect();

        let mut sides: Vec<(Actor, &[RuntimeCardInstance])> = vec![(Actor::Player, chosen.as_slice())];
        for (actor, actions) in &enemy_actions {
            sides.push((*actor, actions.as_slice()));
        }

        self.state.queue = scheduler::build_queue(&sides);
        self.state.q_index = 0;
        self.state.fixed_order = self.state.queue.clone();
        self.turn_faces.clear();

        // One-shot rewind snapshot, taken before any effect resolves.
        let mut snapshot_source = self.state.clone();
        snapshot_source.respond_snapshot = None;
        self.state.respond_snapshot = Some(Box::new(snapshot_source));
        self.state.rewound_this_turn = false;

        // Parked in `AwaitingResponse` rather than `Resolving` directly: the
        // turn's rewind snapshot is only meaningful while nothing has
        // resolved yet, so a host gets one beat to call `rewind` before
        // `begin_resolve` commits the queue.
        self.transition_phase(BattlePhase::AwaitingResponse);
        self.log.append(Event::CardsSubmitted { uids });

        // Submitted cards move to discard; their identity stays resolvable
        // from `queue`/`discard` for post-resolution bookkeeping such as
        // outcast removal.
        for card in chosen {
            self.state.discard.push(card);
        }

        Ok(())
    }

    /// Transitions into `Resolving` from either `AwaitingResponse` (the
    /// normal post-submit handoff, once the host is done giving the player a
    /// chance to `rewind`) or from `PendingSelection` once a sub-selection
    /// just finished and the queue still has unresolved entries; otherwise a
    /// no-op if already `Resolving`. Exposed so a host can explicitly resume
    /// resolution after answering a selection or declining to rewind.
    pub fn begin_resolve(&mut self) -> Result<(), PhaseError> {
        if matches!(self.state.phase, BattlePhase::AwaitingResponse) {
            self.transition_phase(BattlePhase::Resolving);
            Ok(())
        } else if self.state.pending.is_empty() && matches!(self.state.phase, BattlePhase::PendingSelection) {
            self.transition_phase(BattlePhase::Resolving);
            Ok(())
        } else if matches!(self.state.phase, BattlePhase::Resolving) {
            Ok(())
        } else {
            Err(PhaseError::UnexpectedPhase { expected: "resolving", actual: phase_name(self.state.phase) })
        }
    }

    /// Advances the resolution cursor by one timeline entry, applying that
    /// card's effects and opening any sub-selection it triggers.
    pub fn step_once(&mut self) -> Result<StepOutcome, PhaseError> {
        if matches!(self.state.phase, BattlePhase::BattleOver) {
            return Err(PhaseError::BattleAlreadyOver);
        }
        if !matches!(self.state.phase, BattlePhase::Resolving) {
            return Err(PhaseError::UnexpectedPhase { expected: "resolving", actual: phase_name(self.state.phase) });
        }

        if scheduler::recover_if_needed(&mut self.state.queue, &mut self.state.q_index, &self.state.fixed_order) {
            self.log.append(Event::QueueRecovered { rebuilt_len: self.state.queue.len() });
        }

        let Some(uid) = scheduler::step_once(&mut self.state.queue, &mut self.state.q_index) else {
            return Ok(self.settle_turn_resolution());
        };

        let Some(entry) = self.state.queue.iter().find(|e| e.uid == uid).cloned() else {
            warn!(uid = uid.0, "resolved uid missing from queue — treating as a no-op");
            return Ok(StepOutcome::CardResolved(uid));
        };

        self.resolve_card(&entry);

        if let Some(outcome) = self.check_battle_over() {
            return Ok(outcome);
        }

        if let Some(active) = &self.state.pending.active {
            let kind = active.kind;
            self.transition_phase(BattlePhase::PendingSelection);
            return Ok(StepOutcome::AwaitingSelection(kind));
        }

        Ok(StepOutcome::CardResolved(uid))
    }

    fn resolve_card(&mut self, entry: &TimelineEntry) {
        let Some(def) = self.catalog.get_card(&entry.def_id).cloned() else {
            self.log.append(Event::AnomalyDetected {
                context: "resolve_card".into(),
                detail: format!("unknown card id {}", entry.def_id),
            });
            return;
        };

        self.log.append(Event::CardResolved { uid: entry.uid, def_id: def.id.clone() });

        // Ghost entries never land in `discard` (they are previews, not
        // persistent cards); neither do drafted enemy actions, which have no
        // discard pile at all. Combo eligibility is read straight off the
        // queue entry rather than a stored `RuntimeCardInstance`.
        let mut flags = self
            .state
            .discard
            .iter()
            .find(|c| c.uid == entry.uid)
            .map(|c| c.flags)
            .unwrap_or_default();
        flags.is_ghost |= entry.is_ghost;
        if entry.is_ghost {
            self.state.vanished_ghosts.push(entry.uid);
        }

        if !self.meets_required_tokens(entry.actor, &def) {
            self.log.append(Event::Fizzled { uid: entry.uid, def_id: def.id.clone() });
            return;
        }

        // A card's cross bonus fires at most once, the instant it resolves
        // as one half of a crossed pair — the queue only ever visits each
        // entry once, so no additional one-shot guard is needed here.
        let mut cross_bonus = None;
        if let Some(partner) = entry.crossed_with {
            if let Some(bonus) = &def.cross_bonus {
                cross_bonus = Some(bonus.clone());
                self.state.cross_bonus_activations.push((entry.uid, partner));
                self.log.append(Event::CrossFired { first: entry.uid, second: partner });
                if let CrossBonus::AddTokenToCaster { token, stacks } = bonus {
                    self.apply_token_to_actor(entry.actor, token, *stacks);
                }
            }
        }

        for effect in &def.effects {
            self.apply_effect(entry.actor, effect, cross_bonus.as_ref());
        }

        if let Some(special) = &def.special {
            self.apply_special(entry.actor, special, entry.uid);
        }

        if entry.actor.is_player() && combo::counts_for_combo(flags, def.traits.as_slice()) {
            self.turn_faces.push(ComboFace { suit: def.category, action_cost: def.action_cost, points: combo::points_for_card(&def) });
        }

        // Chain follow-up selections are a player-facing prompt; an enemy's
        // drafted card carrying the trait simply has no follow-up offered.
        if entry.actor.is_player() && def.has_trait(etherline_types::CardTrait::Chain) {
            self.state.pending.push(PendingSelection {
                kind: PendingSelectionKind::Chain,
                source_uid: Some(entry.uid),
                options: self.catalog_sample(3),
            });
        }

        // A `Fleche`-trait card offers a follow-up identically to `Chain`,
        // except the pick it produces is inserted ahead of its own slot
        // rather than after it — see `resolve_breach`'s `Fleche` arm.
        if entry.actor.is_player() && def.has_trait(etherline_types::CardTrait::Fleche) {
            self.state.pending.push(PendingSelection {
                kind: PendingSelectionKind::Fleche,
                source_uid: Some(entry.uid),
                options: self.catalog_sample(3),
            });
        }
    }

    /// True if `actor`'s own tokens meet every stack threshold in
    /// `def.required_tokens`. A card with no required tokens always passes.
    fn meets_required_tokens(&self, actor: Actor, def: &etherline_types::CardDef) -> bool {
        if def.required_tokens.is_empty() {
            return true;
        }
        let tokens = self.tokens_of(actor);
        def.required_tokens.iter().all(|(token, stacks)| etherline_types::get_stacks(&tokens, token) >= *stacks)
    }

    fn apply_effect(&mut self, actor: Actor, effect: &CardEffect, cross_bonus: Option<&CrossBonus>) {
        match effect {
            CardEffect::Damage { amount, element, hits, crush_multiplier } => {
                self.resolve_attack(actor, *amount, *element, *hits, *crush_multiplier, cross_bonus);
            }
            CardEffect::Block { amount } => {
                self.add_block(actor, *amount);
                self.log.append(Event::BlockGained { target: damage_source_of(actor), amount: *amount });
            }
            CardEffect::ApplyToken { token, stacks, target } => {
                for t in self.resolve_target_actors(actor, *target) {
                    self.apply_token_to_actor(t, token, *stacks);
                }
            }
            CardEffect::RemoveToken { token, stacks, target } => {
                for t in self.resolve_target_actors(actor, *target) {
                    self.remove_token_from_actor(t, token, *stacks);
                }
            }
            CardEffect::Draw { count } => {
                // Enemy units draw from no deck of their own — a drafted
                // card with this effect is a no-op off the player's side.
                if actor.is_player() {
                    for _ in 0..*count {
                        if let Some(card) = self.state.deck.pop() {
                            self.state.hand.push(card);
                        }
                    }
                }
            }
            CardEffect::GainEther { amount } => {
                // Ether is a player-only resource; an enemy-drafted card
                // carrying this effect grants nothing.
                if actor.is_player() {
                    self.state.ether += amount;
                    self.state.ether_slots = ether::slots_for(self.state.ether);
                    self.log.append(Event::EtherGained { amount: *amount, slots_after: self.state.ether_slots });
                }
            }
            CardEffect::OpenBreach => {
                if actor.is_player() {
                    self.state.pending.push(PendingSelection {
                        kind: PendingSelectionKind::Breach,
                        source_uid: None,
                        options: self.catalog_sample(3),
                    });
                    self.log.append(Event::BreachOpened);
                }
            }
            CardEffect::DisruptEnemyPlan { target } => {
                for t in self.resolve_target_actors(actor, *target) {
                    if let Actor::Enemy { unit } = t {
                        self.disrupt_enemy_plan(unit);
                    }
                }
            }
        }
    }

    /// Destroys the next not-yet-resolved action from `unit`'s drafted plan,
    /// if any, and marks the plan `PlanOrigin::Edited` so `plan_for_turn`
    /// leaves it alone rather than silently regenerating it next turn.
    fn disrupt_enemy_plan(&mut self, unit: etherline_types::EnemyUnitId) {
        let Some(idx) = self.enemy_idx(unit) else { return };
        let had_action = self.state.enemies[idx].plan.as_mut().is_some_and(|plan| {
            if plan.actions.is_empty() {
                false
            } else {
                plan.actions.remove(0);
                true
            }
        });
        enemy_planner::mark_edited(&mut self.state.enemies[idx]);
        if had_action {
            self.log.append(Event::EnemyPlanEdited { unit });
        }
    }

    /// Resolves `EffectTarget` relative to the actor currently resolving a
    /// card: `PrimaryEnemy`/`AllEnemies` mean "the opposing side(s)", which
    /// for the player is the enemy roster and for an enemy unit is simply
    /// the player.
    fn resolve_target_actors(&self, actor: Actor, target: EffectTarget) -> Vec<Actor> {
        match target {
            EffectTarget::Caster => vec![actor],
            EffectTarget::PrimaryEnemy => self.primary_opponent(actor).into_iter().collect(),
            EffectTarget::AllEnemies => self.all_opponents(actor),
        }
    }

    fn primary_opponent(&self, actor: Actor) -> Option<Actor> {
        match actor {
            Actor::Player => self.state.enemies.iter().find(|e| !e.is_defeated()).map(|e| Actor::Enemy { unit: e.unit_id }),
            Actor::Enemy { .. } => (!self.state.player.is_defeated()).then_some(Actor::Player),
        }
    }

    fn all_opponents(&self, actor: Actor) -> Vec<Actor> {
        match actor {
            Actor::Player => self.state.enemies.iter().filter(|e| !e.is_defeated()).map(|e| Actor::Enemy { unit: e.unit_id }).collect(),
            Actor::Enemy { .. } => {
                if self.state.player.is_defeated() {
                    Vec::new()
                } else {
                    vec![Actor::Player]
                }
            }
        }
    }

    fn enemy_idx(&self, unit: etherline_types::EnemyUnitId) -> Option<usize> {
        self.state.enemies.iter().position(|e| e.unit_id == unit)
    }

    fn tokens_of(&self, actor: Actor) -> etherline_types::TokenMap {
        match actor {
            Actor::Player => self.state.player.tokens.clone(),
            Actor::Enemy { unit } => self.enemy_idx(unit).map(|i| self.state.enemies[i].tokens.clone()).unwrap_or_default(),
        }
    }

    fn strength_of(&self, actor: Actor) -> i32 {
        match actor {
            Actor::Player => self.state.player.strength,
            Actor::Enemy { unit } => self.enemy_idx(unit).map(|i| self.state.enemies[i].strength).unwrap_or(0),
        }
    }

    fn block_of(&self, actor: Actor) -> u32 {
        match actor {
            Actor::Player => self.state.player.block,
            Actor::Enemy { unit } => self.enemy_idx(unit).map(|i| self.state.enemies[i].block).unwrap_or(0),
        }
    }

    fn set_block(&mut self, actor: Actor, value: u32) {
        match actor {
            Actor::Player => self.state.player.block = value,
            Actor::Enemy { unit } => {
                if let Some(i) = self.enemy_idx(unit) {
                    self.state.enemies[i].block = value;
                }
            }
        }
    }

    fn add_block(&mut self, actor: Actor, amount: u32) {
        let current = self.block_of(actor);
        self.set_block(actor, current + amount);
    }

    fn apply_hp_delta(&mut self, actor: Actor, delta: i32) {
        match actor {
            Actor::Player => self.state.player.hp += delta,
            Actor::Enemy { unit } => {
                if let Some(i) = self.enemy_idx(unit) {
                    self.state.enemies[i].hp += delta;
                }
            }
        }
    }

    fn set_hp(&mut self, actor: Actor, value: i32) {
        match actor {
            Actor::Player => self.state.player.hp = value,
            Actor::Enemy { unit } => {
                if let Some(i) = self.enemy_idx(unit) {
                    self.state.enemies[i].hp = value;
                }
            }
        }
    }

    fn consume_revive_of(&mut self, actor: Actor) -> bool {
        match actor {
            Actor::Player => token_engine::consume_revive(&mut self.state.player.tokens),
            Actor::Enemy { unit } => self
                .enemy_idx(unit)
                .map(|i| token_engine::consume_revive(&mut self.state.enemies[i].tokens))
                .unwrap_or(false),
        }
    }

    /// Applies `amount` of damage to `actor`'s hp, honoring a `revive` stack:
    /// a hit that would otherwise leave `actor` at or below 0 hp instead
    /// leaves it at 1, consuming one revive stack.
    fn apply_damage(&mut self, actor: Actor, amount: u32) {
        if amount == 0 {
            return;
        }
        self.apply_hp_delta(actor, -(amount as i32));
        if self.is_defeated(actor) && self.consume_revive_of(actor) {
            self.set_hp(actor, 1);
        }
    }

    fn is_defeated(&self, actor: Actor) -> bool {
        match actor {
            Actor::Player => self.state.player.is_defeated(),
            Actor::Enemy { unit } => self.enemy_idx(unit).map(|i| self.state.enemies[i].is_defeated()).unwrap_or(true),
        }
    }

    fn apply_token_to_actor(&mut self, actor: Actor, token: &TokenId, stacks: u32) {
        match actor {
            Actor::Player => token_engine::apply_token(&mut self.state.player.tokens, token, stacks),
            Actor::Enemy { unit } => {
                if let Some(i) = self.enemy_idx(unit) {
                    token_engine::apply_token(&mut self.state.enemies[i].tokens, token, stacks);
                }
            }
        }
        self.log.append(Event::TokenApplied { target: damage_source_of(actor), token: token.clone(), stacks });
    }

    fn remove_token_from_actor(&mut self, actor: Actor, token: &TokenId, stacks: u32) {
        match actor {
            Actor::Player => token_engine::remove_token(&mut self.state.player.tokens, token, stacks),
            Actor::Enemy { unit } => {
                if let Some(i) = self.enemy_idx(unit) {
                    token_engine::remove_token(&mut self.state.enemies[i].tokens, token, stacks);
                }
            }
        }
        self.log.append(Event::TokenRemoved { target: damage_source_of(actor), token: token.clone(), stacks });
    }

    fn consume_counter_of(&mut self, actor: Actor) -> bool {
        match actor {
            Actor::Player => token_engine::consume_counter(&mut self.state.player.tokens),
            Actor::Enemy { unit } => self
                .enemy_idx(unit)
                .map(|i| token_engine::consume_counter(&mut self.state.enemies[i].tokens))
                .unwrap_or(false),
        }
    }

    /// Runs the full damage pipeline for one card's attack effect, directed
    /// from `source` at its current primary opponent — works identically
    /// whether `source` is the player or an enemy unit.
    fn resolve_attack(
        &mut self,
        source: Actor,
        amount: u32,
        element: DamageElement,
        hits: u8,
        crush_multiplier: u32,
        cross_bonus: Option<&CrossBonus>,
    ) {
        let Some(target) = self.primary_opponent(source) else { return };

        let mut extra_mult = 1.0;
        let mut guaranteed_crit = false;
        if let Some(bonus) = cross_bonus {
            match bonus {
                CrossBonus::DamageMultiplier { factor_bp } => extra_mult = *factor_bp as f64 / 10_000.0,
                CrossBonus::GuaranteedCrit => guaranteed_crit = true,
                CrossBonus::AddTokenToCaster { .. } => {} // applied once in resolve_card, not per attack
            }
        }

        let attacker_tokens = self.tokens_of(source);
        let defender_tokens = self.tokens_of(target);
        let defender_block = self.block_of(target);
        let attacker_strength = self.strength_of(source);

        let attacker_mods = token_engine::attack_modifiers(&attacker_tokens);
        let defender_mods = token_engine::defense_modifiers(&defender_tokens);
        let reflect_stacks = token_engine::reflect_stacks(&defender_tokens);
        let counter_fires = self.consume_counter_of(target);

        let input = damage_pipeline::DamageInput {
            base_amount: amount,
            element,
            attacker: attacker_mods,
            attacker_strength,
            defender: defender_mods,
            defender_damage_taken_mult: token_engine::damage_taken_multiplier(&defender_tokens),
            defender_is_immune: token_engine::is_immune(&defender_tokens),
            defender_block,
            extra_mult,
            base_crit_chance: self.config.base_crit_chance,
            guaranteed_crit,
            crush_multiplier,
            damage_reduction: 0,
        };

        let result = damage_pipeline::calculate_multi_hit(&mut self.state.rng, hits, input);
        let total_raw: u32 = result.hits.iter().map(|h| h.raw).sum();

        self.set_block(target, defender_block.saturating_sub(result.total_blocked));
        self.apply_damage(target, result.total_dealt);

        self.log.append(Event::DamageDealt {
            source: damage_source_of(source),
            target: damage_source_of(target),
            amount: result.total_dealt,
            element,
            blocked: result.total_blocked,
            was_crit: result.crit_count() > 0,
        });

        if result.dodge_count() > 0 {
            self.log.append(Event::AttackDodged { source: damage_source_of(source), target: damage_source_of(target) });
        }

        if self.is_defeated(target) {
            if let Actor::Enemy { unit } = target {
                self.log.append(Event::EnemyDefeated { unit });
            }
        }

        let lifesteal = damage_pipeline::lifesteal_amount(result.total_dealt, attacker_mods.lifesteal_ratio);
        if lifesteal > 0 {
            self.apply_hp_delta(source, lifesteal as i32);
            self.log.append(Event::LifestealHealed { source: damage_source_of(source), amount: lifesteal });
        }

        if counter_fires && result.total_dealt > 0 {
            self.apply_damage(source, result.total_dealt);
            self.log.append(Event::CounterFired { source: damage_source_of(target), reflected_amount: result.total_dealt });
        } else if reflect_stacks > 0 {
            let reflected = damage_pipeline::reflect_amount(total_raw, reflect_stacks);
            if reflected > 0 {
                self.apply_damage(source, reflected);
                self.log.append(Event::ReflectFired { source: damage_source_of(target), reflected_amount: reflected });
            }
        }
    }

    fn apply_special(&mut self, actor: Actor, special: &SpecialCardKind, source_uid: CardUid) {
        match special {
            SpecialCardKind::Breach => {
                // Effect list already carries `OpenBreach`; nothing further.
            }
            SpecialCardKind::CreateFencingCards { count } => {
                // The creation-queue selection is a player-facing prompt;
                // an enemy-drafted card carrying this special is inert.
                if actor.is_player() {
                    let mut options = Vec::new();
                    for _ in 0..*count {
                        options.push(CardId::from("strike"));
                    }
                    self.state.pending.push(PendingSelection {
                        kind: PendingSelectionKind::CreationQueue,
                        source_uid: Some(source_uid),
                        options,
                    });
                }
            }
            SpecialCardKind::ExecutionSquad { unit_count } => {
                for _ in 0..*unit_count {
                    self.resolve_attack(actor, 4, etherline_types::DamageElement::Physical, 1, 1, None);
                }
            }
        }
    }

    /// Samples up to `count` distinct card ids from the built-in catalog for
    /// a selection's option list. Deterministic: draws from the battle's own
    /// RNG so replays stay identical. Draws without replacement.
    fn catalog_sample(&mut self, count: usize) -> Vec<CardId> {
        let mut pool: Vec<CardId> = etherline_data::all_cards().iter().map(|c| c.id.clone()).collect();
        let mut chosen = Vec::new();
        for _ in 0..count.min(pool.len()) {
            let idx = self.state.rng.pick_index(pool.len());
            chosen.push(pool.remove(idx));
        }
        chosen
    }

    /// Answers the currently active pending selection with `choice_index`
    /// into its `options`. Covers chain follow-ups, breach choices, and
    /// creation-queue insertions alike — all three are `PendingSelection`s.
    pub fn resolve_breach(&mut self, choice_index: usize) -> Result<(), SubSelectError> {
        let Some(active) = self.state.pending.active.clone() else {
            return Err(SubSelectError::QueueEmpty);
        };
        let Some(choice) = active.options.get(choice_index).cloned() else {
            return Err(SubSelectError::IndexOutOfRange { index: choice_index, len: active.options.len() });
        };

        let resolved_kind = active.kind;
        self.state.pending.resolve_active();

        let level = self.catalog.get_card(&choice).map(|def| def.level).unwrap_or(0);
        let mut instance = RuntimeCardInstance::new_with_level(choice.clone(), self.state.uid_gen.next(), level);
        instance.flags.is_ghost = true;
        instance.flags.created_by = active.source_uid;

        match resolved_kind {
            PendingSelectionKind::Chain | PendingSelectionKind::Breach => {
                let at_slot = self.state.queue.get(self.state.q_index.saturating_sub(1)).map(|e| e.slot).unwrap_or(0);
                scheduler::insert_ghost(&mut self.state.queue, instance, Actor::Player, at_slot);
            }
            PendingSelectionKind::CreationQueue => {
                self.state.creation_queue.push(instance.clone());
                let at_slot = self.state.queue.last().map(|e| e.slot).unwrap_or(0);
                scheduler::insert_ghost(&mut self.state.queue, instance, Actor::Player, at_slot);
            }
            PendingSelectionKind::Fleche => {
                instance.flags.is_fleche_preview = true;
                instance.flags.fleche_chain_count += 1;
                self.state.creation_queue.push(instance.clone());
                // Ahead of its own resolution point, not after it — the
                // cursor hasn't advanced past the triggering card's slot
                // yet, so inserting there re-visits it on this same pass.
                let at_slot = self.state.queue.get(self.state.q_index.saturating_sub(1)).map(|e| e.slot).unwrap_or(0);
                scheduler::insert_ghost(&mut self.state.queue, instance, Actor::Player, at_slot);
            }
        }

        self.log.append(Event::BreachResolved { chosen: choice });

        if self.state.pending.is_empty() {
            self.transition_phase(BattlePhase::Resolving);
        }

        Ok(())
    }

    /// Restores the turn's single snapshot, undoing every effect since
    /// `submit_selection` was called. Consumes the snapshot — a second
    /// rewind attempt this turn fails with `AlreadyUsedThisTurn`.
    pub fn rewind(&mut self) -> Result<(), RewindError> {
        if self.state.rewound_this_turn {
            return Err(RewindError::AlreadyUsedThisTurn);
        }
        if !matches!(self.state.phase, BattlePhase::AwaitingResponse) {
            return Err(RewindError::NoSnapshotAvailable);
        }
        let Some(snapshot) = self.state.respond_snapshot.take() else {
            return Err(RewindError::NoSnapshotAvailable);
        };
        let from = self.state.phase;
        self.state = *snapshot;
        self.state.rewound_this_turn = true;
        self.turn_faces.clear();
        self.log.append(Event::Rewound { to_turn: self.state.turn });
        self.log.append(Event::PhaseChanged { from, to: self.state.phase });
        Ok(())
    }

    fn settle_turn_resolution(&mut self) -> StepOutcome {
        let faces = std::mem::take(&mut self.turn_faces);
        let (combo, _bonus_keys) = combo::detect_combo(&faces);
        let base_amount: u32 = faces.iter().map(|f| f.points).sum();
        if base_amount > 0 {
            // Deflation is keyed per combo name, per actor: the first time
            // the player scores `combo` this combat it is undeflated, every
            // repeat shrinks by another factor of 0.8.
            let usage_count = self.state.combo_usage_for(Actor::Player).record(combo);
            let result = ether::accumulate(self.state.ether, base_amount, combo, usage_count);
            self.state.ether = result.ether_after;
            self.state.ether_slots = result.slots_after;
            ether::record_deflation(&mut self.state.deflation, result.deflated_away);
            let bp = (combo.multiplier() * 10_000.0) as u32;
            self.log.append(Event::ComboDetected { combo, multiplier_bp: bp });
            self.log.append(Event::EtherGained { amount: result.gained, slots_after: result.slots_after });
            if result.deflated_away > 0 {
                self.log.append(Event::EtherDeflated { amount_lost: result.deflated_away });
            }
        }

        self.transition_phase(BattlePhase::TurnComplete);
        StepOutcome::TurnComplete
    }

    /// Runs end-of-turn token processing, advances the turn counter,
    /// redraws a hand, and replans every enemy, returning to `Planning`.
    pub fn finish_turn(&mut self) -> Result<(), PhaseError> {
        if !matches!(self.state.phase, BattlePhase::TurnComplete) {
            return Err(PhaseError::UnexpectedPhase { expected: "turn_complete", actual: phase_name(self.state.phase) });
        }

        self.state.player.block = 0;
        for unit in &mut self.state.enemies {
            unit.block = 0;
        }
        for tick in token_engine::process_turn_end(&mut self.state.player.tokens) {
            self.apply_end_of_turn_tick(DamageSource::Player, tick);
        }
        let unit_ids: Vec<_> = self.state.enemies.iter().map(|e| e.unit_id).collect();
        for (idx, unit_id) in unit_ids.into_iter().enumerate() {
            let ticks = token_engine::process_turn_end(&mut self.state.enemies[idx].tokens);
            for tick in ticks {
                self.apply_end_of_turn_tick(DamageSource::Enemy { unit: unit_id }, tick);
            }
        }

        if let Some(outcome) = self.check_battle_over() {
            return match outcome {
                StepOutcome::BattleOver { .. } => Ok(()),
                _ => Ok(()),
            };
        }

        self.state.turn += 1;
        self.state.recall_card = None;
        self.state.respond_snapshot = None;
        self.state.rewound_this_turn = false;
        self.state.vanished_ghosts.clear();
        self.state.cross_bonus_activations.clear();
        self.state.queue.clear();
        self.state.q_index = 0;
        self.state.fixed_order.clear();

        let draws = self.config.starting_hand_size.saturating_sub(self.state.hand.len() as u8);
        for _ in 0..draws {
            if self.state.deck.is_empty() && !self.state.discard.is_empty() {
                self.state.deck.append(&mut self.state.discard);
            }
            if let Some(idx) = (!self.state.deck.is_empty()).then(|| self.state.rng.pick_index(self.state.deck.len())) {
                self.state.hand.push(self.state.deck.remove(idx));
            }
        }

        for idx in 0..self.state.enemies.len() {
            let def_id = self.state.enemies[idx].def_id.clone();
            let (preferred_mode, deck, cards_per_turn) = self
                .catalog
                .get_enemy(&def_id)
                .map(|d| (d.preferred_mode, d.deck.clone(), d.cards_per_turn))
                .unwrap_or((EnemyMode::Balanced, Vec::new(), 0));
            enemy_planner::plan_for_turn(
                &mut self.state.rng,
                &mut self.state.uid_gen,
                &self.catalog,
                &mut self.state.enemies[idx],
                preferred_mode,
                &deck,
                cards_per_turn,
            );
            if let Some(plan) = &self.state.enemies[idx].plan {
                self.log.append(Event::EnemyPlanGenerated {
                    unit: self.state.enemies[idx].unit_id,
                    drafted: plan.actions.iter().map(|a| a.def_id.clone()).collect(),
                    hint: plan.hint.clone(),
                });
            }
        }

        self.transition_phase(BattlePhase::Planning);
        Ok(())
    }

    fn apply_end_of_turn_tick(&mut self, who: DamageSource, tick: token_engine::EndOfTurnTick) {
        match tick {
            token_engine::EndOfTurnTick::Burn(stacks) => self.deal_dot(who, stacks, etherline_types::DamageElement::Fire),
            token_engine::EndOfTurnTick::Poison(stacks) => self.deal_dot(who, stacks, etherline_types::DamageElement::Void),
            token_engine::EndOfTurnTick::Regen(stacks) => {
                match who {
                    DamageSource::Player => self.state.player.hp = (self.state.player.hp + stacks as i32).min(self.state.player.max_hp),
                    DamageSource::Enemy { unit } => {
                        if let Some(e) = self.state.enemies.iter_mut().find(|e| e.unit_id == unit) {
                            e.hp = (e.hp + stacks as i32).min(e.max_hp);
                        }
                    }
                }
            }
        }
    }

    fn deal_dot(&mut self, who: DamageSource, stacks: u32, element: etherline_types::DamageElement) {
        match who {
            DamageSource::Player => self.state.player.hp -= stacks as i32,
            DamageSource::Enemy { unit } => {
                if let Some(e) = self.state.enemies.iter_mut().find(|e| e.unit_id == unit) {
                    e.hp -= stacks as i32;
                }
            }
        }
        self.log.append(Event::DamageDealt { source: who, target: who, amount: stacks, element, blocked: 0, was_crit: false });
    }

    fn check_battle_over(&mut self) -> Option<StepOutcome> {
        if self.state.player.is_defeated() {
            self.transition_phase(BattlePhase::BattleOver);
            self.log.append(Event::PlayerDefeated);
            return Some(StepOutcome::BattleOver { player_won: false });
        }
        if !self.state.enemies.is_empty() && self.state.enemies.iter().all(|e| e.is_defeated()) {
            self.transition_phase(BattlePhase::BattleOver);
            self.log.append(Event::BattleWon);
            return Some(StepOutcome::BattleOver { player_won: true });
        }
        None
    }

    fn transition_phase(&mut self, to: BattlePhase) {
        if self.state.phase == to {
            return;
        }
        let from = self.state.phase;
        self.state.phase = to;
        self.log.append(Event::PhaseChanged { from, to });
    }

    pub fn events_since(&self, since: usize) -> &[Event] {
        self.log.events_since(since)
    }

    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    /// Test/tooling hook: force-generates a plan for every enemy regardless
    /// of `PlanOrigin`, used by `view`'s tests and by `etherline-sim` when
    /// seeding a scenario that skips the normal planning phase.
    pub fn debug_force_plan_all(&mut self) {
        for idx in 0..self.state.enemies.len() {
            let def_id = self.state.enemies[idx].def_id.clone();
            let (preferred_mode, deck, cards_per_turn) = self
                .catalog
                .get_enemy(&def_id)
                .map(|d| (d.preferred_mode, d.deck.clone(), d.cards_per_turn))
                .unwrap_or((EnemyMode::Balanced, Vec::new(), 0));
            self.state.enemies[idx].plan = None;
            enemy_planner::plan_for_turn(
                &mut self.state.rng,
                &mut self.state.uid_gen,
                &self.catalog,
                &mut self.state.enemies[idx],
                preferred_mode,
                &deck,
                cards_per_turn,
            );
        }
    }
}

fn damage_source_of(actor: Actor) -> DamageSource {
    match actor {
        Actor::Player => DamageSource::Player,
        Actor::Enemy { unit } => DamageSource::Enemy { unit },
    }
}

fn phase_name(phase: BattlePhase) -> &'static str {
    match phase {
        BattlePhase::Planning => "planning",
        BattlePhase::PendingSelection => "pending_selection",
        BattlePhase::Resolving => "resolving",
        BattlePhase::AwaitingResponse => "awaiting_response",
        BattlePhase::TurnComplete => "turn_complete",
        BattlePhase::BattleOver => "battle_over",
    }
}
