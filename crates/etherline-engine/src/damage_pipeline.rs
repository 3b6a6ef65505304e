//! Damage pipeline: turns a card's raw damage effect into final HP/block
//! deltas, one stage at a time.
//!
//! Stage order (fixed, per hit):
//! 1. Base: `d = base_damage + damage_bonus + attacker_strength` (damage_bonus
//!    already folds in sharpened_blade/fragmentation and any strength-derived
//!    tokens, per `token_engine::attack_modifiers`; `attacker_strength` is the
//!    combatant's raw stat, added on top rather than through a token).
//! 2. Attack multiplier: `d = floor(d × attack_mult × extra_mult)`.
//! 3. Crit roll: `crit_chance = min(1, base_crit_chance + crit_boost)`; if
//!    `guaranteed_crit` or the roll hits, `d *= 2`.
//! 4. Dodge roll: if the roll hits `dodge_chance × (1 − ignore_evasion)`,
//!    the hit is fully dodged — `final = 0`, block untouched.
//! 5. Block: unless `ignore_block`, effective block is the defender's block
//!    divided by `crush_multiplier`; block consumed scales back up by the
//!    same factor, so a crushing attack burns more block than it absorbs.
//! 6. Vulnerability: `d = floor(d × damage_taken_mult)`.
//! 7. Fixed reduction: `d = max(0, d − damage_reduction)`.
//!
//! `calculate_damage` runs this for a single hit; `calculate_multi_hit`
//! iterates it `hits` times, re-rolling crit and dodge independently per hit
//! and threading the defender's block pool through.

use etherline_types::{DamageElement, RngState};
use tracing::debug;

use crate::token_engine::{AttackModifiers, DefenseModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitResult {
    pub raw: u32,
    pub blocked: u32,
    pub dealt: u32,
    pub was_crit: bool,
    pub was_dodged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageResult {
    pub hits: Vec<HitResult>,
    pub total_dealt: u32,
    pub total_blocked: u32,
}

impl DamageResult {
    pub fn crit_count(&self) -> usize {
        self.hits.iter().filter(|h| h.was_crit).count()
    }

    pub fn dodge_count(&self) -> usize {
        self.hits.iter().filter(|h| h.was_dodged).count()
    }
}

/// Every scalar the pipeline needs beyond the two combatants' token-derived
/// modifier structs. Bundled so call sites don't thread eight positional
/// arguments through `resolve_attack`.
#[derive(Debug, Clone, Copy)]
pub struct DamageInput {
    pub base_amount: u32,
    pub element: DamageElement,
    pub attacker: AttackModifiers,
    /// The attacking combatant's raw `strength` stat, added directly into
    /// stage 1 alongside `attacker.damage_bonus`.
    pub attacker_strength: i32,
    pub defender: DefenseModifiers,
    pub defender_damage_taken_mult: f64,
    pub defender_is_immune: bool,
    pub defender_block: u32,
    /// Cross-bonus or other situational multiplier stacked onto stage 2,
    /// alongside the attacker's own `attack_mult` (1.0 = no change).
    pub extra_mult: f64,
    pub base_crit_chance: f64,
    pub guaranteed_crit: bool,
    /// Divides the defender's effective block for this attack (1 = no
    /// change); the block consumed still scales back up by this factor.
    pub crush_multiplier: u32,
    pub damage_reduction: u32,
}

/// Runs the seven-stage pipeline for a single hit against `input.defender_block`,
/// consuming block first and letting any remainder through to HP.
pub fn calculate_damage(rng: &mut RngState, input: &DamageInput) -> (HitResult, u32) {
    let crush = input.crush_multiplier.max(1);

    // Stage 1: base.
    let d = input.base_amount as i64 + input.attacker.damage_bonus + input.attacker_strength as i64;

    // Stage 2: attack multiplier.
    let d = (d.max(0) as f64) * input.attacker.attack_mult * input.extra_mult;
    let d = d.floor().max(0.0) as i64;

    // Stage 3: crit roll.
    let crit_chance = (input.base_crit_chance + input.attacker.crit_boost).min(1.0);
    let was_crit = input.guaranteed_crit || rng.chance(crit_chance);
    let d = if was_crit { d * 2 } else { d };

    // Stage 4: dodge roll.
    let dodge_chance = (input.defender.dodge_chance * (1.0 - input.attacker.ignore_evasion)).clamp(0.0, 1.0);
    let was_dodged = rng.chance(dodge_chance);
    if was_dodged {
        debug!(was_crit, was_dodged, "damage pipeline resolved one hit: dodged");
        return (HitResult { raw: 0, blocked: 0, dealt: 0, was_crit, was_dodged }, input.defender_block);
    }

    // Stage 5: block.
    let raw_before_block = d.max(0) as u32;
    let (d_after_block, remaining_block) = if input.attacker.ignore_block {
        (raw_before_block, input.defender_block)
    } else {
        let effective_block = input.defender_block / crush;
        let blocked = effective_block.min(raw_before_block);
        let block_consumed = input.defender_block.min(blocked.saturating_mul(crush));
        (raw_before_block - blocked, input.defender_block - block_consumed)
    };
    let blocked = raw_before_block - d_after_block;

    // Stage 6: vulnerability.
    let d = (d_after_block as f64) * input.defender_damage_taken_mult;
    let d = d.floor().max(0.0) as u32;

    // Stage 7: fixed reduction.
    let d = d.saturating_sub(input.damage_reduction);

    let dealt = if input.defender_is_immune { 0 } else { d };

    debug!(raw = raw_before_block, blocked, dealt, was_crit, was_dodged, "damage pipeline resolved one hit");

    (HitResult { raw: raw_before_block, blocked, dealt, was_crit, was_dodged }, remaining_block)
}

/// Iterates `calculate_damage` `hits` times against a shared, depleting
/// block pool, as required for multi-hit cards (e.g. `Flurry`).
pub fn calculate_multi_hit(rng: &mut RngState, hits: u8, mut input: DamageInput) -> DamageResult {
    let mut results = Vec::with_capacity(hits as usize);
    for _ in 0..hits {
        let (hit, remaining_block) = calculate_damage(rng, &input);
        input.defender_block = remaining_block;
        results.push(hit);
    }
    let total_dealt = results.iter().map(|h| h.dealt).sum();
    let total_blocked = results.iter().map(|h| h.blocked).sum();
    DamageResult { hits: results, total_dealt, total_blocked }
}

/// Amount of HP the attacker regains from a lifesteal effect, given the
/// damage actually dealt (not the raw, pre-block amount).
pub fn lifesteal_amount(dealt: u32, lifesteal_fraction: f64) -> u32 {
    (dealt as f64 * lifesteal_fraction.clamp(0.0, 1.0)).floor() as u32
}

/// Damage reflected back at an attacker by the defender's `reflect` stacks,
/// given the raw incoming damage (pre-block, per §4.2's derived values).
pub fn reflect_amount(incoming: u32, reflect_stacks: u32) -> u32 {
    ((incoming as f64) * 0.5 * reflect_stacks as f64).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_engine;
    use etherline_types::TokenMap;

    fn base_input(base_amount: u32, defender_block: u32) -> DamageInput {
        DamageInput {
            base_amount,
            element: DamageElement::Physical,
            attacker: token_engine::attack_modifiers(&TokenMap::new()),
            attacker_strength: 0,
            defender: token_engine::defense_modifiers(&TokenMap::new()),
            defender_damage_taken_mult: 1.0,
            defender_is_immune: false,
            defender_block,
            extra_mult: 1.0,
            base_crit_chance: 0.0,
            guaranteed_crit: false,
            crush_multiplier: 1,
            damage_reduction: 0,
        }
    }

    fn no_crit_rng() -> RngState {
        // Seed 0 rolls below any of the small crit/dodge chances these
        // tests use, so it never trips stage 3/4 unless explicitly set up
        // (`guaranteed_crit`/`dodge_chance = 1.0`).
        RngState::new(0)
    }

    #[test]
    fn base_damage_passes_through_with_no_tokens() {
        let mut rng = no_crit_rng();
        let (hit, remaining_block) = calculate_damage(&mut rng, &base_input(10, 0));
        assert_eq!(hit.raw, 10);
        assert_eq!(hit.dealt, 10);
        assert_eq!(remaining_block, 0);
    }

    #[test]
    fn block_absorbs_before_hp() {
        let mut rng = no_crit_rng();
        let (hit, remaining_block) = calculate_damage(&mut rng, &base_input(10, 6));
        assert_eq!(hit.blocked, 6);
        assert_eq!(hit.dealt, 4);
        assert_eq!(remaining_block, 0);
    }

    #[test]
    fn block_can_fully_absorb_a_hit() {
        let mut rng = no_crit_rng();
        let (hit, remaining_block) = calculate_damage(&mut rng, &base_input(5, 20));
        assert_eq!(hit.dealt, 0);
        assert_eq!(remaining_block, 15);
    }

    #[test]
    fn crush_multiplier_halves_effective_block_but_consumes_double() {
        let mut rng = no_crit_rng();
        let mut input = base_input(10, 8);
        input.crush_multiplier = 2;
        let (hit, remaining_block) = calculate_damage(&mut rng, &input);
        // effective block = 8/2 = 4, blocked = min(4, 10) = 4, dealt = 6.
        assert_eq!(hit.blocked, 4);
        assert_eq!(hit.dealt, 6);
        // block consumed = min(8, 4*2) = 8.
        assert_eq!(remaining_block, 0);
    }

    #[test]
    fn armor_piercing_ignores_block_entirely() {
        let mut rng = no_crit_rng();
        let mut map = TokenMap::new();
        token_engine::apply_token(&mut map, &etherline_types::TokenId::from("armor_piercing"), 1);
        let mut input = base_input(10, 100);
        input.attacker = token_engine::attack_modifiers(&map);
        let (hit, remaining_block) = calculate_damage(&mut rng, &input);
        assert_eq!(hit.dealt, 10);
        assert_eq!(remaining_block, 100);
    }

    #[test]
    fn guaranteed_crit_doubles_damage() {
        let mut rng = no_crit_rng();
        let mut input = base_input(10, 0);
        input.guaranteed_crit = true;
        let (hit, _) = calculate_damage(&mut rng, &input);
        assert!(hit.was_crit);
        assert_eq!(hit.dealt, 20);
    }

    #[test]
    fn full_dodge_chance_always_dodges_and_leaves_block_untouched() {
        let mut rng = no_crit_rng();
        let mut input = base_input(10, 5);
        input.defender = DefenseModifiers { block_mult: 1.0, dodge_chance: 1.0 };
        let (hit, remaining_block) = calculate_damage(&mut rng, &input);
        assert!(hit.was_dodged);
        assert_eq!(hit.dealt, 0);
        assert_eq!(remaining_block, 5);
    }

    #[test]
    fn true_strike_cancels_full_dodge_chance() {
        let mut rng = no_crit_rng();
        let mut map = TokenMap::new();
        token_engine::apply_token(&mut map, &etherline_types::TokenId::from("true_strike"), 1);
        let mut input = base_input(10, 0);
        input.attacker = token_engine::attack_modifiers(&map);
        input.defender = DefenseModifiers { block_mult: 1.0, dodge_chance: 1.0 };
        let (hit, _) = calculate_damage(&mut rng, &input);
        assert!(!hit.was_dodged);
        assert_eq!(hit.dealt, 10);
    }

    #[test]
    fn immune_defender_takes_no_damage_even_unblocked() {
        let mut rng = no_crit_rng();
        let mut input = base_input(50, 0);
        input.defender_is_immune = true;
        let (hit, _) = calculate_damage(&mut rng, &input);
        assert_eq!(hit.dealt, 0);
    }

    #[test]
    fn vulnerability_multiplies_after_block() {
        let mut rng = no_crit_rng();
        let mut input = base_input(10, 0);
        input.defender_damage_taken_mult = 1.5;
        let (hit, _) = calculate_damage(&mut rng, &input);
        assert_eq!(hit.dealt, 15);
    }

    #[test]
    fn fixed_reduction_applies_last_and_floors_at_zero() {
        let mut rng = no_crit_rng();
        let mut input = base_input(5, 0);
        input.damage_reduction = 10;
        let (hit, _) = calculate_damage(&mut rng, &input);
        assert_eq!(hit.dealt, 0);
    }

    #[test]
    fn multi_hit_depletes_a_shared_block_pool() {
        let mut rng = no_crit_rng();
        let result = calculate_multi_hit(&mut rng, 3, base_input(4, 5));
        assert_eq!(result.hits.len(), 3);
        assert_eq!(result.total_blocked, 5);
        assert_eq!(result.total_dealt, 7); // 3 hits of 4 = 12 raw, 5 blocked, 7 dealt
    }

    #[test]
    fn lifesteal_rounds_down_and_clamps_fraction() {
        assert_eq!(lifesteal_amount(10, 0.5), 5);
        assert_eq!(lifesteal_amount(7, 0.5), 3);
        assert_eq!(lifesteal_amount(10, 2.0), 10);
        assert_eq!(lifesteal_amount(10, -1.0), 0);
    }

    #[test]
    fn reflect_amount_scales_with_stacks() {
        assert_eq!(reflect_amount(10, 1), 5);
        assert_eq!(reflect_amount(10, 2), 10);
        assert_eq!(reflect_amount(7, 1), 3);
    }

    #[test]
    fn strength_adds_flat_bonus_before_multiplier() {
        let mut rng = no_crit_rng();
        let mut attacker_map = TokenMap::new();
        token_engine::apply_token(&mut attacker_map, &etherline_types::TokenId::from("strength"), 2);
        let mut input = base_input(10, 0);
        input.attacker = token_engine::attack_modifiers(&attacker_map);
        let (hit, _) = calculate_damage(&mut rng, &input);
        assert_eq!(hit.raw, 12); // 10 base + 2 strength
    }
}
