//! Token application, modifier derivation, and end-of-turn token processing.
//!
//! Every function here is pure: it takes state by reference (or `&mut` for
//! the handful that mutate a token map in place) and returns a plain result
//! value, with no hidden side effects or global state. `attack_modifiers`
//! and `defense_modifiers` implement §4.1's modifier derivation verbatim —
//! each token family is resolved into a single scalar the damage pipeline
//! consumes as one of its seven stages, rather than the pipeline reaching
//! back into a raw token map itself.

use etherline_data::get_token;
use etherline_types::{get_stacks, has, remove_stacks, TokenCategory, TokenDuration, TokenId, TokenMap};
use tracing::trace;

/// Applies `stacks` of `token` to `map`, honoring the catalog's `max_stacks`.
/// Returns the number of stacks actually applied.
pub fn apply_token(map: &mut TokenMap, token: &TokenId, stacks: u32) -> u32 {
    let def = get_token(token);
    let max_stacks = def.and_then(|def| def.max_stacks);
    let opposite = def.and_then(|def| def.opposite_id.as_ref());
    let applied = etherline_types::add_stacks_with_cancellation(map, token, stacks, max_stacks, opposite);
    trace!(token = %token, stacks, applied, "token applied");
    applied
}

/// Removes up to `stacks` of `token` from `map` (0 = remove all).
pub fn remove_token(map: &mut TokenMap, token: &TokenId, stacks: u32) -> u32 {
    let removed = remove_stacks(map, token, stacks);
    trace!(token = %token, removed, "token removed");
    removed
}

/// Clears every token of the given `duration` from `map`, the bulk-removal
/// operation named in §4.1 for phase boundaries.
pub fn clear_by_duration(map: &mut TokenMap, duration: TokenDuration) {
    let ids: Vec<TokenId> = map.keys().filter(|id| get_token(id).map(|d| d.duration) == Some(duration)).cloned().collect();
    for id in ids {
        remove_stacks(map, &id, 0);
    }
}

/// Clears every token of the given `category` (positive/negative) from
/// `map`.
pub fn clear_by_category(map: &mut TokenMap, category: TokenCategory) {
    let ids: Vec<TokenId> = map.keys().filter(|id| get_token(id).map(|d| d.category) == Some(category)).cloned().collect();
    for id in ids {
        remove_stacks(map, &id, 0);
    }
}

/// One side's derived attack-facing modifiers for a single hit, per §4.1
/// "Attack". Every field is computed from the attacker's own token map; the
/// damage pipeline consumes this struct instead of re-deriving each value
/// inline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackModifiers {
    /// `(1 + positive_bonus) × negative_mult`, applied at stage 2 of the
    /// damage pipeline.
    pub attack_mult: f64,
    /// Flat bonus added at stage 1, before any multiplier: strength +
    /// sharpened_blade stacks, plus a flat +6 if fragmentation is active.
    pub damage_bonus: i64,
    /// Added to the base 5% crit chance at stage 3.
    pub crit_boost: f64,
    /// Skips block absorption (stage 5) entirely when true.
    pub ignore_block: bool,
    /// Fraction of dealt damage converted to caster healing (0.5 if
    /// `absorb` is active, else 0).
    pub lifesteal_ratio: f64,
    /// Fraction by which the defender's dodge chance is itself reduced at
    /// stage 4 (1.0 if `true_strike` is active, else 0).
    pub ignore_evasion: f64,
}

/// Per-stack multiplier rate for the base/"+"-suffixed halves of a token
/// family. `_plus` tokens apply a steeper rate; when both halves of a
/// family are simultaneously active (unusual, but not excluded by the
/// opposite-cancellation rule, since a family's base and `_plus` halves
/// aren't opposites of each other) the stronger of the two wins, never
/// both added together.
const BASIC_RATE: f64 = 0.10;
const PLUS_RATE: f64 = 0.20;

/// Resolves one positive-multiplier family (e.g. offense/offense_plus) into
/// a single multiplier ≥ 1.0: the larger of the two halves' contributions.
fn positive_family_mult(map: &TokenMap, basic: &str, plus: &str) -> f64 {
    let basic_mult = 1.0 + BASIC_RATE * get_stacks(map, &TokenId::from(basic)) as f64;
    let plus_mult = 1.0 + PLUS_RATE * get_stacks(map, &TokenId::from(plus)) as f64;
    basic_mult.max(plus_mult)
}

/// Resolves one negative-multiplier family (e.g. dull/dull_plus) into a
/// single multiplier in `[0, 1]`: the smaller (worse) of the two halves'
/// contributions.
fn negative_family_mult(map: &TokenMap, basic: &str, plus: &str) -> f64 {
    let basic_mult = (1.0 - BASIC_RATE * get_stacks(map, &TokenId::from(basic)) as f64).max(0.0);
    let plus_mult = (1.0 - PLUS_RATE * get_stacks(map, &TokenId::from(plus)) as f64).max(0.0);
    basic_mult.min(plus_mult)
}

/// Derives `AttackModifiers` for an attacker's current token map.
pub fn attack_modifiers(map: &TokenMap) -> AttackModifiers {
    let perm_mult = positive_family_mult(map, "offense", "offense_plus");
    let turn_mult = positive_family_mult(map, "attack_up", "attack_up_plus");
    let positive_bonus = (perm_mult - 1.0) + (turn_mult - 1.0);

    let dull_mult = negative_family_mult(map, "dull", "dull_plus");
    let dullness_mult = negative_family_mult(map, "dullness", "dullness_plus");
    let negative_mult = dull_mult.min(dullness_mult);

    let attack_mult = (1.0 + positive_bonus) * negative_mult;

    let mut damage_bonus =
        get_stacks(map, &TokenId::from("strength")) as i64 + get_stacks(map, &TokenId::from("sharpened_blade")) as i64;
    if has(map, &TokenId::from("fragmentation")) {
        damage_bonus += 6;
    }

    let crit_boost = 0.05 * get_stacks(map, &TokenId::from("crit_boost")) as f64;
    let ignore_block = has(map, &TokenId::from("armor_piercing"));
    let lifesteal_ratio = if has(map, &TokenId::from("absorb")) { 0.5 } else { 0.0 };
    let ignore_evasion = if has(map, &TokenId::from("true_strike")) { 1.0 } else { 0.0 };

    AttackModifiers { attack_mult, damage_bonus, crit_boost, ignore_block, lifesteal_ratio, ignore_evasion }
}

/// One side's derived defense-facing modifiers, per §4.1 "Defense": the
/// same family shape as `attack_modifiers` (guard/defense_up positive,
/// shaken/exposed negative) scaling block-granting effects, plus the
/// dodge chance read off the blur/dodge/evasion family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefenseModifiers {
    /// Multiplier applied to a `Block` card effect's base amount.
    pub block_mult: f64,
    /// Chance this combatant fully dodges an incoming attack.
    pub dodge_chance: f64,
}

pub fn defense_modifiers(map: &TokenMap) -> DefenseModifiers {
    // guard/defense_up/shaken/exposed have no `_plus` half, so each moves
    // the multiplier at the flat `BASIC_RATE` per stack rather than going
    // through the stronger-of-two-halves family resolution.
    let perm_mult = 1.0 + BASIC_RATE * get_stacks(map, &TokenId::from("guard")) as f64;
    let turn_mult = 1.0 + BASIC_RATE * get_stacks(map, &TokenId::from("defense_up")) as f64;
    let positive_bonus = (perm_mult - 1.0) + (turn_mult - 1.0);

    let shaken_mult = (1.0 - BASIC_RATE * get_stacks(map, &TokenId::from("shaken")) as f64).max(0.0);
    let exposed_mult = (1.0 - BASIC_RATE * get_stacks(map, &TokenId::from("exposed")) as f64).max(0.0);
    let negative_mult = shaken_mult.min(exposed_mult);

    let block_mult = (1.0 + positive_bonus) * negative_mult;

    let blur = if has(map, &TokenId::from("blur")) { 0.5 } else { 0.0 };
    let blur_plus = if has(map, &TokenId::from("blur_plus")) { 0.75 } else { 0.0 };
    let dodge = if has(map, &TokenId::from("dodge")) { 0.5 } else { 0.0 };
    let dodge_plus = if has(map, &TokenId::from("dodge_plus")) { 0.75 } else { 0.0 };
    let evasion = if has(map, &TokenId::from("evasion")) { 0.75 } else { 0.0 };
    let dodge_chance = [blur, blur_plus, dodge, dodge_plus, evasion].into_iter().fold(0.0, f64::max);

    DefenseModifiers { block_mult, dodge_chance }
}

/// Multiplier applied to incoming damage (damage pipeline stage 6): the
/// product, over every active token in the vulnerable/pain family, of that
/// token's per-stack factor (1.5 for the base half, 2.0 for `_plus`).
pub fn damage_taken_multiplier(map: &TokenMap) -> f64 {
    let mut mult = 1.0;
    for (id, factor) in [("vulnerable", 1.5), ("pain", 1.5), ("vulnerable_plus", 2.0), ("pain_plus", 2.0)] {
        let stacks = get_stacks(map, &TokenId::from(id));
        if stacks > 0 {
            mult *= factor.powi(stacks as i32);
        }
    }
    mult
}

/// Whether this combatant negates all incoming damage this turn.
pub fn is_immune(map: &TokenMap) -> bool {
    has(map, &TokenId::from("immune"))
}

/// Consumes one `counter` stack if present, reporting whether the next hit
/// should be reflected back at its source in full.
pub fn consume_counter(map: &mut TokenMap) -> bool {
    remove_stacks(map, &TokenId::from("counter"), 1) > 0
}

/// Current `reflect` stack count, for the partial-reflect derived value
/// (`reflect = floor(incoming × 0.5 × reflect_stacks)`). Unlike `counter`,
/// reflect is not consumed by reading it — it persists until explicitly
/// removed.
pub fn reflect_stacks(map: &TokenMap) -> u32 {
    get_stacks(map, &TokenId::from("reflect"))
}

/// Consumes one `revive` stack if present, reporting whether a lethal hit
/// against this combatant should instead leave it at 1 hp.
pub fn consume_revive(map: &mut TokenMap) -> bool {
    remove_stacks(map, &TokenId::from("revive"), 1) > 0
}

/// One effect produced by processing end-of-turn damage-over-time and
/// regeneration tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfTurnTick {
    Burn(u32),
    Poison(u32),
    Regen(u32),
}

/// Applies burn/poison/regen ticks, decaying each by one stack, and clears
/// every `Turn`-duration token entirely (dull, vulnerable, immune, ...).
/// Returns the ticks that fired, in a stable order, for the caller to turn
/// into damage/heal and log events.
pub fn process_turn_end(map: &mut TokenMap) -> Vec<EndOfTurnTick> {
    let mut ticks = Vec::new();

    for (name, build) in [
        ("burn", EndOfTurnTick::Burn as fn(u32) -> EndOfTurnTick),
        ("poison", EndOfTurnTick::Poison as fn(u32) -> EndOfTurnTick),
        ("regen", EndOfTurnTick::Regen as fn(u32) -> EndOfTurnTick),
    ] {
        let id = TokenId::from(name);
        let stacks = get_stacks(map, &id);
        if stacks > 0 {
            ticks.push(build(stacks));
            remove_stacks(map, &id, 1);
        }
    }

    clear_by_duration(map, TokenDuration::Turn);

    ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offense_raises_attack_multiplier_per_stack() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("offense"), 2);
        let mods = attack_modifiers(&map);
        assert!((mods.attack_mult - 1.2).abs() < 1e-9);
    }

    #[test]
    fn dullness_drags_the_multiplier_down_independent_of_offense() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("offense"), 5);
        apply_token(&mut map, &TokenId::from("dullness"), 2);
        let mods = attack_modifiers(&map);
        // offense cancels only its own opposite (dull); dullness is a
        // separate family and still drags the final multiplier down.
        assert!(mods.attack_mult < 1.5);
    }

    #[test]
    fn dull_plus_outranks_dull_when_both_present() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("dull_plus"), 1);
        let mods = attack_modifiers(&map);
        assert!((mods.attack_mult - 0.8).abs() < 1e-9);
    }

    #[test]
    fn strength_and_sharpened_blade_add_flat_damage_bonus() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("strength"), 2);
        apply_token(&mut map, &TokenId::from("sharpened_blade"), 1);
        assert_eq!(attack_modifiers(&map).damage_bonus, 3);
    }

    #[test]
    fn fragmentation_adds_a_flat_six() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("fragmentation"), 1);
        assert_eq!(attack_modifiers(&map).damage_bonus, 6);
    }

    #[test]
    fn armor_piercing_and_absorb_set_their_flags() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("armor_piercing"), 1);
        apply_token(&mut map, &TokenId::from("absorb"), 1);
        let mods = attack_modifiers(&map);
        assert!(mods.ignore_block);
        assert_eq!(mods.lifesteal_ratio, 0.5);
    }

    #[test]
    fn dodge_chance_is_the_max_of_the_active_family() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("blur"), 1);
        apply_token(&mut map, &TokenId::from("evasion"), 1);
        assert_eq!(defense_modifiers(&map).dodge_chance, 0.75);
    }

    #[test]
    fn no_dodge_tokens_means_zero_dodge_chance() {
        assert_eq!(defense_modifiers(&TokenMap::new()).dodge_chance, 0.0);
    }

    #[test]
    fn vulnerable_and_vulnerable_plus_compound_multiplicatively() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("vulnerable"), 1);
        assert_eq!(damage_taken_multiplier(&map), 1.5);
        apply_token(&mut map, &TokenId::from("vulnerable_plus"), 1);
        assert_eq!(damage_taken_multiplier(&map), 3.0);
    }

    #[test]
    fn immune_token_negates_damage() {
        let mut map = TokenMap::new();
        assert!(!is_immune(&map));
        apply_token(&mut map, &TokenId::from("immune"), 1);
        assert!(is_immune(&map));
    }

    #[test]
    fn applying_strength_cancels_existing_weak_stacks() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("weak"), 3);
        apply_token(&mut map, &TokenId::from("strength"), 5);
        assert_eq!(get_stacks(&map, &TokenId::from("weak")), 0);
        assert_eq!(get_stacks(&map, &TokenId::from("strength")), 2);
    }

    #[test]
    fn counter_is_single_use() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("counter"), 1);
        assert!(consume_counter(&mut map));
        assert!(!consume_counter(&mut map));
    }

    #[test]
    fn reflect_stacks_persist_until_removed() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("reflect"), 2);
        assert_eq!(reflect_stacks(&map), 2);
        assert_eq!(reflect_stacks(&map), 2);
    }

    #[test]
    fn revive_is_single_use() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("revive"), 1);
        assert!(consume_revive(&mut map));
        assert!(!consume_revive(&mut map));
    }

    #[test]
    fn turn_end_processing_ticks_and_decays_dots() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("burn"), 3);
        let ticks = process_turn_end(&mut map);
        assert_eq!(ticks, vec![EndOfTurnTick::Burn(3)]);
        assert_eq!(get_stacks(&map, &TokenId::from("burn")), 2);
    }

    #[test]
    fn turn_end_processing_clears_turn_scoped_tokens() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("dull"), 4);
        apply_token(&mut map, &TokenId::from("strength"), 2);
        process_turn_end(&mut map);
        assert_eq!(get_stacks(&map, &TokenId::from("dull")), 0);
        // Strength is Permanent, so it survives turn-end processing.
        assert_eq!(get_stacks(&map, &TokenId::from("strength")), 2);
    }

    #[test]
    fn clear_by_category_removes_only_that_category() {
        let mut map = TokenMap::new();
        apply_token(&mut map, &TokenId::from("strength"), 2);
        apply_token(&mut map, &TokenId::from("dullness"), 1);
        clear_by_category(&mut map, TokenCategory::Positive);
        assert_eq!(get_stacks(&map, &TokenId::from("strength")), 0);
        assert_eq!(get_stacks(&map, &TokenId::from("dullness")), 1);
    }
}
