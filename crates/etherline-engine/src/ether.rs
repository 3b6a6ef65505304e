//! Ether engine: the geometric slot-cost curve, combo-multiplied accrual,
//! and per-combo deflation.

use etherline_types::{ComboName, DeflationState};
use tracing::debug;

/// Hard cap on unlocked ether slots.
pub const MAX_SLOTS: u32 = 10;

/// Cost of unlocking slot `i` (0-indexed): `floor(100 * 1.1^i)`.
fn slot_cost(i: u32) -> u32 {
    (100.0 * 1.1f64.powi(i as i32)).floor() as u32
}

/// Cumulative ether required to have unlocked `n` slots.
fn cumulative_cost(n: u32) -> u32 {
    (0..n).map(slot_cost).sum()
}

/// Number of ether slots unlocked at a given total ether amount: the
/// largest `n` (bounded by `MAX_SLOTS`) with `cumulative_cost(n) <= points`.
pub fn slots_for(points: u32) -> u32 {
    (0..=MAX_SLOTS).rev().find(|&n| cumulative_cost(n) <= points).unwrap_or(0)
}

/// Deflation multiplier for the `usage_count`-th scoring of a combo this
/// combat: `0.8^usage_count`. The first scoring of any combo (`usage_count
/// == 0`) is undeflated.
pub fn deflation_multiplier(usage_count: u32) -> f64 {
    0.8f64.powi(usage_count as i32)
}

pub struct EtherGainResult {
    pub gained: u32,
    pub ether_after: u32,
    pub slots_after: u32,
    pub slots_gained: u32,
    /// Ether that would have been gained at `usage_count == 0` minus what was
    /// actually gained — the amount deflation cost this accrual.
    pub deflated_away: u32,
}

/// Applies a combo-multiplied, deflation-discounted ether gain.
/// `points_for_turn` is the unscaled accrual for the turn's plays; `combo`
/// scales it per the ranking table; `usage_count` is how many times this
/// combo name has already scored this combat (from `ComboUsage::record`'s
/// return value), driving the `0.8^usage_count` deflation factor.
pub fn accumulate(ether: u32, points_for_turn: u32, combo: ComboName, usage_count: u32) -> EtherGainResult {
    let slots_before = slots_for(ether);
    let undeflated = points_for_turn as f64 * combo.multiplier();
    let gained = (undeflated * deflation_multiplier(usage_count)).round() as u32;
    let deflated_away = (undeflated.round() as u32).saturating_sub(gained);
    let ether_after = ether + gained;
    let slots_after = slots_for(ether_after);

    debug!(gained, ether_after, slots_after, usage_count, combo = ?combo, "ether accumulated");

    EtherGainResult { gained, ether_after, slots_after, slots_gained: slots_after - slots_before, deflated_away }
}

/// Folds `lost` into the combat-wide deflation tally for event-log/host
/// reporting.
pub fn record_deflation(deflation: &mut DeflationState, lost: u32) {
    deflation.total_deflated += lost;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_zero_costs_one_hundred() {
        assert_eq!(slot_cost(0), 100);
    }

    #[test]
    fn slots_for_below_first_threshold_is_zero() {
        assert_eq!(slots_for(0), 0);
        assert_eq!(slots_for(99), 0);
    }

    #[test]
    fn slots_for_exactly_cumulative_cost_unlocks_that_slot() {
        let cum1 = cumulative_cost(1);
        assert_eq!(slots_for(cum1), 1);
        assert_eq!(slots_for(cum1 - 1), 0);
    }

    #[test]
    fn slots_for_is_monotonic_nondecreasing() {
        let mut prev = slots_for(0);
        for ether in (0..5000).step_by(17) {
            let cur = slots_for(ether);
            assert!(cur >= prev);
            prev = cur;
        }
    }

    #[test]
    fn slots_for_never_exceeds_max_slots() {
        assert_eq!(slots_for(u32::MAX), MAX_SLOTS);
    }

    #[test]
    fn combo_multiplier_scales_gain_at_zero_usage() {
        // S1: pair combo, base 12 points -> 12 * 2.0 * 0.8^0 = 24.
        let result = accumulate(0, 12, ComboName::Pair, 0);
        assert_eq!(result.gained, 24);
    }

    #[test]
    fn five_of_a_kind_gain_exceeds_high_card_gain() {
        let hc = accumulate(0, 10, ComboName::HighCard, 0);
        let five = accumulate(0, 10, ComboName::FiveOfAKind, 0);
        assert!(five.gained > hc.gained);
    }

    #[test]
    fn deflation_shrinks_repeated_combo_gains() {
        let first = accumulate(0, 100, ComboName::Pair, 0);
        let second = accumulate(0, 100, ComboName::Pair, 1);
        let third = accumulate(0, 100, ComboName::Pair, 2);
        assert!(first.gained > second.gained);
        assert!(second.gained > third.gained);
    }

    #[test]
    fn deflation_multiplier_matches_the_0_8_power_curve() {
        assert_eq!(deflation_multiplier(0), 1.0);
        assert!((deflation_multiplier(1) - 0.8).abs() < 1e-9);
        assert!((deflation_multiplier(2) - 0.64).abs() < 1e-9);
    }

    #[test]
    fn record_deflation_accumulates_the_running_total() {
        let mut deflation = DeflationState::default();
        record_deflation(&mut deflation, 5);
        record_deflation(&mut deflation, 3);
        assert_eq!(deflation.total_deflated, 8);
    }

    proptest::proptest! {
        #[test]
        fn slots_for_is_monotonic_over_arbitrary_ether_amounts(a in 0u32..200_000, b in 0u32..200_000) {
            if a <= b {
                proptest::prop_assert!(slots_for(a) <= slots_for(b));
            }
        }

        #[test]
        fn slots_for_is_always_within_bounds(ether in 0u32..u32::MAX) {
            proptest::prop_assert!(slots_for(ether) <= MAX_SLOTS);
        }

        #[test]
        fn repeated_deflation_never_increases_gain(points in 1u32..10_000, usage_a in 0u32..20, usage_b in 0u32..20) {
            if usage_a <= usage_b {
                let earlier = accumulate(0, points, ComboName::Pair, usage_a);
                let later = accumulate(0, points, ComboName::Pair, usage_b);
                proptest::prop_assert!(earlier.gained >= later.gained);
            }
        }
    }
}
