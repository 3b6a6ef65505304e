//! Token catalog shape and the map type used to carry stacks of tokens on a
//! combatant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::TokenCategory;
use crate::enums::TokenDuration;
use crate::ids::TokenId;

/// Static catalog definition for one token type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDef {
    pub id: TokenId,
    pub name: String,
    pub category: TokenCategory,
    pub duration: TokenDuration,
    /// Maximum stacks a single combatant may hold, or `None` if unbounded.
    pub max_stacks: Option<u32>,
    /// The token this one cancels one-for-one on contact (e.g. `offense`'s
    /// opposite is `dull`). `add_stacks_with_cancellation` consumes stacks of
    /// the opposite before adding any of its own. Symmetric by convention:
    /// if `a.opposite_id == Some(b)` then `b.opposite_id == Some(a)`.
    #[serde(default)]
    pub opposite_id: Option<TokenId>,
    #[serde(default)]
    pub description: String,
}

/// Stacks of tokens currently applied to one combatant.
///
/// A `BTreeMap` rather than a `HashMap`: this map participates directly in
/// the event log (token snapshots are serialized in iteration order) and in
/// deterministic-replay assertions, so its iteration order must be stable
/// and reproducible across runs, not just across operations within one run.
pub type TokenMap = BTreeMap<TokenId, u32>;

/// Adds `stacks` of `token` to `map`, honoring `max_stacks` if given.
/// Returns the number of stacks actually applied (may be less than
/// requested if the cap was reached).
pub fn add_stacks(map: &mut TokenMap, token: &TokenId, stacks: u32, max_stacks: Option<u32>) -> u32 {
    let entry = map.entry(token.clone()).or_insert(0);
    let before = *entry;
    let after = match max_stacks {
        Some(cap) => (before + stacks).min(cap),
        None => before + stacks,
    };
    *entry = after;
    after - before
}

/// Removes up to `stacks` of `token` from `map` (0 = remove all). Clears the
/// entry entirely once it reaches zero so absent and zero-stack tokens are
/// indistinguishable — callers should use `has`/`get_stacks` rather than
/// matching on `Entry`.
pub fn remove_stacks(map: &mut TokenMap, token: &TokenId, stacks: u32) -> u32 {
    let Some(entry) = map.get_mut(token) else {
        return 0;
    };
    let before = *entry;
    let removed = if stacks == 0 { before } else { stacks.min(before) };
    let after = before - removed;
    if after == 0 {
        map.remove(token);
    } else {
        *entry = after;
    }
    removed
}

/// Adds `stacks` of `token`, first cancelling one-for-one against
/// `opposite`'s current stacks (if any), then adding whatever remainder is
/// left, honoring `max_stacks`. This is invariant #5's enforcement point:
/// after this call, at most one of `token`/`opposite` has stacks > 0.
pub fn add_stacks_with_cancellation(
    map: &mut TokenMap,
    token: &TokenId,
    stacks: u32,
    max_stacks: Option<u32>,
    opposite: Option<&TokenId>,
) -> u32 {
    let mut remaining = stacks;
    if let Some(opp) = opposite {
        let opp_stacks = get_stacks(map, opp);
        if opp_stacks > 0 {
            let cancelled = opp_stacks.min(remaining);
            remove_stacks(map, opp, cancelled);
            remaining -= cancelled;
        }
    }
    if remaining == 0 {
        return 0;
    }
    add_stacks(map, token, remaining, max_stacks)
}

pub fn get_stacks(map: &TokenMap, token: &TokenId) -> u32 {
    map.get(token).copied().unwrap_or(0)
}

pub fn has(map: &TokenMap, token: &TokenId) -> bool {
    get_stacks(map, token) > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_stacks_respects_cap() {
        let mut map = TokenMap::new();
        let id = TokenId::from("weak");
        assert_eq!(add_stacks(&mut map, &id, 5, Some(3)), 3);
        assert_eq!(get_stacks(&map, &id), 3);
        assert_eq!(add_stacks(&mut map, &id, 5, Some(3)), 0);
        assert_eq!(get_stacks(&map, &id), 3);
    }

    #[test]
    fn remove_stacks_clears_entry_at_zero() {
        let mut map = TokenMap::new();
        let id = TokenId::from("burn");
        add_stacks(&mut map, &id, 4, None);
        assert_eq!(remove_stacks(&mut map, &id, 4), 4);
        assert!(!map.contains_key(&id));
        assert!(!has(&map, &id));
    }

    #[test]
    fn remove_stacks_zero_means_remove_all() {
        let mut map = TokenMap::new();
        let id = TokenId::from("poison");
        add_stacks(&mut map, &id, 9, None);
        assert_eq!(remove_stacks(&mut map, &id, 0), 9);
        assert_eq!(get_stacks(&map, &id), 0);
    }

    #[test]
    fn removing_from_absent_token_is_a_no_op() {
        let mut map = TokenMap::new();
        let id = TokenId::from("absent");
        assert_eq!(remove_stacks(&mut map, &id, 3), 0);
    }

    #[test]
    fn opposite_tokens_cancel_one_for_one_before_adding_remainder() {
        let mut map = TokenMap::new();
        let offense = TokenId::from("offense");
        let dull = TokenId::from("dull");
        add_stacks(&mut map, &offense, 2, None);
        let applied = add_stacks_with_cancellation(&mut map, &dull, 3, None, Some(&offense));
        assert_eq!(get_stacks(&map, &offense), 0);
        assert_eq!(get_stacks(&map, &dull), 1);
        assert_eq!(applied, 1);
    }

    #[test]
    fn full_cancellation_leaves_both_sides_at_zero() {
        let mut map = TokenMap::new();
        let offense = TokenId::from("offense");
        let dull = TokenId::from("dull");
        add_stacks(&mut map, &offense, 2, None);
        add_stacks_with_cancellation(&mut map, &dull, 2, None, Some(&offense));
        assert_eq!(get_stacks(&map, &offense), 0);
        assert_eq!(get_stacks(&map, &dull), 0);
        assert!(!map.contains_key(&offense) && !map.contains_key(&dull));
    }

    #[test]
    fn at_most_one_of_a_pair_holds_stacks_after_repeated_cancellation() {
        let mut map = TokenMap::new();
        let offense = TokenId::from("offense");
        let dull = TokenId::from("dull");
        add_stacks_with_cancellation(&mut map, &offense, 3, None, Some(&dull));
        add_stacks_with_cancellation(&mut map, &dull, 5, None, Some(&offense));
        add_stacks_with_cancellation(&mut map, &offense, 1, None, Some(&dull));
        assert_eq!(get_stacks(&map, &offense).min(get_stacks(&map, &dull)), 0);
    }

    proptest::proptest! {
        #[test]
        fn add_then_remove_same_amount_round_trips_to_the_starting_count(
            start in 0u32..50,
            delta in 0u32..50,
        ) {
            let mut map = TokenMap::new();
            let id = TokenId::from("offense");
            add_stacks(&mut map, &id, start, None);
            add_stacks(&mut map, &id, delta, None);
            remove_stacks(&mut map, &id, delta);
            proptest::prop_assert_eq!(get_stacks(&map, &id), start);
        }

        #[test]
        fn add_stacks_never_exceeds_its_cap(
            added in proptest::collection::vec(0u32..20, 0..10),
            cap in 1u32..30,
        ) {
            let mut map = TokenMap::new();
            let id = TokenId::from("guard");
            for stacks in added {
                add_stacks(&mut map, &id, stacks, Some(cap));
                proptest::prop_assert!(get_stacks(&map, &id) <= cap);
            }
        }

        #[test]
        fn remove_stacks_never_underflows_below_zero(
            start in 0u32..50,
            removed in 0u32..100,
        ) {
            let mut map = TokenMap::new();
            let id = TokenId::from("shaken");
            add_stacks(&mut map, &id, start, None);
            let actually_removed = remove_stacks(&mut map, &id, removed);
            proptest::prop_assert!(actually_removed <= start);
            proptest::prop_assert_eq!(get_stacks(&map, &id), start - actually_removed);
        }
    }
}
