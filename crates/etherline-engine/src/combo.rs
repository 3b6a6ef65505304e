//! Combo detector: scores a turn's played cards the way a poker hand is
//! scored, over the multiset of `action_cost` values ("rank") and each
//! card's broad type grouping ("suit" — `attack` vs `general`/`defense`).
//!
//! Combo detection runs per actor (the player's plays and each enemy unit's
//! plays are scored independently) so that one side's resolution order
//! never dilutes the other's combo window. `Ghost`-preview copies and any
//! card carrying the `outcast` trait are excluded before this runs — they
//! never occupied a persistent timeline slot, so they never count toward a
//! combo.

use std::collections::HashMap;

use etherline_types::{CardCategory, CardDef, CardEffect, CardRuntimeFlags, CardTrait, ComboName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboFace {
    pub suit: CardCategory,
    pub action_cost: u32,
    /// This card's contribution to the turn's ether base amount, before the
    /// combo multiplier and deflation are applied.
    pub points: u32,
}

/// Sums a card's `Damage`/`Block` effects into the point value its combo
/// face carries. `Damage` counts `amount * hits`; other effects contribute
/// nothing, matching how a pure-utility card still occupies a combo slot
/// without inflating the ether payout.
pub fn points_for_card(def: &CardDef) -> u32 {
    def.effects
        .iter()
        .map(|effect| match effect {
            CardEffect::Damage { amount, hits, .. } => amount * (*hits as u32),
            CardEffect::Block { amount } => *amount,
            _ => 0,
        })
        .sum()
}

/// Whether a played card's runtime flags and traits make it eligible to
/// count toward this turn's combo. `outcast` cards and `Ghost`/`Fleche`
/// preview copies are filtered out.
pub fn counts_for_combo(flags: CardRuntimeFlags, traits: &[CardTrait]) -> bool {
    !flags.is_ghost && !flags.is_fleche_preview && !traits.contains(&CardTrait::Outcast)
}

fn is_attack(suit: CardCategory) -> bool {
    matches!(suit, CardCategory::Attack)
}

fn is_general_or_defense(suit: CardCategory) -> bool {
    matches!(suit, CardCategory::Skill | CardCategory::Power)
}

/// Scores a set of combo faces per the ranking table, returning the
/// highest-ranked match along with the `action_cost` values that
/// participated (empty for `Flush`, which isn't cost-keyed).
pub fn detect_combo(faces: &[ComboFace]) -> (ComboName, Vec<u32>) {
    if faces.is_empty() {
        return (ComboName::HighCard, Vec::new());
    }

    let mut cost_counts: HashMap<u32, u32> = HashMap::new();
    for face in faces {
        *cost_counts.entry(face.action_cost).or_insert(0) += 1;
    }

    let mut by_count: Vec<(u32, u32)> = cost_counts.into_iter().collect();
    // Break ties on count by the smaller cost so results are deterministic.
    by_count.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let is_flush =
        faces.len() >= 4 && (faces.iter().all(|f| is_attack(f.suit)) || faces.iter().all(|f| is_general_or_defense(f.suit)));

    let has_count = |n: u32| by_count.iter().find(|(_, c)| *c == n).map(|(cost, _)| *cost);
    let triples: Vec<u32> = by_count.iter().filter(|(_, n)| *n == 3).map(|(c, _)| *c).collect();
    let pairs: Vec<u32> = by_count.iter().filter(|(_, n)| *n == 2).map(|(c, _)| *c).collect();

    if let Some(cost) = has_count(5) {
        return (ComboName::FiveOfAKind, vec![cost]);
    }
    if let Some(cost) = has_count(4) {
        return (ComboName::FourOfAKind, vec![cost]);
    }
    if let (Some(&triple), Some(&pair)) = (triples.first(), pairs.first()) {
        return (ComboName::FullHouse, vec![triple, pair]);
    }
    if is_flush {
        return (ComboName::Flush, Vec::new());
    }
    if let Some(&cost) = triples.first() {
        return (ComboName::Triple, vec![cost]);
    }
    if pairs.len() >= 2 {
        let mut keys = pairs;
        keys.sort_unstable();
        return (ComboName::TwoPair, keys);
    }
    if let Some(&cost) = pairs.first() {
        return (ComboName::Pair, vec![cost]);
    }
    (ComboName::HighCard, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(suit: CardCategory, action_cost: u32) -> ComboFace {
        ComboFace { suit, action_cost, points: 0 }
    }

    #[test]
    fn empty_plays_are_high_card() {
        assert_eq!(detect_combo(&[]).0, ComboName::HighCard);
    }

    #[test]
    fn two_matching_costs_is_a_pair() {
        let faces = [face(CardCategory::Attack, 1), face(CardCategory::Attack, 1), face(CardCategory::Skill, 2)];
        let (combo, keys) = detect_combo(&faces);
        assert_eq!(combo, ComboName::Pair);
        assert_eq!(keys, vec![1]);
    }

    #[test]
    fn three_matching_costs_is_triple() {
        let faces = [face(CardCategory::Attack, 1), face(CardCategory::Skill, 1), face(CardCategory::Power, 1)];
        assert_eq!(detect_combo(&faces).0, ComboName::Triple);
    }

    #[test]
    fn two_distinct_pairs_is_two_pair() {
        let faces = [
            face(CardCategory::Attack, 1),
            face(CardCategory::Attack, 1),
            face(CardCategory::Skill, 2),
            face(CardCategory::Skill, 2),
        ];
        let (combo, mut keys) = detect_combo(&faces);
        keys.sort_unstable();
        assert_eq!(combo, ComboName::TwoPair);
        assert_eq!(keys, vec![1, 2]);
    }

    #[test]
    fn triple_plus_pair_is_full_house() {
        let faces = [
            face(CardCategory::Attack, 1),
            face(CardCategory::Attack, 1),
            face(CardCategory::Attack, 1),
            face(CardCategory::Skill, 2),
            face(CardCategory::Skill, 2),
        ];
        assert_eq!(detect_combo(&faces).0, ComboName::FullHouse);
    }

    #[test]
    fn four_matching_costs_is_four_of_a_kind() {
        let faces = [
            face(CardCategory::Attack, 1),
            face(CardCategory::Attack, 1),
            face(CardCategory::Attack, 1),
            face(CardCategory::Attack, 1),
        ];
        assert_eq!(detect_combo(&faces).0, ComboName::FourOfAKind);
    }

    #[test]
    fn five_matching_costs_is_five_of_a_kind() {
        let faces = [1, 1, 1, 1, 1].map(|c| face(CardCategory::Attack, c));
        assert_eq!(detect_combo(&faces).0, ComboName::FiveOfAKind);
    }

    #[test]
    fn four_all_attack_distinct_costs_is_flush() {
        let faces = [
            face(CardCategory::Attack, 1),
            face(CardCategory::Attack, 2),
            face(CardCategory::Attack, 3),
            face(CardCategory::Attack, 4),
        ];
        assert_eq!(detect_combo(&faces).0, ComboName::Flush);
    }

    #[test]
    fn four_of_general_or_defense_is_also_flush() {
        let faces = [
            face(CardCategory::Skill, 1),
            face(CardCategory::Power, 2),
            face(CardCategory::Skill, 3),
            face(CardCategory::Power, 4),
        ];
        assert_eq!(detect_combo(&faces).0, ComboName::Flush);
    }

    #[test]
    fn mixed_attack_and_skill_below_four_cards_is_not_a_flush() {
        let faces = [face(CardCategory::Attack, 1), face(CardCategory::Skill, 2), face(CardCategory::Attack, 3)];
        assert_ne!(detect_combo(&faces).0, ComboName::Flush);
    }

    #[test]
    fn four_of_a_kind_outranks_flush() {
        let faces = [
            face(CardCategory::Attack, 2),
            face(CardCategory::Attack, 2),
            face(CardCategory::Attack, 2),
            face(CardCategory::Attack, 2),
        ];
        assert_eq!(detect_combo(&faces).0, ComboName::FourOfAKind);
    }

    #[test]
    fn ghost_and_fleche_copies_are_excluded_from_combo_counting() {
        let mut flags = CardRuntimeFlags::default();
        assert!(counts_for_combo(flags, &[]));
        flags.is_ghost = true;
        assert!(!counts_for_combo(flags, &[]));
        flags = CardRuntimeFlags::default();
        flags.is_fleche_preview = true;
        assert!(!counts_for_combo(flags, &[]));
    }

    #[test]
    fn outcast_trait_is_excluded_from_combo_counting() {
        let flags = CardRuntimeFlags::default();
        assert!(!counts_for_combo(flags, &[CardTrait::Outcast]));
    }

    #[test]
    fn points_for_card_sums_multi_hit_damage_and_block() {
        use etherline_types::{DamageElement, Rarity};
        let def = CardDef {
            id: etherline_types::CardId::from("test_card"),
            name: "Test".into(),
            category: CardCategory::Attack,
            rarity: Rarity::Common,
            base_speed_cost: 1,
            action_cost: 1,
            traits: Default::default(),
            special: None,
            effects: vec![
                CardEffect::Damage { amount: 4, element: DamageElement::Physical, hits: 2, crush_multiplier: 1 },
                CardEffect::Block { amount: 3 },
            ],
            cross_bonus: None,
            required_tokens: Default::default(),
            level: 0,
            description: String::new(),
        };
        assert_eq!(points_for_card(&def), 11);
    }
}
