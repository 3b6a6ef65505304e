//! Built-in card catalog.
//!
//! Definitions are assembled once into a `OnceLock`-backed static slice and
//! looked up by id through `get_card`. `CardDef` carries owned `Vec` fields
//! (effect lists), so the table is built lazily at first use rather than
//! written as a `const` array.

use std::sync::OnceLock;

use arrayvec::ArrayVec;
use etherline_types::{
    CardCategory, CardDef, CardEffect, CardId, CardTrait, DamageElement, EffectTarget, Rarity,
    SpecialCardKind, TokenId, TokenMap,
};

fn traits(ts: &[CardTrait]) -> ArrayVec<CardTrait, 4> {
    ts.iter().copied().collect()
}

fn hit(amount: u32, element: DamageElement, hits: u8) -> CardEffect {
    CardEffect::Damage { amount, element, hits, crush_multiplier: 1 }
}

fn built_in() -> Vec<CardDef> {
    vec![
        CardDef {
            id: CardId::from("strike"),
            name: "Strike".into(),
            category: CardCategory::Attack,
            rarity: Rarity::Common,
            base_speed_cost: 2,
            action_cost: 1,
            traits: traits(&[]),
            special: None,
            effects: vec![hit(6, DamageElement::Physical, 1)],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "A basic attack.".into(),
        },
        CardDef {
            id: CardId::from("guard"),
            name: "Guard".into(),
            category: CardCategory::Skill,
            rarity: Rarity::Common,
            base_speed_cost: 1,
            action_cost: 1,
            traits: traits(&[]),
            special: None,
            effects: vec![CardEffect::Block { amount: 5 }],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "Raise a basic guard.".into(),
        },
        CardDef {
            id: CardId::from("flurry"),
            name: "Flurry".into(),
            category: CardCategory::Attack,
            rarity: Rarity::Uncommon,
            base_speed_cost: 3,
            action_cost: 2,
            traits: traits(&[]),
            special: None,
            effects: vec![hit(3, DamageElement::Physical, 3)],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "Strike three times in quick succession.".into(),
        },
        CardDef {
            id: CardId::from("weakening_strike"),
            name: "Weakening Strike".into(),
            category: CardCategory::Attack,
            rarity: Rarity::Uncommon,
            base_speed_cost: 2,
            action_cost: 1,
            traits: traits(&[]),
            special: None,
            effects: vec![
                hit(4, DamageElement::Physical, 1),
                CardEffect::ApplyToken {
                    token: TokenId::from("dull"),
                    stacks: 1,
                    target: EffectTarget::PrimaryEnemy,
                },
            ],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "A cut that saps the target's outgoing attack power for the turn.".into(),
        },
        CardDef {
            id: CardId::from("outcast_gambit"),
            name: "Outcast Gambit".into(),
            category: CardCategory::Attack,
            rarity: Rarity::Rare,
            base_speed_cost: 1,
            action_cost: 2,
            traits: traits(&[CardTrait::Outcast]),
            special: None,
            effects: vec![hit(14, DamageElement::Void, 1)],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "A reckless, single-use strike. Discarded from the deck once played.".into(),
        },
        CardDef {
            id: CardId::from("feint"),
            name: "Feint".into(),
            category: CardCategory::Skill,
            rarity: Rarity::Uncommon,
            base_speed_cost: 1,
            action_cost: 1,
            traits: traits(&[CardTrait::Fleche]),
            special: None,
            effects: vec![CardEffect::Block { amount: 3 }],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "A preview strike that resolves ahead of its own slot.".into(),
        },
        CardDef {
            id: CardId::from("echo"),
            name: "Echo".into(),
            category: CardCategory::Skill,
            rarity: Rarity::Rare,
            base_speed_cost: 2,
            action_cost: 1,
            traits: traits(&[CardTrait::Ghost]),
            special: None,
            effects: vec![hit(2, DamageElement::Shock, 1)],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "Resolves as a fleeting copy that never occupies a lasting slot.".into(),
        },
        CardDef {
            id: CardId::from("opening_gambit"),
            name: "Opening Gambit".into(),
            category: CardCategory::Skill,
            rarity: Rarity::Rare,
            base_speed_cost: 2,
            action_cost: 1,
            traits: traits(&[CardTrait::Chain]),
            special: None,
            effects: vec![CardEffect::Draw { count: 1 }],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "Draw a card, then immediately choose a follow-up.".into(),
        },
        CardDef {
            id: CardId::from("breach_ritual"),
            name: "Breach Ritual".into(),
            category: CardCategory::Power,
            rarity: Rarity::Rare,
            base_speed_cost: 4,
            action_cost: 3,
            traits: traits(&[]),
            special: Some(SpecialCardKind::Breach),
            effects: vec![CardEffect::OpenBreach],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "Tear the timeline open, offering a choice of what follows.".into(),
        },
        CardDef {
            id: CardId::from("fencing_master"),
            name: "Fencing Master".into(),
            category: CardCategory::Power,
            rarity: Rarity::Rare,
            base_speed_cost: 3,
            action_cost: 2,
            traits: traits(&[]),
            special: Some(SpecialCardKind::CreateFencingCards { count: 3 }),
            effects: vec![],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "Conjures three temporary fencing cards into the queue.".into(),
        },
        CardDef {
            id: CardId::from("execution_order"),
            name: "Execution Order".into(),
            category: CardCategory::Attack,
            rarity: Rarity::Special,
            base_speed_cost: 5,
            action_cost: 3,
            traits: traits(&[]),
            special: Some(SpecialCardKind::ExecutionSquad { unit_count: 3 }),
            effects: vec![hit(4, DamageElement::Physical, 1)],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "Calls a coordinated squad of follow-up strikes.".into(),
        },
        CardDef {
            id: CardId::from("dazed"),
            name: "Dazed".into(),
            category: CardCategory::Status,
            rarity: Rarity::Special,
            base_speed_cost: 2,
            action_cost: 0,
            traits: traits(&[]),
            special: None,
            effects: vec![],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "An unplayable status card clogging the hand.".into(),
        },
        CardDef {
            id: CardId::from("regret"),
            name: "Regret".into(),
            category: CardCategory::Curse,
            rarity: Rarity::Special,
            base_speed_cost: 0,
            action_cost: 0,
            traits: traits(&[]),
            special: None,
            effects: vec![],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "A curse that does nothing but occupy space in the deck.".into(),
        },
        CardDef {
            id: CardId::from("crushing_blow"),
            name: "Crushing Blow".into(),
            category: CardCategory::Attack,
            rarity: Rarity::Uncommon,
            base_speed_cost: 3,
            action_cost: 2,
            traits: traits(&[]),
            special: None,
            effects: vec![CardEffect::Damage { amount: 10, element: DamageElement::Physical, hits: 1, crush_multiplier: 2 }],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "Punches through twice the block it actually consumes.".into(),
        },
        CardDef {
            id: CardId::from("piercing_thrust"),
            name: "Piercing Thrust".into(),
            category: CardCategory::Attack,
            rarity: Rarity::Uncommon,
            base_speed_cost: 2,
            action_cost: 1,
            traits: traits(&[]),
            special: None,
            effects: vec![
                CardEffect::ApplyToken { token: TokenId::from("armor_piercing"), stacks: 1, target: EffectTarget::Caster },
                hit(7, DamageElement::Physical, 1),
            ],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "A thrust that ignores the defender's block entirely.".into(),
        },
        CardDef {
            id: CardId::from("vampiric_edge"),
            name: "Vampiric Edge".into(),
            category: CardCategory::Attack,
            rarity: Rarity::Rare,
            base_speed_cost: 2,
            action_cost: 1,
            traits: traits(&[]),
            special: None,
            effects: vec![
                CardEffect::ApplyToken { token: TokenId::from("absorb"), stacks: 1, target: EffectTarget::Caster },
                hit(8, DamageElement::Void, 1),
            ],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "Converts half the damage dealt into healing.".into(),
        },
        CardDef {
            id: CardId::from("focused_strike"),
            name: "Focused Strike".into(),
            category: CardCategory::Attack,
            rarity: Rarity::Uncommon,
            base_speed_cost: 2,
            action_cost: 1,
            traits: traits(&[]),
            special: None,
            effects: vec![
                CardEffect::ApplyToken { token: TokenId::from("crit_boost"), stacks: 4, target: EffectTarget::Caster },
                hit(5, DamageElement::Physical, 1),
            ],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "Raises this attack's crit chance before it lands.".into(),
        },
        CardDef {
            id: CardId::from("shatter"),
            name: "Shatter".into(),
            category: CardCategory::Attack,
            rarity: Rarity::Uncommon,
            base_speed_cost: 2,
            action_cost: 1,
            traits: traits(&[]),
            special: None,
            effects: vec![
                hit(5, DamageElement::Physical, 1),
                CardEffect::ApplyToken { token: TokenId::from("shaken"), stacks: 1, target: EffectTarget::PrimaryEnemy },
            ],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "Weakens the target's ability to raise block this turn.".into(),
        },
        CardDef {
            id: CardId::from("evasive_step"),
            name: "Evasive Step".into(),
            category: CardCategory::Skill,
            rarity: Rarity::Uncommon,
            base_speed_cost: 1,
            action_cost: 1,
            traits: traits(&[]),
            special: None,
            effects: vec![CardEffect::ApplyToken { token: TokenId::from("dodge"), stacks: 1, target: EffectTarget::Caster }],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "A chance to slip past the next incoming attack.".into(),
        },
        CardDef {
            id: CardId::from("exposing_strike"),
            name: "Exposing Strike".into(),
            category: CardCategory::Attack,
            rarity: Rarity::Uncommon,
            base_speed_cost: 2,
            action_cost: 1,
            traits: traits(&[]),
            special: None,
            effects: vec![
                hit(4, DamageElement::Physical, 1),
                CardEffect::ApplyToken { token: TokenId::from("vulnerable"), stacks: 1, target: EffectTarget::PrimaryEnemy },
            ],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "Leaves the target taking more damage for the rest of the turn.".into(),
        },
        CardDef {
            id: CardId::from("thorned_stance"),
            name: "Thorned Stance".into(),
            category: CardCategory::Skill,
            rarity: Rarity::Rare,
            base_speed_cost: 2,
            action_cost: 1,
            traits: traits(&[]),
            special: None,
            effects: vec![
                CardEffect::Block { amount: 4 },
                CardEffect::ApplyToken { token: TokenId::from("reflect"), stacks: 1, target: EffectTarget::Caster },
            ],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "Raise a guard laced with barbs that return half of what gets through.".into(),
        },
        CardDef {
            id: CardId::from("second_wind"),
            name: "Second Wind".into(),
            category: CardCategory::Skill,
            rarity: Rarity::Rare,
            base_speed_cost: 1,
            action_cost: 1,
            traits: traits(&[]),
            special: None,
            effects: vec![CardEffect::ApplyToken { token: TokenId::from("revive"), stacks: 1, target: EffectTarget::Caster }],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "The next lethal hit instead leaves a single point of hp.".into(),
        },
        CardDef {
            id: CardId::from("disrupting_feint"),
            name: "Disrupting Feint".into(),
            category: CardCategory::Skill,
            rarity: Rarity::Rare,
            base_speed_cost: 2,
            action_cost: 1,
            traits: traits(&[]),
            special: None,
            effects: vec![CardEffect::DisruptEnemyPlan { target: EffectTarget::PrimaryEnemy }],
            cross_bonus: None,
            required_tokens: TokenMap::new(),
            level: 0,
            description: "Steps inside the target's guard and tears up its next move.".into(),
        },
        CardDef {
            id: CardId::from("finishing_blow"),
            name: "Finishing Blow".into(),
            category: CardCategory::Attack,
            rarity: Rarity::Rare,
            base_speed_cost: 2,
            action_cost: 1,
            traits: traits(&[]),
            special: None,
            effects: vec![hit(12, DamageElement::Physical, 1)],
            cross_bonus: None,
            // Fizzles unless a prior crit_boost application this turn (e.g.
            // Focused Strike) is still standing when this resolves.
            required_tokens: {
                let mut m = TokenMap::new();
                m.insert(TokenId::from("crit_boost"), 1);
                m
            },
            level: 1,
            description: "A heavy follow-up that only lands once the opening has been set up.".into(),
        },
    ]
}

fn catalog() -> &'static [CardDef] {
    static CATALOG: OnceLock<Vec<CardDef>> = OnceLock::new();
    CATALOG.get_or_init(built_in)
}

pub fn get_card(id: &CardId) -> Option<&'static CardDef> {
    catalog().iter().find(|c| &c.id == id)
}

pub fn all_cards() -> &'static [CardDef] {
    catalog()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strike_is_in_the_built_in_catalog() {
        let def = get_card(&CardId::from("strike")).expect("strike should exist");
        assert_eq!(def.name, "Strike");
    }

    #[test]
    fn unknown_card_id_returns_none() {
        assert!(get_card(&CardId::from("does_not_exist")).is_none());
    }

    #[test]
    fn all_card_ids_are_unique() {
        let mut ids: Vec<_> = all_cards().iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        let len_before = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), len_before);
    }

    #[test]
    fn crushing_blow_carries_a_nontrivial_crush_multiplier() {
        let def = get_card(&CardId::from("crushing_blow")).expect("crushing_blow should exist");
        match def.effects.first() {
            Some(CardEffect::Damage { crush_multiplier, .. }) => assert_eq!(*crush_multiplier, 2),
            other => panic!("unexpected effect shape: {other:?}"),
        }
    }
}
