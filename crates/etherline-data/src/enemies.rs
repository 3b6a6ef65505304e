//! Built-in enemy catalog.

use std::sync::OnceLock;

use etherline_types::{CardId, EnemyDef, EnemyId, EnemyMode};

fn built_in() -> Vec<EnemyDef> {
    vec![
        EnemyDef {
            id: EnemyId::from("grunt"),
            name: "Grunt".into(),
            max_hp: 18,
            unit_count: 1,
            preferred_mode: EnemyMode::Aggressive,
            deck: vec![CardId::from("strike"), CardId::from("flurry")],
            cards_per_turn: 1,
            strength: 2,
            agility: 0,
            insight: -1,
            description: "A lone, straightforward attacker.".into(),
        },
        EnemyDef {
            id: EnemyId::from("shieldbearer"),
            name: "Shieldbearer".into(),
            max_hp: 26,
            unit_count: 1,
            preferred_mode: EnemyMode::Defensive,
            deck: vec![CardId::from("guard"), CardId::from("feint")],
            cards_per_turn: 1,
            strength: 0,
            agility: -1,
            insight: 0,
            description: "Prioritizes block over offense.".into(),
        },
        EnemyDef {
            id: EnemyId::from("raider_pack"),
            name: "Raider Pack".into(),
            max_hp: 10,
            unit_count: 3,
            preferred_mode: EnemyMode::Balanced,
            deck: vec![CardId::from("strike"), CardId::from("guard")],
            cards_per_turn: 1,
            strength: 1,
            agility: 1,
            insight: -2,
            description: "Three weak raiders that act independently.".into(),
        },
        EnemyDef {
            id: EnemyId::from("warlord"),
            name: "Warlord".into(),
            max_hp: 60,
            unit_count: 1,
            preferred_mode: EnemyMode::Aggressive,
            deck: vec![CardId::from("strike"), CardId::from("flurry"), CardId::from("weakening_strike")],
            cards_per_turn: 2,
            strength: 4,
            agility: 1,
            insight: 1,
            description: "A heavy-hitting boss encounter.".into(),
        },
    ]
}

fn catalog() -> &'static [EnemyDef] {
    static CATALOG: OnceLock<Vec<EnemyDef>> = OnceLock::new();
    CATALOG.get_or_init(built_in)
}

pub fn get_enemy(id: &EnemyId) -> Option<&'static EnemyDef> {
    catalog().iter().find(|e| &e.id == id)
}

pub fn all_enemies() -> &'static [EnemyDef] {
    catalog()
}
