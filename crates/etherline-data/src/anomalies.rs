//! Built-in anomaly catalog.

use std::sync::OnceLock;

use etherline_types::{AnomalyDef, AnomalyEffect, AnomalyId, TokenCategory, TokenId};

fn built_in() -> Vec<AnomalyDef> {
    vec![
        AnomalyDef {
            id: AnomalyId::from("storm"),
            name: "Storm".into(),
            category: TokenCategory::Negative,
            effects: vec![AnomalyEffect::ShiftEtherSlots { delta: -1 }],
            description: "A raging storm disrupts ether accrual.".into(),
        },
        AnomalyDef {
            id: AnomalyId::from("embered_ground"),
            name: "Embered Ground".into(),
            category: TokenCategory::Negative,
            effects: vec![AnomalyEffect::GrantTokenToPlayer { token: TokenId::from("burn"), stacks: 2 }],
            description: "Scorched terrain sets the player alight at the start of battle.".into(),
        },
        AnomalyDef {
            id: AnomalyId::from("favorable_wind"),
            name: "Favorable Wind".into(),
            category: TokenCategory::Positive,
            effects: vec![AnomalyEffect::ShiftStartingHandSize { delta: 1 }],
            description: "An extra card is drawn at the start of each turn.".into(),
        },
    ]
}

fn catalog() -> &'static [AnomalyDef] {
    static CATALOG: OnceLock<Vec<AnomalyDef>> = OnceLock::new();
    CATALOG.get_or_init(built_in)
}

pub fn get_anomaly(id: &AnomalyId) -> Option<&'static AnomalyDef> {
    catalog().iter().find(|a| &a.id == id)
}

pub fn all_anomalies() -> &'static [AnomalyDef] {
    catalog()
}
