//! Anomaly catalog shape: encounter-wide modifiers bundled into an
//! `EncounterSpec` (e.g. "enemies gain +1 ether slot regen", "player draws
//! one fewer card per turn"). Anomaly *definitions* live here; anomaly
//! *authoring* (how a new one is designed or balanced) is out of scope —
//! this engine only applies whichever anomaly ids the host hands it.

use serde::{Deserialize, Serialize};

use crate::enums::TokenCategory;
use crate::ids::{AnomalyId, TokenId};

/// A single modifier an anomaly applies at battle start. Anomalies are
/// intentionally coarse-grained: they grant or deny tokens/ether, they
/// don't run bespoke scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AnomalyEffect {
    GrantTokenToEnemies { token: TokenId, stacks: u32 },
    GrantTokenToPlayer { token: TokenId, stacks: u32 },
    ShiftEtherSlots { delta: i32 },
    ShiftStartingHandSize { delta: i8 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDef {
    pub id: AnomalyId,
    pub name: String,
    pub category: TokenCategory,
    pub effects: Vec<AnomalyEffect>,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anomaly_def_round_trips_through_json() {
        let def = AnomalyDef {
            id: AnomalyId::from("storm"),
            name: "Storm".into(),
            category: TokenCategory::Negative,
            effects: vec![AnomalyEffect::ShiftEtherSlots { delta: -1 }],
            description: String::new(),
        };
        let json = serde_json::to_string(&def).unwrap();
        let back: AnomalyDef = serde_json::from_str(&json).unwrap();
        assert_eq!(def, back);
    }
}
