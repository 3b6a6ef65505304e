//! Assembled catalog with JSON overlay loading.
//!
//! Card/token/enemy/anomaly data is compiled in by default, looked up
//! through `get_x(id) -> Option<&'static XDef>` functions, but a host can
//! layer a JSON overlay on top so content can be added without a recompile.
//! Every def type derives plain `Deserialize` without `deny_unknown_fields`,
//! so fields a newer catalog file adds are silently ignored by an older
//! engine build rather than failing to parse.

use std::collections::BTreeMap;

use etherline_types::{AnomalyDef, AnomalyId, CardDef, CardId, CatalogError, EnemyDef, EnemyId, TokenDef, TokenId};
use serde::{Deserialize, Serialize};

use crate::{anomalies, cards, enemies, tokens};

/// The overlay file shape: any subset of the four catalogs, each a flat
/// array of full definitions. Absent arrays default to empty via `#[serde(default)]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogOverlay {
    #[serde(default)]
    pub cards: Vec<CardDef>,
    #[serde(default)]
    pub tokens: Vec<TokenDef>,
    #[serde(default)]
    pub enemies: Vec<EnemyDef>,
    #[serde(default)]
    pub anomalies: Vec<AnomalyDef>,
}

/// An assembled, host-extensible view of the four catalogs. Starts from the
/// compiled-in defaults (`Catalog::default`) and can have a JSON overlay
/// merged on top via `Catalog::merge`.
#[derive(Debug, Clone)]
pub struct Catalog {
    cards: BTreeMap<CardId, CardDef>,
    tokens: BTreeMap<TokenId, TokenDef>,
    enemies: BTreeMap<EnemyId, EnemyDef>,
    anomalies: BTreeMap<AnomalyId, AnomalyDef>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            cards: cards::all_cards().iter().cloned().map(|c| (c.id.clone(), c)).collect(),
            tokens: tokens::all_tokens().iter().cloned().map(|t| (t.id.clone(), t)).collect(),
            enemies: enemies::all_enemies().iter().cloned().map(|e| (e.id.clone(), e)).collect(),
            anomalies: anomalies::all_anomalies().iter().cloned().map(|a| (a.id.clone(), a)).collect(),
        }
    }
}

impl Catalog {
    /// Parses a JSON overlay and merges it onto the compiled-in defaults.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let overlay: CatalogOverlay =
            serde_json::from_str(json).map_err(|e| CatalogError::MalformedJson(e.to_string()))?;
        let mut catalog = Self::default();
        catalog.merge(overlay);
        Ok(catalog)
    }

    /// Overlays `overlay` onto `self`, inserting new ids and replacing any
    /// id the overlay redefines. A host wanting strict "extend only"
    /// semantics should check `contains_*` before calling this.
    pub fn merge(&mut self, overlay: CatalogOverlay) {
        for def in overlay.cards {
            self.cards.insert(def.id.clone(), def);
        }
        for def in overlay.tokens {
            self.tokens.insert(def.id.clone(), def);
        }
        for def in overlay.enemies {
            self.enemies.insert(def.id.clone(), def);
        }
        for def in overlay.anomalies {
            self.anomalies.insert(def.id.clone(), def);
        }
    }

    pub fn get_card(&self, id: &CardId) -> Option<&CardDef> {
        self.cards.get(id)
    }

    pub fn get_token(&self, id: &TokenId) -> Option<&TokenDef> {
        self.tokens.get(id)
    }

    pub fn get_enemy(&self, id: &EnemyId) -> Option<&EnemyDef> {
        self.enemies.get(id)
    }

    pub fn get_anomaly(&self, id: &AnomalyId) -> Option<&AnomalyDef> {
        self.anomalies.get(id)
    }

    /// Validates that every card's token references resolve within this
    /// catalog — called after loading an overlay so a typo in an overlay
    /// file surfaces as a `CatalogError` rather than a silent no-op at
    /// battle time.
    pub fn validate(&self) -> Result<(), CatalogError> {
        use etherline_types::CardEffect;
        for card in self.cards.values() {
            for effect in &card.effects {
                let referenced = match effect {
                    CardEffect::ApplyToken { token, .. } | CardEffect::RemoveToken { token, .. } => Some(token),
                    _ => None,
                };
                if let Some(token) = referenced {
                    if !self.tokens.contains_key(token) {
                        return Err(CatalogError::UnknownReference {
                            from: card.id.to_string(),
                            to: token.to_string(),
                        });
                    }
                }
            }
            for token in card.required_tokens.keys() {
                if !self.tokens.contains_key(token) {
                    return Err(CatalogError::UnknownReference { from: card.id.to_string(), to: token.to_string() });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_contains_built_in_strike() {
        let catalog = Catalog::default();
        assert!(catalog.get_card(&CardId::from("strike")).is_some());
    }

    #[test]
    fn from_json_overlays_a_new_card() {
        let json = r#"{
            "cards": [{
                "id": "nova",
                "name": "Nova",
                "category": "attack",
                "rarity": "rare",
                "base_speed_cost": 3,
                "traits": [],
                "special": null,
                "effects": [],
                "description": ""
            }]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert!(catalog.get_card(&CardId::from("nova")).is_some());
        // Built-ins remain present alongside the overlay.
        assert!(catalog.get_card(&CardId::from("strike")).is_some());
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = Catalog::from_json("not json").unwrap_err();
        matches!(err, CatalogError::MalformedJson(_));
    }

    #[test]
    fn unknown_fields_in_overlay_are_forward_compatible() {
        let json = r#"{
            "cards": [{
                "id": "future_card",
                "name": "Future Card",
                "category": "skill",
                "rarity": "common",
                "base_speed_cost": 1,
                "traits": [],
                "special": null,
                "effects": [],
                "description": "",
                "some_field_from_a_newer_schema": 42
            }]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert!(catalog.get_card(&CardId::from("future_card")).is_some());
    }

    #[test]
    fn validate_catches_dangling_token_reference() {
        use etherline_types::{CardCategory, CardEffect, EffectTarget, Rarity};

        let mut catalog = Catalog::default();
        catalog.merge(CatalogOverlay {
            cards: vec![CardDef {
                id: CardId::from("broken"),
                name: "Broken".into(),
                category: CardCategory::Skill,
                rarity: Rarity::Common,
                base_speed_cost: 1,
                action_cost: 1,
                traits: Default::default(),
                special: None,
                effects: vec![CardEffect::ApplyToken {
                    token: TokenId::from("does_not_exist"),
                    stacks: 1,
                    target: EffectTarget::Caster,
                }],
                cross_bonus: None,
                required_tokens: Default::default(),
                level: 0,
                description: String::new(),
            }],
            ..Default::default()
        });
        assert!(catalog.validate().is_err());
    }
}
