//! Core data types for the battle resolution engine.
//!
//! This crate is data-only: no resolution logic lives here, only the shapes
//! that `etherline-data` catalogs and `etherline-engine` operates on.

pub mod anomaly;
pub mod card;
pub mod combatant;
pub mod enums;
pub mod error;
pub mod event;
pub mod ids;
pub mod rng;
pub mod spec;
pub mod state;
pub mod token;

pub use anomaly::{AnomalyDef, AnomalyEffect};
pub use card::{CardDef, CardEffect, CardRuntimeFlags, EffectTarget, RuntimeCardInstance};
pub use combatant::{EnemyDef, EnemyPlan, EnemyUnit, PlayerCombatant, MAX_PLAN_INTENTS};
pub use enums::{
    Actor, BattlePhase, CardCategory, CardTrait, ComboName, CrossBonus, DamageElement, EnemyMode, PlanOrigin,
    Rarity, SpecialCardKind, TokenCategory, TokenDuration,
};
pub use error::{CatalogError, PhaseError, RewindError, SelectionError, SubSelectError};
pub use event::{DamageSource, Event};
pub use ids::{AnomalyId, CardId, CardUid, CardUidGen, EnemyId, EnemyUnitId, TokenId};
pub use rng::RngState;
pub use spec::{BattleConfig, EncounterSpec};
pub use state::{
    BattleState, ComboUsage, DeflationState, PendingQueue, PendingSelection, PendingSelectionKind,
    TimelineEntry, MAX_DEFERRED_SELECTIONS,
};
pub use token::{add_stacks, add_stacks_with_cancellation, get_stacks, has, remove_stacks, TokenDef, TokenMap};
