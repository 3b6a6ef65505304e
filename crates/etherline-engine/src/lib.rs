//! The battle resolution engine: token application, damage calculation,
//! combo detection, ether accrual, the timeline scheduler, the enemy
//! planner, and the `Battle` state machine that sequences them.
//!
//! Every computational module (`token_engine`, `damage_pipeline`, `combo`,
//! `ether`, `scheduler`, `enemy_planner`) is pure — it takes state by
//! reference and returns a result value, never mutating hidden state or
//! reaching for global randomness. `battle` is the only module that owns
//! mutable state and sequences calls into the others; `command_log` is its
//! append-only event sink and `view` is the read-only projection a host
//! renders from.

pub mod battle;
pub mod combo;
pub mod command_log;
pub mod damage_pipeline;
pub mod enemy_planner;
pub mod ether;
pub mod scheduler;
pub mod token_engine;
pub mod view;

pub use battle::{Battle, StepOutcome};
pub use command_log::CommandLog;
pub use view::{snapshot, BattleSnapshot, EnemyUnitView};
