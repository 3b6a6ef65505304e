//! Static catalogs for cards, tokens, enemies, and anomalies, plus a
//! JSON-overlay-capable `Catalog` for hosts that want to extend the
//! built-in data without a recompile.

pub mod anomalies;
pub mod cards;
pub mod catalog;
pub mod enemies;
pub mod tokens;

pub use anomalies::{all_anomalies, get_anomaly};
pub use cards::{all_cards, get_card};
pub use catalog::{Catalog, CatalogOverlay};
pub use enemies::{all_enemies, get_enemy};
pub use tokens::{all_tokens, get_token};
