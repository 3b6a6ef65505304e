//! Branded/newtype ID types for type safety.
//!
//! Each catalog ID wraps a `Box<str>` for cheap cloning and a small struct
//! size. Runtime-only identifiers (`CardUid`, `EnemyUnitId`) are plain
//! integers instead — they are never looked up in a catalog, only compared.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Box<str>);

        impl $name {
            pub fn new(s: impl Into<Box<str>>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.into())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s.into_boxed_str())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Catalog identifier for a card definition.
    CardId
);

define_id!(
    /// Catalog identifier for a token definition.
    TokenId
);

define_id!(
    /// Catalog identifier for an enemy group definition.
    EnemyId
);

define_id!(
    /// Catalog identifier for an anomaly definition.
    AnomalyId
);

/// Runtime-only identifier for one instance of a card in play.
///
/// Distinct from `CardId`: many `RuntimeCardInstance`s can share one
/// `CardId` (e.g. two copies of `Strike` drawn in the same hand). Never
/// looked up in a catalog — only ever compared for identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardUid(pub u64);

/// Runtime identifier for one enemy unit within a combat encounter,
/// displayed as `"enemy_0"`, `"enemy_1"`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnemyUnitId(pub u32);

impl std::fmt::Display for EnemyUnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "enemy_{}", self.0)
    }
}

/// Monotonic issuer for `CardUid`s, one per `Battle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardUidGen(u64);

impl CardUidGen {
    pub fn next(&mut self) -> CardUid {
        let id = CardUid(self.0);
        self.0 += 1;
        id
    }
}
