//! Error types for the public engine API.
//!
//! Plain closed enums, matched exhaustively by callers — the same shape the
//! teacher's own `CombatError`/`CardPlayError` use internally. Because these
//! types sit at this workspace's public API boundary (rather than an
//! internal-only one), they additionally implement `Display` and
//! `std::error::Error` so callers outside the workspace can use them with
//! `?` through their own error types; no `thiserror`/`anyhow` is pulled in
//! for what remains a small, closed set of variants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::CardUid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionError {
    CardNotInHand(CardUid),
    TooManyCardsSubmitted { max: u8, attempted: u8 },
    OverSpeedBudget { max: u32, attempted: u32 },
    OverActionBudget { max: u32, attempted: u32 },
    WrongPhaseForSelection,
    NoPendingSelection,
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::CardNotInHand(uid) => write!(f, "card {} is not in hand", uid.0),
            SelectionError::TooManyCardsSubmitted { max, attempted } => {
                write!(f, "submitted {attempted} cards, maximum is {max}")
            }
            SelectionError::OverSpeedBudget { max, attempted } => {
                write!(f, "submitted cards sum to {attempted} speed cost, maximum is {max}")
            }
            SelectionError::OverActionBudget { max, attempted } => {
                write!(f, "submitted cards sum to {attempted} action cost, maximum is {max}")
            }
            SelectionError::WrongPhaseForSelection => write!(f, "battle is not awaiting a card selection"),
            SelectionError::NoPendingSelection => write!(f, "no pending selection to respond to"),
        }
    }
}

impl std::error::Error for SelectionError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseError {
    UnexpectedPhase { expected: &'static str, actual: &'static str },
    BattleAlreadyOver,
}

impl fmt::Display for PhaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseError::UnexpectedPhase { expected, actual } => {
                write!(f, "expected phase {expected}, battle is in {actual}")
            }
            PhaseError::BattleAlreadyOver => write!(f, "battle has already concluded"),
        }
    }
}

impl std::error::Error for PhaseError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewindError {
    NoSnapshotAvailable,
    AlreadyUsedThisTurn,
}

impl fmt::Display for RewindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewindError::NoSnapshotAvailable => write!(f, "no snapshot is available to rewind to"),
            RewindError::AlreadyUsedThisTurn => write!(f, "rewind has already been used this turn"),
        }
    }
}

impl std::error::Error for RewindError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubSelectError {
    QueueEmpty,
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for SubSelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubSelectError::QueueEmpty => write!(f, "sub-selection queue is empty"),
            SubSelectError::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for {len} options")
            }
        }
    }
}

impl std::error::Error for SubSelectError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogError {
    MalformedJson(String),
    DuplicateId(String),
    UnknownReference { from: String, to: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::MalformedJson(msg) => write!(f, "malformed catalog json: {msg}"),
            CatalogError::DuplicateId(id) => write!(f, "duplicate catalog id: {id}"),
            CatalogError::UnknownReference { from, to } => {
                write!(f, "{from} references unknown id {to}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_human_readable() {
        let e = SelectionError::TooManyCardsSubmitted { max: 3, attempted: 5 };
        assert_eq!(e.to_string(), "submitted 5 cards, maximum is 3");
    }

    #[test]
    fn over_action_budget_display_names_both_values() {
        let e = SelectionError::OverActionBudget { max: 6, attempted: 9 };
        assert_eq!(e.to_string(), "submitted cards sum to 9 action cost, maximum is 6");
    }

    #[test]
    fn catalog_error_display_names_both_ids() {
        let e = CatalogError::UnknownReference { from: "strike".into(), to: "ghost_token".into() };
        assert_eq!(e.to_string(), "strike references unknown id ghost_token");
    }
}
