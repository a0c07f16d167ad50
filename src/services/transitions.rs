//! Status transition rules for user-game entries.
//!
//! The graph is deliberately small: `removed` is terminal, `completed` can
//! only go back to the backlog, and the in-progress queue is entered from
//! the backlog only. Identity transitions are always permitted so in-place
//! field updates (achievement counts) do not need a separate code path.

use thiserror::Error;

use crate::dao::models::GameStatus;

/// Error returned when a requested status change is not in the allowed graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("status {from} cannot transition to {to}")]
pub struct InvalidTransition {
    /// Status the entry currently holds.
    pub from: GameStatus,
    /// Status the caller requested.
    pub to: GameStatus,
}

/// Whether `from -> to` is an allowed transition.
pub fn is_allowed(from: GameStatus, to: GameStatus) -> bool {
    if from == to {
        return true;
    }

    match (from, to) {
        (GameStatus::Backlog, GameStatus::InProgress) => true,
        (GameStatus::Backlog, GameStatus::Removed) => true,
        (GameStatus::InProgress, GameStatus::Completed) => true,
        (GameStatus::InProgress, GameStatus::Backlog) => true,
        (GameStatus::Completed, GameStatus::Backlog) => true,
        // `removed` is terminal.
        _ => false,
    }
}

/// Validate `from -> to`, returning the transition error on rejection.
pub fn ensure_allowed(from: GameStatus, to: GameStatus) -> Result<(), InvalidTransition> {
    if is_allowed(from, to) {
        Ok(())
    } else {
        Err(InvalidTransition { from, to })
    }
}

/// Whether an entry in `from` may be marked completed.
pub fn can_complete(from: GameStatus) -> bool {
    matches!(from, GameStatus::Backlog | GameStatus::InProgress)
}

/// Whether an entry in `from` may be soft-removed.
///
/// Removal is permitted from every non-terminal status; removing an entry
/// that is already `removed` is rejected.
pub fn can_remove(from: GameStatus) -> bool {
    from != GameStatus::Removed
}
