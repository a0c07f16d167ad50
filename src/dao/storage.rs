use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying engine.
///
/// Uniqueness violations are reported distinctly so the service layer can map
/// them to domain errors (duplicate entry, conflicting queue positions)
/// instead of a generic failure.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached or rejected the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying backend error, retained for logging.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A write collided with a unique constraint.
    #[error("unique constraint `{constraint}` violated")]
    UniqueViolation {
        /// Name of the violated constraint.
        constraint: &'static str,
    },
}

/// Unique constraint over a user's `(user_id, game_id)` pair.
pub const UNIQUE_USER_GAME: &str = "user_games_user_id_game_id_key";
/// Unique constraint over a user's `(user_id, in_progress_position)` pair.
pub const UNIQUE_IN_PROGRESS_POSITION: &str = "user_games_user_id_in_progress_position_key";

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Whether this error is a uniqueness-constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StorageError::UniqueViolation { .. })
    }
}
