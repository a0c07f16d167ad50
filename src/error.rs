use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{
    dao::storage::{StorageError, UNIQUE_IN_PROGRESS_POSITION, UNIQUE_USER_GAME},
    services::transitions::InvalidTransition,
};

/// Errors that can occur in service layer operations.
///
/// Each variant carries a stable machine-readable code (see
/// [`ServiceError::code`]) that is surfaced verbatim in HTTP error bodies so
/// clients can branch on it.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed; the cause is retained for logging only.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Target (user, game) row does not exist.
    #[error("user game not found")]
    EntryNotFound,
    /// Referenced catalog game does not exist.
    #[error("game not found")]
    GameNotFound,
    /// Requested status change is not in the allowed graph.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// The user already has the maximum number of in-progress entries.
    #[error("in-progress queue is full (cap {cap})")]
    InProgressCapReached {
        /// Maximum simultaneous in-progress entries.
        cap: u32,
    },
    /// The position/status pairing invariant was violated at the boundary.
    #[error("{0}")]
    PositionRule(&'static str),
    /// A queue position collided with another entry's position.
    #[error("conflicting in-progress positions")]
    DuplicatePositions,
    /// Reorder payload does not match the stored in-progress membership.
    #[error("submitted items do not match the current in-progress queue")]
    QueueMismatch,
    /// The (user, game) entry already exists.
    #[error("user game already exists")]
    DuplicateEntry,
    /// Payload violates a value bound (e.g. achievements above the total).
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl ServiceError {
    /// Stable error code surfaced to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Unavailable(_) => "StorageFailed",
            ServiceError::EntryNotFound => "EntryNotFound",
            ServiceError::GameNotFound => "NotFound",
            ServiceError::InvalidTransition(_) => "InvalidStatusTransition",
            ServiceError::InProgressCapReached { .. } => "InProgressCapReached",
            ServiceError::PositionRule(_) => "PositionRequiredForInProgress",
            ServiceError::DuplicatePositions => "DuplicatePositions",
            ServiceError::QueueMismatch => "QueueMismatch",
            ServiceError::DuplicateEntry => "DuplicateEntry",
            ServiceError::InvalidPayload(_) => "InvalidPayload",
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UniqueViolation {
                constraint: UNIQUE_USER_GAME,
            } => ServiceError::DuplicateEntry,
            StorageError::UniqueViolation {
                constraint: UNIQUE_IN_PROGRESS_POSITION,
            } => ServiceError::DuplicatePositions,
            other => ServiceError::Unavailable(other),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {message}")]
    BadRequest {
        /// Stable error code.
        code: &'static str,
        /// Human-readable explanation.
        message: String,
    },
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {message}")]
    NotFound {
        /// Stable error code.
        code: &'static str,
        /// Human-readable explanation.
        message: String,
    },
    /// Conflict with current server-side state.
    #[error("conflict: {message}")]
    Conflict {
        /// Stable error code.
        code: &'static str,
        /// Human-readable explanation.
        message: String,
    },
    /// Semantically invalid operation on an existing resource.
    #[error("unprocessable: {message}")]
    Unprocessable {
        /// Stable error code.
        code: &'static str,
        /// Human-readable explanation.
        message: String,
    },
    /// Internal server error; details stay in the logs.
    #[error("internal error")]
    Internal {
        /// Stable error code.
        code: &'static str,
    },
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest {
            code: "InvalidPayload",
            message: format!("validation failed: {err}"),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let code = err.code();
        match err {
            ServiceError::Unavailable(source) => {
                error!(error = %source, cause = ?source, "storage operation failed");
                AppError::Internal { code }
            }
            ServiceError::EntryNotFound | ServiceError::GameNotFound => AppError::NotFound {
                code,
                message: err.to_string(),
            },
            ServiceError::InvalidTransition(invalid) => AppError::Unprocessable {
                code,
                message: invalid.to_string(),
            },
            ServiceError::InProgressCapReached { .. }
            | ServiceError::QueueMismatch
            | ServiceError::DuplicateEntry => AppError::Conflict {
                code,
                message: err.to_string(),
            },
            ServiceError::PositionRule(_)
            | ServiceError::DuplicatePositions
            | ServiceError::InvalidPayload(_) => AppError::BadRequest {
                code,
                message: err.to_string(),
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, "Unauthorized", message),
            AppError::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message),
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, code, message),
            AppError::Unprocessable { code, message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, code, message)
            }
            AppError::Internal { code } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                code,
                "Unable to process the request at this time.".into(),
            ),
        };

        let payload = Json(ErrorBody { code, message });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::GameStatus;

    #[test]
    fn unique_violations_map_by_constraint() {
        let entry_dup = ServiceError::from(StorageError::UniqueViolation {
            constraint: UNIQUE_USER_GAME,
        });
        assert!(matches!(entry_dup, ServiceError::DuplicateEntry));

        let position_dup = ServiceError::from(StorageError::UniqueViolation {
            constraint: UNIQUE_IN_PROGRESS_POSITION,
        });
        assert!(matches!(position_dup, ServiceError::DuplicatePositions));
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ServiceError::EntryNotFound.code(), "EntryNotFound");
        assert_eq!(ServiceError::QueueMismatch.code(), "QueueMismatch");
        assert_eq!(
            ServiceError::InvalidTransition(InvalidTransition {
                from: GameStatus::Removed,
                to: GameStatus::Backlog,
            })
            .code(),
            "InvalidStatusTransition"
        );
        assert_eq!(
            ServiceError::PositionRule("x").code(),
            "PositionRequiredForInProgress"
        );
    }

    #[test]
    fn transition_errors_are_unprocessable() {
        let app: AppError = ServiceError::InvalidTransition(InvalidTransition {
            from: GameStatus::Completed,
            to: GameStatus::InProgress,
        })
        .into();
        assert!(matches!(app, AppError::Unprocessable { .. }));
    }
}
