//! Abstraction over the HTTP API as seen from a client session.
//!
//! View models talk to this trait rather than to a concrete transport, so
//! tests can drive them against an in-process implementation.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::dto::game::{GamesListDto, GamesQueryParams};
use crate::dto::user_game::{
    CompleteUserGameRequest, CreateUserGameRequest, ReorderRequest, ReorderResultDto,
    UpdateUserGameRequest, UserGameDto, UserGamesListDto, UserGamesQueryParams,
};

/// Classified API failure, derived from the server's stable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Target (user, game) entry does not exist.
    EntryNotFound,
    /// Referenced catalog game does not exist.
    GameNotFound,
    /// Requested status change is not in the allowed graph.
    InvalidStatusTransition,
    /// The in-progress queue is full.
    InProgressCapReached,
    /// Position/status pairing rule violated.
    PositionRequiredForInProgress,
    /// Queue position collided with another entry.
    DuplicatePositions,
    /// Reorder submission does not match the stored queue.
    QueueMismatch,
    /// The (user, game) entry already exists.
    DuplicateEntry,
    /// Payload failed validation or a value bound.
    InvalidPayload,
    /// Session token missing, invalid, or expired.
    Unauthorized,
    /// Request quota exhausted.
    RateLimited,
    /// Server-side failure (5xx).
    Server,
    /// The request never reached the server.
    Network,
}

/// Rate-limit quota state reported by the server on every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitMetadata {
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Epoch second at which the window resets.
    pub reset: u64,
    /// Seconds to wait before retrying; present only on 429.
    pub retry_after: Option<u64>,
}

/// A failed API call, carrying everything a view model needs to react.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    /// Classified failure kind.
    pub kind: ApiErrorKind,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Server-provided (or transport) message.
    pub message: String,
    /// Quota headers from the failing response, when present.
    pub rate_limit: Option<RateLimitMetadata>,
}

impl ApiError {
    /// Classify a received error response from its status and stable code.
    pub fn from_response(
        status: u16,
        code: &str,
        message: impl Into<String>,
        rate_limit: Option<RateLimitMetadata>,
    ) -> Self {
        let kind = match code {
            "EntryNotFound" => ApiErrorKind::EntryNotFound,
            "NotFound" => ApiErrorKind::GameNotFound,
            "InvalidStatusTransition" => ApiErrorKind::InvalidStatusTransition,
            "InProgressCapReached" => ApiErrorKind::InProgressCapReached,
            "PositionRequiredForInProgress" => ApiErrorKind::PositionRequiredForInProgress,
            "DuplicatePositions" => ApiErrorKind::DuplicatePositions,
            "QueueMismatch" => ApiErrorKind::QueueMismatch,
            "DuplicateEntry" => ApiErrorKind::DuplicateEntry,
            "RateLimited" => ApiErrorKind::RateLimited,
            "Unauthorized" => ApiErrorKind::Unauthorized,
            _ if status >= 500 => ApiErrorKind::Server,
            _ => ApiErrorKind::InvalidPayload,
        };
        Self {
            kind,
            status: Some(status),
            message: message.into(),
            rate_limit,
        }
    }

    /// A transport-level failure with no server response.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            status: None,
            message: message.into(),
            rate_limit: None,
        }
    }

    /// Copy to surface to the user. Capacity and conflict errors get
    /// actionable text; everything else gets a generic retry message.
    pub fn user_message(&self) -> String {
        match self.kind {
            ApiErrorKind::InProgressCapReached => {
                "Your in-progress queue is full. Finish or remove a game first.".into()
            }
            ApiErrorKind::QueueMismatch => {
                "Your queue changed somewhere else. Refresh and try again.".into()
            }
            ApiErrorKind::DuplicateEntry => "That game is already in your collection.".into(),
            ApiErrorKind::RateLimited => match self.retry_after() {
                Some(seconds) => format!("Too many requests. Try again in {seconds}s."),
                None => "Too many requests. Try again shortly.".into(),
            },
            _ => "Something went wrong. Please try again.".into(),
        }
    }

    /// Seconds to wait before retrying, when the server said so.
    pub fn retry_after(&self) -> Option<u64> {
        self.rate_limit.and_then(|meta| meta.retry_after)
    }
}

/// Result of an API call.
pub type ApiResult<T> = Result<T, ApiError>;

/// The server operations the view models depend on.
pub trait UserGamesApi: Send + Sync {
    /// `GET /user-games`.
    fn list_user_games(
        &self,
        params: UserGamesQueryParams,
    ) -> BoxFuture<'static, ApiResult<UserGamesListDto>>;

    /// `POST /user-games`.
    fn create_user_game(
        &self,
        request: CreateUserGameRequest,
    ) -> BoxFuture<'static, ApiResult<UserGameDto>>;

    /// `PATCH /user-games/{game_id}`.
    fn update_user_game(
        &self,
        game_id: u32,
        request: UpdateUserGameRequest,
    ) -> BoxFuture<'static, ApiResult<UserGameDto>>;

    /// `POST /user-games/{game_id}/complete`.
    fn complete_user_game(
        &self,
        game_id: u32,
        request: CompleteUserGameRequest,
    ) -> BoxFuture<'static, ApiResult<UserGameDto>>;

    /// `DELETE /user-games/{game_id}`.
    fn remove_user_game(&self, game_id: u32) -> BoxFuture<'static, ApiResult<()>>;

    /// `PATCH /user-games/reorder`.
    fn reorder_in_progress(
        &self,
        request: ReorderRequest,
    ) -> BoxFuture<'static, ApiResult<ReorderResultDto>>;

    /// `GET /games`.
    fn search_games(&self, params: GamesQueryParams)
    -> BoxFuture<'static, ApiResult<GamesListDto>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_classify_to_kinds() {
        let err = ApiError::from_response(409, "InProgressCapReached", "full", None);
        assert_eq!(err.kind, ApiErrorKind::InProgressCapReached);

        let err = ApiError::from_response(500, "StorageFailed", "oops", None);
        assert_eq!(err.kind, ApiErrorKind::Server);

        let err = ApiError::from_response(400, "whatever", "bad", None);
        assert_eq!(err.kind, ApiErrorKind::InvalidPayload);
    }

    #[test]
    fn rate_limited_message_surfaces_retry_timing() {
        let err = ApiError::from_response(
            429,
            "RateLimited",
            "slow down",
            Some(RateLimitMetadata {
                limit: 60,
                remaining: 0,
                reset: 0,
                retry_after: Some(12),
            }),
        );
        assert_eq!(err.retry_after(), Some(12));
        assert!(err.user_message().contains("12s"));
    }
}
