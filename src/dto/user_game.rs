use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::{
        entry_store::EntryOrder,
        models::{GameStatus, UserGameRecord},
    },
    dto::format_system_time,
};

/// Largest page size a listing request may ask for.
const MAX_PAGE_SIZE: u64 = 100;
/// Page size applied when the query omits one.
const DEFAULT_PAGE_SIZE: u64 = 50;
/// Longest accepted search string.
const MAX_SEARCH_LENGTH: usize = 256;

/// Raw query string for `GET /user-games`, before defaults are applied.
///
/// `statuses` is a comma-separated list (e.g. `backlog,in_progress`).
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UserGamesQueryParams {
    /// Comma-separated status filter.
    #[serde(default)]
    pub statuses: Option<String>,
    /// Title search term.
    #[serde(default)]
    pub search: Option<String>,
    /// Ordering field: `in_progress_position`, `updated_at`, or
    /// `popularity_score`.
    #[serde(default)]
    pub order_by: Option<String>,
    /// `asc` or `desc`.
    #[serde(default)]
    pub order_direction: Option<String>,
    /// 1-based page number.
    #[serde(default)]
    pub page: Option<u64>,
    /// Page size (1..=100).
    #[serde(default)]
    pub page_size: Option<u64>,
}

/// Parsed and defaulted listing query handed to the service layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserGamesQuery {
    /// Deduplicated status filter; empty means all statuses.
    pub statuses: Vec<GameStatus>,
    /// Normalized search term.
    pub search: Option<String>,
    /// Ordering field.
    pub order_by: EntryOrder,
    /// True for ascending order.
    pub ascending: bool,
    /// 1-based page number.
    pub page: u64,
    /// Rows per page.
    pub page_size: u64,
}

/// Error raised when listing query parameters cannot be interpreted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryParseError {
    /// A status value is not one of the known statuses.
    #[error("unknown status `{0}`")]
    UnknownStatus(String),
    /// The ordering field is not orderable.
    #[error("unknown order field `{0}`")]
    UnknownOrderField(String),
    /// The ordering direction is neither `asc` nor `desc`.
    #[error("unknown order direction `{0}`")]
    UnknownOrderDirection(String),
    /// Page number or page size is out of range.
    #[error("{0}")]
    PageOutOfRange(&'static str),
    /// The search term exceeds the accepted length.
    #[error("search must be {MAX_SEARCH_LENGTH} characters or fewer")]
    SearchTooLong,
}

impl UserGamesQueryParams {
    /// Apply defaults and validate every field.
    ///
    /// When the filter targets only `in_progress` and no explicit ordering
    /// was supplied, the queue ordering (ascending position) is used so the
    /// client receives the queue in rank order by default.
    pub fn into_query(self) -> Result<UserGamesQuery, QueryParseError> {
        let statuses = parse_statuses(self.statuses.as_deref())?;
        let search = normalize_search(self.search.as_deref())?;

        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(QueryParseError::PageOutOfRange("page must be at least 1"));
        }
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(QueryParseError::PageOutOfRange(
                "page_size must be between 1 and 100",
            ));
        }

        let only_in_progress =
            !statuses.is_empty() && statuses.iter().all(|s| *s == GameStatus::InProgress);

        let order_by = match self.order_by.as_deref() {
            None if only_in_progress => EntryOrder::InProgressPosition,
            None => EntryOrder::UpdatedAt,
            Some("in_progress_position") => EntryOrder::InProgressPosition,
            Some("updated_at") => EntryOrder::UpdatedAt,
            Some("popularity_score") => EntryOrder::PopularityScore,
            Some(other) => return Err(QueryParseError::UnknownOrderField(other.into())),
        };

        let ascending = match self.order_direction.as_deref() {
            Some("asc") => true,
            Some("desc") => false,
            None => order_by == EntryOrder::InProgressPosition,
            Some(other) => return Err(QueryParseError::UnknownOrderDirection(other.into())),
        };

        Ok(UserGamesQuery {
            statuses,
            search,
            order_by,
            ascending,
            page,
            page_size,
        })
    }
}

fn parse_statuses(raw: Option<&str>) -> Result<Vec<GameStatus>, QueryParseError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let mut statuses = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let status = match token {
            "backlog" => GameStatus::Backlog,
            "in_progress" => GameStatus::InProgress,
            "completed" => GameStatus::Completed,
            "removed" => GameStatus::Removed,
            other => return Err(QueryParseError::UnknownStatus(other.into())),
        };
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }

    Ok(statuses)
}

fn normalize_search(raw: Option<&str>) -> Result<Option<String>, QueryParseError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Ok(None);
    }
    if normalized.len() > MAX_SEARCH_LENGTH {
        return Err(QueryParseError::SearchTooLong);
    }

    Ok(Some(normalized))
}

/// Payload for `POST /user-games` (adding a game to the collection).
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserGameRequest {
    /// Catalog id of the game to add.
    pub game_id: u32,
    /// Initial status for the entry.
    pub status: GameStatus,
    /// Queue rank; required iff `status` is `in_progress`.
    #[serde(default)]
    pub in_progress_position: Option<i32>,
}

impl Validate for CreateUserGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_position_pairing(self.status, self.in_progress_position) {
            errors.add("in_progress_position", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload for `PATCH /user-games/{game_id}`.
///
/// `in_progress_position` distinguishes "field absent" from an explicit
/// `null` (which clears the position).
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserGameRequest {
    /// New status. Only `backlog` and `in_progress` may be targeted here;
    /// completion and removal have dedicated endpoints.
    #[serde(default)]
    pub status: Option<GameStatus>,
    /// New queue rank, or explicit `null` to clear it.
    #[serde(default, with = "serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub in_progress_position: Option<Option<i32>>,
    /// New unlocked-achievements count.
    #[serde(default)]
    pub achievements_unlocked: Option<u32>,
}

impl Validate for UpdateUserGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let has_any_field = self.status.is_some()
            || self.in_progress_position.is_some()
            || self.achievements_unlocked.is_some();
        if !has_any_field {
            let mut err = ValidationError::new("empty_update");
            err.message = Some("at least one field must be provided".into());
            errors.add("__all__", err);
        }

        if let Some(status) = self.status {
            if !matches!(status, GameStatus::Backlog | GameStatus::InProgress) {
                let mut err = ValidationError::new("status_not_patchable");
                err.message = Some(
                    "status can only be set to backlog or in_progress via this endpoint".into(),
                );
                errors.add("status", err);
            }

            if status == GameStatus::InProgress && self.in_progress_position == Some(None) {
                let mut err = ValidationError::new("position_required");
                err.message =
                    Some("in_progress_position is required when status is in_progress".into());
                errors.add("in_progress_position", err);
            }

            if status != GameStatus::InProgress {
                if let Some(Some(_)) = self.in_progress_position {
                    let mut err = ValidationError::new("position_forbidden");
                    err.message = Some(
                        "in_progress_position must be null unless status is in_progress".into(),
                    );
                    errors.add("in_progress_position", err);
                }
            }
        }

        if let Some(Some(position)) = self.in_progress_position {
            if position < 1 {
                let mut err = ValidationError::new("position_range");
                err.message = Some("in_progress_position must be at least 1".into());
                errors.add("in_progress_position", err);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload for `POST /user-games/{game_id}/complete`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CompleteUserGameRequest {
    /// Final unlocked-achievements count, if the client knows it.
    #[serde(default)]
    pub achievements_unlocked: Option<u32>,
}

/// One target slot in a reorder submission.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReorderItem {
    /// Catalog id of the in-progress game.
    pub game_id: u32,
    /// Target queue rank (1-based).
    pub position: i32,
}

/// Payload for `PATCH /user-games/reorder`: the full target ordering of the
/// user's in-progress queue.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderRequest {
    /// Every in-progress entry with its target position.
    pub items: Vec<ReorderItem>,
}

impl Validate for ReorderRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.items.is_empty() {
            let mut err = ValidationError::new("items_empty");
            err.message = Some("items must contain at least one entry".into());
            errors.add("items", err);
        }

        let mut seen_games = HashSet::new();
        let mut seen_positions = HashSet::new();
        for item in &self.items {
            if !seen_games.insert(item.game_id) {
                let mut err = ValidationError::new("duplicate_game_id");
                err.message = Some(format!("game_id {} appears twice", item.game_id).into());
                errors.add("items", err);
            }
            if item.position < 1 {
                let mut err = ValidationError::new("position_range");
                err.message = Some("position must be at least 1".into());
                errors.add("items", err);
            } else if !seen_positions.insert(item.position) {
                let mut err = ValidationError::new("duplicate_position");
                err.message = Some(format!("position {} appears twice", item.position).into());
                errors.add("items", err);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// One user-game entry as exposed to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserGameDto {
    /// Catalog id of the game.
    pub game_id: u32,
    /// Catalog title.
    pub title: String,
    /// Catalog slug.
    pub slug: String,
    /// Current play status.
    pub status: GameStatus,
    /// Queue rank; present iff status is `in_progress`.
    pub in_progress_position: Option<i32>,
    /// Unlocked achievements.
    pub achievements_unlocked: u32,
    /// RFC 3339 completion timestamp.
    pub completed_at: Option<String>,
    /// RFC 3339 creation timestamp.
    pub imported_at: String,
    /// RFC 3339 last-mutation timestamp.
    pub updated_at: String,
    /// RFC 3339 soft-removal timestamp.
    pub removed_at: Option<String>,
    /// Catalog popularity score.
    pub popularity_score: i64,
}

impl From<UserGameRecord> for UserGameDto {
    fn from(record: UserGameRecord) -> Self {
        let UserGameRecord { entry, game } = record;
        Self {
            game_id: entry.game_id,
            title: game.title,
            slug: game.slug,
            status: entry.status,
            in_progress_position: entry.in_progress_position,
            achievements_unlocked: entry.achievements_unlocked,
            completed_at: entry.completed_at.map(format_system_time),
            imported_at: format_system_time(entry.imported_at),
            updated_at: format_system_time(entry.updated_at),
            removed_at: entry.removed_at.map(format_system_time),
            popularity_score: game.popularity_score,
        }
    }
}

/// Paginated listing of a user's entries.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserGamesListDto {
    /// 1-based page number served.
    pub page: u64,
    /// Page size used.
    pub page_size: u64,
    /// Exact number of entries matching the filter.
    pub total: u64,
    /// Entries for this page.
    pub results: Vec<UserGameDto>,
}

/// Result of a reorder operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReorderResultDto {
    /// Number of rows whose final position was written.
    pub updated: u64,
}

fn validate_position_pairing(
    status: GameStatus,
    position: Option<i32>,
) -> Result<(), ValidationError> {
    match (status, position) {
        (GameStatus::InProgress, None) => {
            let mut err = ValidationError::new("position_required");
            err.message =
                Some("in_progress_position is required when status is in_progress".into());
            Err(err)
        }
        (GameStatus::InProgress, Some(position)) if position < 1 => {
            let mut err = ValidationError::new("position_range");
            err.message = Some("in_progress_position must be at least 1".into());
            Err(err)
        }
        (status, Some(_)) if status != GameStatus::InProgress => {
            let mut err = ValidationError::new("position_forbidden");
            err.message =
                Some("in_progress_position must be null unless status is in_progress".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_to_updated_at_descending() {
        let query = UserGamesQueryParams::default().into_query().unwrap();
        assert_eq!(query.order_by, EntryOrder::UpdatedAt);
        assert!(!query.ascending);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn in_progress_only_filter_defaults_to_queue_order() {
        let query = UserGamesQueryParams {
            statuses: Some("in_progress".into()),
            ..Default::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.order_by, EntryOrder::InProgressPosition);
        assert!(query.ascending);
    }

    #[test]
    fn statuses_are_deduplicated() {
        let query = UserGamesQueryParams {
            statuses: Some("backlog,backlog,completed".into()),
            ..Default::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.statuses, vec![GameStatus::Backlog, GameStatus::Completed]);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = UserGamesQueryParams {
            statuses: Some("paused".into()),
            ..Default::default()
        }
        .into_query()
        .unwrap_err();
        assert_eq!(err, QueryParseError::UnknownStatus("paused".into()));
    }

    #[test]
    fn search_is_whitespace_normalized() {
        let query = UserGamesQueryParams {
            search: Some("  deep   rock  ".into()),
            ..Default::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.search.as_deref(), Some("deep rock"));
    }

    #[test]
    fn page_size_above_cap_is_rejected() {
        let err = UserGamesQueryParams {
            page_size: Some(101),
            ..Default::default()
        }
        .into_query()
        .unwrap_err();
        assert!(matches!(err, QueryParseError::PageOutOfRange(_)));
    }

    #[test]
    fn create_requires_position_for_in_progress() {
        let request = CreateUserGameRequest {
            game_id: 7,
            status: GameStatus::InProgress,
            in_progress_position: None,
        };
        assert!(request.validate().is_err());

        let request = CreateUserGameRequest {
            game_id: 7,
            status: GameStatus::InProgress,
            in_progress_position: Some(1),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn create_rejects_position_outside_in_progress() {
        let request = CreateUserGameRequest {
            game_id: 7,
            status: GameStatus::Backlog,
            in_progress_position: Some(1),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn update_requires_at_least_one_field() {
        assert!(UpdateUserGameRequest::default().validate().is_err());
    }

    #[test]
    fn update_rejects_completed_status() {
        let request = UpdateUserGameRequest {
            status: Some(GameStatus::Completed),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn update_rejects_null_position_with_in_progress() {
        let request = UpdateUserGameRequest {
            status: Some(GameStatus::InProgress),
            in_progress_position: Some(None),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn reorder_rejects_duplicate_positions() {
        let request = ReorderRequest {
            items: vec![
                ReorderItem {
                    game_id: 1,
                    position: 1,
                },
                ReorderItem {
                    game_id: 2,
                    position: 1,
                },
            ],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn reorder_rejects_duplicate_game_ids() {
        let request = ReorderRequest {
            items: vec![
                ReorderItem {
                    game_id: 1,
                    position: 1,
                },
                ReorderItem {
                    game_id: 1,
                    position: 2,
                },
            ],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn double_option_distinguishes_null_from_absent() {
        let absent: UpdateUserGameRequest =
            serde_json::from_str(r#"{"status":"backlog"}"#).unwrap();
        assert_eq!(absent.in_progress_position, None);

        let null: UpdateUserGameRequest =
            serde_json::from_str(r#"{"status":"backlog","in_progress_position":null}"#).unwrap();
        assert_eq!(null.in_progress_position, Some(None));

        let set: UpdateUserGameRequest =
            serde_json::from_str(r#"{"status":"in_progress","in_progress_position":2}"#).unwrap();
        assert_eq!(set.in_progress_position, Some(Some(2)));
    }
}
