use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dao::models::GameEntity;

/// Largest page size the catalog listing accepts.
const MAX_PAGE_SIZE: u64 = 100;
/// Default catalog page size.
const DEFAULT_PAGE_SIZE: u64 = 20;

/// Query string for `GET /games`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GamesQueryParams {
    /// Title search term.
    #[serde(default)]
    pub search: Option<String>,
    /// 1-based page number.
    #[serde(default)]
    pub page: Option<u64>,
    /// Page size (1..=100).
    #[serde(default)]
    pub page_size: Option<u64>,
}

impl GamesQueryParams {
    /// Page number with the default applied, clamped to at least 1.
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size with the default applied, clamped to the accepted range.
    pub fn page_size(&self) -> u64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Trimmed search term, if non-empty.
    pub fn search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Into::into)
    }
}

/// One catalog game as exposed to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogGameDto {
    /// Stable catalog identifier.
    pub game_id: u32,
    /// Display title.
    pub title: String,
    /// URL-friendly identifier.
    pub slug: String,
    /// Relative popularity used for default ordering.
    pub popularity_score: i64,
    /// Total achievement count, when known.
    pub achievements_total: Option<u32>,
}

impl From<GameEntity> for CatalogGameDto {
    fn from(game: GameEntity) -> Self {
        Self {
            game_id: game.game_id,
            title: game.title,
            slug: game.slug,
            popularity_score: game.popularity_score,
            achievements_total: game.achievements_total,
        }
    }
}

/// Paginated catalog listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct GamesListDto {
    /// 1-based page number served.
    pub page: u64,
    /// Page size used.
    pub page_size: u64,
    /// Exact number of games matching the query.
    pub total: u64,
    /// Games for this page, most popular first.
    pub results: Vec<CatalogGameDto>,
}
