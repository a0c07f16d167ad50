pub mod memory;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{GameEntity, GameStatus, UserGameEntity, UserGameRecord};
use crate::dao::storage::StorageResult;

/// Field a user-games listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrder {
    /// Ascending/descending by in-progress queue position.
    InProgressPosition,
    /// By last mutation timestamp.
    UpdatedAt,
    /// By the catalog game's popularity score.
    PopularityScore,
}

/// Equality/search filters plus ordering and pagination for entry listings.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    /// Restrict to these statuses; empty means all statuses.
    pub statuses: Vec<GameStatus>,
    /// Case-insensitive title search against the joined catalog game.
    pub search: Option<String>,
    /// Ordering field.
    pub order_by: EntryOrder,
    /// True for ascending order.
    pub ascending: bool,
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
}

/// Partial update applied to a single user-game row.
///
/// `None` leaves a column untouched; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    /// New status, if changing.
    pub status: Option<GameStatus>,
    /// New queue position (or explicit clear).
    pub in_progress_position: Option<Option<i32>>,
    /// New unlocked-achievements count.
    pub achievements_unlocked: Option<u32>,
    /// New completion timestamp (or explicit clear).
    pub completed_at: Option<Option<SystemTime>>,
    /// New removal timestamp (or explicit clear).
    pub removed_at: Option<Option<SystemTime>>,
}

/// A page of user-game rows together with the exact unpaginated total.
#[derive(Debug, Clone)]
pub struct EntryPage {
    /// Rows for the requested window, joined with their catalog games.
    pub records: Vec<UserGameRecord>,
    /// Exact number of rows matching the filter.
    pub total: u64,
}

/// Simple catalog listing query.
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    /// Case-insensitive title substring.
    pub search: Option<String>,
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
}

/// A page of catalog games with the exact total.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    /// Games for the requested window, ordered by descending popularity.
    pub games: Vec<GameEntity>,
    /// Exact number of games matching the query.
    pub total: u64,
}

/// Abstraction over the persistence layer for user-game entries and the
/// game catalog.
///
/// The store supports equality-filtered reads and single-row writes only;
/// there are no multi-statement transactions. Uniqueness constraints on
/// `(user_id, game_id)` and `(user_id, in_progress_position)` are enforced
/// eagerly on every write and surface as
/// [`StorageError::UniqueViolation`](crate::dao::storage::StorageError).
pub trait UserGameStore: Send + Sync {
    /// List a user's entries matching `filter`, joined with catalog games.
    fn list_entries(
        &self,
        user_id: Uuid,
        filter: EntryFilter,
    ) -> BoxFuture<'static, StorageResult<EntryPage>>;

    /// Fetch one entry (joined with its game) by owner and game id.
    fn find_entry(
        &self,
        user_id: Uuid,
        game_id: u32,
    ) -> BoxFuture<'static, StorageResult<Option<UserGameRecord>>>;

    /// All of a user's in-progress entries, unordered.
    fn list_in_progress(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<UserGameEntity>>>;

    /// Number of the user's entries currently in progress.
    fn count_in_progress(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;

    /// Insert a new entry, returning the stored row.
    fn insert_entry(
        &self,
        entry: UserGameEntity,
    ) -> BoxFuture<'static, StorageResult<UserGameRecord>>;

    /// Apply `patch` to the row identified by `(user_id, game_id)`,
    /// optionally requiring the row to currently be in `require_status`.
    /// Returns the number of affected rows (0 or 1).
    fn update_entry(
        &self,
        user_id: Uuid,
        game_id: u32,
        require_status: Option<GameStatus>,
        patch: EntryPatch,
    ) -> BoxFuture<'static, StorageResult<u64>>;

    /// Fetch a catalog game by id.
    fn find_game(&self, game_id: u32) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;

    /// List catalog games ordered by descending popularity.
    fn list_games(&self, query: CatalogQuery) -> BoxFuture<'static, StorageResult<CatalogPage>>;

    /// Insert or replace a catalog game (seeding/import path).
    fn upsert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;

    /// Verify the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
