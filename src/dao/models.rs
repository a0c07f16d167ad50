use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Play status of a game within a user's collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Saved for later; not being played.
    Backlog,
    /// Actively played; occupies a slot in the ordered queue.
    InProgress,
    /// Finished by the user.
    Completed,
    /// Soft-deleted; kept for auditing but hidden from normal views.
    Removed,
}

impl GameStatus {
    /// Stable wire name of the status (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Backlog => "backlog",
            GameStatus::InProgress => "in_progress",
            GameStatus::Completed => "completed",
            GameStatus::Removed => "removed",
        }
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog game entity as known to the storage layer.
///
/// The catalog is read-only from the tracker's perspective; rows are seeded
/// externally (import pipeline) and only referenced here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Stable catalog identifier for the game.
    pub game_id: u32,
    /// Display title.
    pub title: String,
    /// URL-friendly identifier derived from the title.
    pub slug: String,
    /// Relative popularity used for catalog ordering.
    pub popularity_score: i64,
    /// Total achievement count, when the catalog knows it.
    pub achievements_total: Option<u32>,
}

/// A user's relationship to one catalog game, persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserGameEntity {
    /// Owner of the entry; every read and write is scoped by this id.
    pub user_id: Uuid,
    /// Catalog game the entry refers to.
    pub game_id: u32,
    /// Current play status.
    pub status: GameStatus,
    /// Rank within the in-progress queue. Present iff `status` is
    /// `in_progress`; unique per user among in-progress entries.
    pub in_progress_position: Option<i32>,
    /// Number of achievements the user unlocked for this game.
    pub achievements_unlocked: u32,
    /// When the entry was marked completed.
    pub completed_at: Option<SystemTime>,
    /// When the entry was first created.
    pub imported_at: SystemTime,
    /// Last mutation timestamp, maintained by the store.
    pub updated_at: SystemTime,
    /// When the entry was soft-deleted.
    pub removed_at: Option<SystemTime>,
}

/// A user-game row joined with its catalog game, as returned by reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserGameRecord {
    /// The user's entry.
    pub entry: UserGameEntity,
    /// The catalog game the entry points at.
    pub game: GameEntity,
}

impl UserGameEntity {
    /// Create a fresh entry in the given status, stamped with `now`.
    pub fn new(
        user_id: Uuid,
        game_id: u32,
        status: GameStatus,
        in_progress_position: Option<i32>,
    ) -> Self {
        let now = SystemTime::now();
        Self {
            user_id,
            game_id,
            status,
            in_progress_position,
            achievements_unlocked: 0,
            completed_at: None,
            imported_at: now,
            updated_at: now,
            removed_at: None,
        }
    }
}
