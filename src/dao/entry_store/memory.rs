//! In-memory [`UserGameStore`] backend.
//!
//! Mirrors the behavior the service layer depends on from a relational
//! backend: equality-filtered reads, single-row writes, and *eager* unique
//! constraints checked on every individual write rather than at commit time.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::SystemTime;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::entry_store::{
    CatalogPage, CatalogQuery, EntryFilter, EntryOrder, EntryPage, EntryPatch, UserGameStore,
};
use crate::dao::models::{GameEntity, GameStatus, UserGameEntity, UserGameRecord};
use crate::dao::storage::{
    StorageError, StorageResult, UNIQUE_IN_PROGRESS_POSITION, UNIQUE_USER_GAME,
};

#[derive(Debug, Error)]
enum MemoryStoreError {
    #[error("entry references unknown catalog game `{game_id}`")]
    MissingGame { game_id: u32 },
}

/// In-memory store keyed by `(user_id, game_id)`, preserving insertion order.
#[derive(Clone, Default)]
pub struct MemoryEntryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    entries: RwLock<IndexMap<(Uuid, u32), UserGameEntity>>,
    games: RwLock<IndexMap<u32, GameEntity>>,
}

impl MemoryEntryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryInner {
    /// Reject a candidate row whose position collides with another row of
    /// the same user. Positions are compared across all rows because only
    /// in-progress rows ever hold one.
    fn check_position_unique(
        entries: &IndexMap<(Uuid, u32), UserGameEntity>,
        candidate: &UserGameEntity,
    ) -> StorageResult<()> {
        let Some(position) = candidate.in_progress_position else {
            return Ok(());
        };

        let collides = entries.values().any(|other| {
            other.user_id == candidate.user_id
                && other.game_id != candidate.game_id
                && other.in_progress_position == Some(position)
        });

        if collides {
            return Err(StorageError::UniqueViolation {
                constraint: UNIQUE_IN_PROGRESS_POSITION,
            });
        }

        Ok(())
    }

    fn join_game(
        games: &IndexMap<u32, GameEntity>,
        entry: UserGameEntity,
    ) -> StorageResult<UserGameRecord> {
        let game_id = entry.game_id;
        let Some(game) = games.get(&game_id) else {
            return Err(StorageError::unavailable(
                format!("catalog game `{game_id}` missing for join"),
                MemoryStoreError::MissingGame { game_id },
            ));
        };

        Ok(UserGameRecord {
            entry,
            game: game.clone(),
        })
    }
}

fn compare_positions(a: Option<i32>, b: Option<i32>, ascending: bool) -> Ordering {
    match (a, b) {
        // Nulls sort last regardless of direction.
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(left), Some(right)) => {
            if ascending {
                left.cmp(&right)
            } else {
                right.cmp(&left)
            }
        }
    }
}

fn paginate<T>(items: Vec<T>, offset: u64, limit: u64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

fn matches_search(title: &str, search: Option<&str>) -> bool {
    match search {
        Some(needle) if !needle.is_empty() => {
            title.to_lowercase().contains(&needle.to_lowercase())
        }
        _ => true,
    }
}

impl UserGameStore for MemoryEntryStore {
    fn list_entries(
        &self,
        user_id: Uuid,
        filter: EntryFilter,
    ) -> BoxFuture<'static, StorageResult<EntryPage>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entries = inner.entries.read().await;
            let games = inner.games.read().await;

            let mut records = entries
                .values()
                .filter(|entry| entry.user_id == user_id)
                .filter(|entry| {
                    filter.statuses.is_empty() || filter.statuses.contains(&entry.status)
                })
                .cloned()
                .map(|entry| MemoryInner::join_game(&games, entry))
                .collect::<StorageResult<Vec<_>>>()?;

            records.retain(|record| matches_search(&record.game.title, filter.search.as_deref()));

            records.sort_by(|a, b| match filter.order_by {
                EntryOrder::InProgressPosition => compare_positions(
                    a.entry.in_progress_position,
                    b.entry.in_progress_position,
                    filter.ascending,
                ),
                EntryOrder::UpdatedAt => {
                    let ordering = a.entry.updated_at.cmp(&b.entry.updated_at);
                    if filter.ascending {
                        ordering
                    } else {
                        ordering.reverse()
                    }
                }
                EntryOrder::PopularityScore => {
                    let ordering = a.game.popularity_score.cmp(&b.game.popularity_score);
                    if filter.ascending {
                        ordering
                    } else {
                        ordering.reverse()
                    }
                }
            });

            let total = records.len() as u64;
            let records = paginate(records, filter.offset, filter.limit);

            Ok(EntryPage { records, total })
        })
    }

    fn find_entry(
        &self,
        user_id: Uuid,
        game_id: u32,
    ) -> BoxFuture<'static, StorageResult<Option<UserGameRecord>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entries = inner.entries.read().await;
            let games = inner.games.read().await;

            entries
                .get(&(user_id, game_id))
                .cloned()
                .map(|entry| MemoryInner::join_game(&games, entry))
                .transpose()
        })
    }

    fn list_in_progress(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<UserGameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entries = inner.entries.read().await;
            Ok(entries
                .values()
                .filter(|entry| {
                    entry.user_id == user_id && entry.status == GameStatus::InProgress
                })
                .cloned()
                .collect())
        })
    }

    fn count_in_progress(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entries = inner.entries.read().await;
            Ok(entries
                .values()
                .filter(|entry| {
                    entry.user_id == user_id && entry.status == GameStatus::InProgress
                })
                .count() as u64)
        })
    }

    fn insert_entry(
        &self,
        entry: UserGameEntity,
    ) -> BoxFuture<'static, StorageResult<UserGameRecord>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut entries = inner.entries.write().await;
            let games = inner.games.read().await;

            let key = (entry.user_id, entry.game_id);
            if entries.contains_key(&key) {
                return Err(StorageError::UniqueViolation {
                    constraint: UNIQUE_USER_GAME,
                });
            }

            MemoryInner::check_position_unique(&entries, &entry)?;

            let record = MemoryInner::join_game(&games, entry.clone())?;
            entries.insert(key, entry);
            Ok(record)
        })
    }

    fn update_entry(
        &self,
        user_id: Uuid,
        game_id: u32,
        require_status: Option<GameStatus>,
        patch: EntryPatch,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut entries = inner.entries.write().await;

            let Some(current) = entries.get(&(user_id, game_id)) else {
                return Ok(0);
            };
            if let Some(required) = require_status {
                if current.status != required {
                    return Ok(0);
                }
            }

            let mut candidate = current.clone();
            if let Some(status) = patch.status {
                candidate.status = status;
            }
            if let Some(position) = patch.in_progress_position {
                candidate.in_progress_position = position;
            }
            if let Some(achievements) = patch.achievements_unlocked {
                candidate.achievements_unlocked = achievements;
            }
            if let Some(completed_at) = patch.completed_at {
                candidate.completed_at = completed_at;
            }
            if let Some(removed_at) = patch.removed_at {
                candidate.removed_at = removed_at;
            }
            candidate.updated_at = SystemTime::now();

            // The constraint fires before the row is committed, exactly like
            // an eager unique index.
            MemoryInner::check_position_unique(&entries, &candidate)?;

            entries.insert((user_id, game_id), candidate);
            Ok(1)
        })
    }

    fn find_game(&self, game_id: u32) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let games = inner.games.read().await;
            Ok(games.get(&game_id).cloned())
        })
    }

    fn list_games(&self, query: CatalogQuery) -> BoxFuture<'static, StorageResult<CatalogPage>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let games = inner.games.read().await;

            let mut matching = games
                .values()
                .filter(|game| matches_search(&game.title, query.search.as_deref()))
                .cloned()
                .collect::<Vec<_>>();

            matching.sort_by(|a, b| b.popularity_score.cmp(&a.popularity_score));

            let total = matching.len() as u64;
            let games = paginate(matching, query.offset, query.limit);

            Ok(CatalogPage { games, total })
        })
    }

    fn upsert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut games = inner.games.write().await;
            games.insert(game.game_id, game);
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
