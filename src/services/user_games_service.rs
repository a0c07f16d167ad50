//! Service layer for user-game entries: the status transition engine and the
//! in-progress queue.
//!
//! Every operation is scoped by the authenticated user's id. The store only
//! offers equality-filtered reads and single-row writes, so the queue reorder
//! is a two-phase rewrite: phase 1 parks every row on its negated target
//! position, phase 2 writes the true positions. Negated positions never
//! collide with live 1-based ranks, so the unique index on
//! `(user_id, in_progress_position)` stays satisfied throughout.

use std::collections::HashSet;
use std::time::SystemTime;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::dao::entry_store::{EntryFilter, EntryPatch, UserGameStore};
use crate::dao::models::{GameStatus, UserGameEntity, UserGameRecord};
use crate::dto::user_game::{
    CompleteUserGameRequest, CreateUserGameRequest, ReorderRequest, ReorderResultDto,
    UpdateUserGameRequest, UserGameDto, UserGamesListDto, UserGamesQuery,
};
use crate::error::ServiceError;
use crate::services::transitions;
use crate::state::SharedState;

/// Maximum number of entries a user may hold in progress at once.
pub const IN_PROGRESS_CAP: u32 = 5;

/// List the user's entries with filtering, ordering, and pagination.
pub async fn list_user_games(
    state: &SharedState,
    user_id: Uuid,
    query: UserGamesQuery,
) -> Result<UserGamesListDto, ServiceError> {
    let filter = EntryFilter {
        statuses: query.statuses,
        search: query.search,
        order_by: query.order_by,
        ascending: query.ascending,
        offset: (query.page - 1) * query.page_size,
        limit: query.page_size,
    };

    let page = state.store().list_entries(user_id, filter).await?;

    Ok(UserGamesListDto {
        page: query.page,
        page_size: query.page_size,
        total: page.total,
        results: page.records.into_iter().map(UserGameDto::from).collect(),
    })
}

/// Add a catalog game to the user's collection.
///
/// An in-progress entry needs a free queue slot and an explicit position;
/// both the `(user_id, game_id)` pair and the queue position are unique, so
/// races surface as [`ServiceError::DuplicateEntry`] or
/// [`ServiceError::DuplicatePositions`] from the store.
pub async fn create_user_game(
    state: &SharedState,
    user_id: Uuid,
    request: CreateUserGameRequest,
) -> Result<UserGameDto, ServiceError> {
    let store = state.store();

    if store.find_game(request.game_id).await?.is_none() {
        return Err(ServiceError::GameNotFound);
    }

    if request.status == GameStatus::InProgress {
        ensure_queue_capacity(state, user_id).await?;
    }

    let entry = UserGameEntity::new(
        user_id,
        request.game_id,
        request.status,
        request.in_progress_position,
    );
    let record = store.insert_entry(entry).await?;

    debug!(%user_id, game_id = record.entry.game_id, status = %record.entry.status, "entry created");
    Ok(record.into())
}

/// Patch an entry's status, queue position, or achievement count.
///
/// Completion and removal are not reachable from here; they have dedicated
/// operations with their own timestamps. `removed_at` is never touched.
pub async fn update_user_game(
    state: &SharedState,
    user_id: Uuid,
    game_id: u32,
    request: UpdateUserGameRequest,
) -> Result<UserGameDto, ServiceError> {
    let store = state.store();
    let record = fetch_entry(state, user_id, game_id).await?;
    let current = &record.entry;

    let target_status = request.status.unwrap_or(current.status);
    transitions::ensure_allowed(current.status, target_status)?;

    let mut patch = EntryPatch::default();

    if target_status == GameStatus::InProgress {
        if current.status != GameStatus::InProgress {
            ensure_queue_capacity(state, user_id).await?;
        }
        // Moving into (or within) the queue needs a concrete rank; an
        // entry already in progress may keep its current one.
        match request.in_progress_position {
            Some(Some(position)) => patch.in_progress_position = Some(Some(position)),
            Some(None) => {
                return Err(ServiceError::PositionRule(
                    "in_progress_position is required when status is in_progress",
                ));
            }
            None if current.status != GameStatus::InProgress => {
                return Err(ServiceError::PositionRule(
                    "in_progress_position is required when status is in_progress",
                ));
            }
            None => {}
        }
    } else {
        if let Some(Some(_)) = request.in_progress_position {
            return Err(ServiceError::PositionRule(
                "in_progress_position must be null unless status is in_progress",
            ));
        }
        if current.in_progress_position.is_some() {
            patch.in_progress_position = Some(None);
        }
    }

    if target_status != current.status {
        patch.status = Some(target_status);
        if current.status == GameStatus::Completed {
            // Back to the backlog: the completion no longer stands.
            patch.completed_at = Some(None);
        }
    }

    if let Some(unlocked) = request.achievements_unlocked {
        ensure_achievements_bound(&record, unlocked)?;
        patch.achievements_unlocked = Some(unlocked);
    }

    let affected = store
        .update_entry(user_id, game_id, Some(current.status), patch)
        .await?;
    if affected == 0 {
        // The row changed under us between the read and the write.
        return Err(ServiceError::EntryNotFound);
    }

    let record = fetch_entry(state, user_id, game_id).await?;
    Ok(record.into())
}

/// Mark an entry completed, stamping `completed_at` and freeing its queue
/// slot.
pub async fn complete_user_game(
    state: &SharedState,
    user_id: Uuid,
    game_id: u32,
    request: CompleteUserGameRequest,
) -> Result<UserGameDto, ServiceError> {
    let store = state.store();
    let record = fetch_entry(state, user_id, game_id).await?;
    let current = &record.entry;

    if !transitions::can_complete(current.status) {
        return Err(transitions::InvalidTransition {
            from: current.status,
            to: GameStatus::Completed,
        }
        .into());
    }

    let mut patch = EntryPatch {
        status: Some(GameStatus::Completed),
        in_progress_position: Some(None),
        completed_at: Some(Some(SystemTime::now())),
        removed_at: Some(None),
        ..Default::default()
    };
    if let Some(unlocked) = request.achievements_unlocked {
        ensure_achievements_bound(&record, unlocked)?;
        patch.achievements_unlocked = Some(unlocked);
    }

    let affected = store
        .update_entry(user_id, game_id, Some(current.status), patch)
        .await?;
    if affected == 0 {
        return Err(ServiceError::EntryNotFound);
    }

    debug!(%user_id, game_id, "entry completed");
    let record = fetch_entry(state, user_id, game_id).await?;
    Ok(record.into())
}

/// Soft-remove an entry. The row is kept with a `removed_at` stamp; `removed`
/// is terminal, so removing an already-removed entry is rejected.
pub async fn remove_user_game(
    state: &SharedState,
    user_id: Uuid,
    game_id: u32,
) -> Result<UserGameDto, ServiceError> {
    let store = state.store();
    let record = fetch_entry(state, user_id, game_id).await?;
    let current = &record.entry;

    if !transitions::can_remove(current.status) {
        return Err(transitions::InvalidTransition {
            from: current.status,
            to: GameStatus::Removed,
        }
        .into());
    }

    let patch = EntryPatch {
        status: Some(GameStatus::Removed),
        in_progress_position: Some(None),
        removed_at: Some(Some(SystemTime::now())),
        ..Default::default()
    };

    let affected = store
        .update_entry(user_id, game_id, Some(current.status), patch)
        .await?;
    if affected == 0 {
        return Err(ServiceError::EntryNotFound);
    }

    debug!(%user_id, game_id, "entry removed");
    let record = fetch_entry(state, user_id, game_id).await?;
    Ok(record.into())
}

/// Rewrite the in-progress queue to the submitted ordering.
///
/// The submitted game ids must be exactly the user's current in-progress
/// membership; anything else is rejected before a single row is written.
/// Returns the number of rows whose final position was applied in phase 2.
pub async fn reorder_in_progress(
    state: &SharedState,
    user_id: Uuid,
    request: ReorderRequest,
) -> Result<ReorderResultDto, ServiceError> {
    let store = state.store();

    // A crash between the two phases leaves negated positions behind; heal
    // them before validating the submission against the stored queue.
    repair_queue_positions(state, user_id).await?;

    let queue = store.list_in_progress(user_id).await?;
    let stored_ids: HashSet<u32> = queue.iter().map(|entry| entry.game_id).collect();
    let submitted_ids: HashSet<u32> = request.items.iter().map(|item| item.game_id).collect();
    if stored_ids != submitted_ids {
        return Err(ServiceError::QueueMismatch);
    }

    // Phase 1: park every row on its negated target position.
    for item in &request.items {
        let patch = EntryPatch {
            in_progress_position: Some(Some(-item.position)),
            ..Default::default()
        };
        store
            .update_entry(user_id, item.game_id, Some(GameStatus::InProgress), patch)
            .await?;
    }

    // Phase 2: write the true positions.
    let mut updated = 0;
    for item in &request.items {
        let patch = EntryPatch {
            in_progress_position: Some(Some(item.position)),
            ..Default::default()
        };
        updated += store
            .update_entry(user_id, item.game_id, Some(GameStatus::InProgress), patch)
            .await?;
    }

    debug!(%user_id, updated, "queue reordered");
    Ok(ReorderResultDto { updated })
}

/// Rebuild a contiguous 1..N ranking when negated positions were left behind
/// by an interrupted reorder. Returns the number of repaired rows; a healthy
/// queue is left untouched.
pub async fn repair_queue_positions(
    state: &SharedState,
    user_id: Uuid,
) -> Result<u64, ServiceError> {
    let store = state.store();
    let mut queue = store.list_in_progress(user_id).await?;

    let damaged = queue
        .iter()
        .any(|entry| entry.in_progress_position.is_some_and(|p| p < 0));
    if !damaged {
        return Ok(0);
    }

    warn!(%user_id, "negated queue positions found; rebuilding ranks");

    // The absolute values preserve the intended ordering. A crash inside
    // phase 1 leaves a mix of parked negatives and untouched positives; on
    // an absolute-value tie the negative wins the earlier rank, since it
    // encodes the newer intent. Rows that somehow lost their position
    // sort last.
    queue.sort_by_key(|entry| {
        let position = entry.in_progress_position;
        (
            position.map(i32::abs).unwrap_or(i32::MAX),
            position.map_or(1, |p| i32::from(p > 0)),
            entry.game_id,
        )
    });

    // Same two-phase discipline as a reorder, but parked past the largest
    // absolute value currently stored: in a mixed state a plain `-rank`
    // could collide with a negative left behind by the interrupted
    // reorder.
    let max_abs = queue
        .iter()
        .filter_map(|entry| entry.in_progress_position)
        .map(i32::abs)
        .max()
        .unwrap_or(0);
    for (index, entry) in queue.iter().enumerate() {
        let patch = EntryPatch {
            in_progress_position: Some(Some(-(max_abs + index as i32 + 1))),
            ..Default::default()
        };
        store
            .update_entry(user_id, entry.game_id, Some(GameStatus::InProgress), patch)
            .await?;
    }
    let mut repaired = 0;
    for (index, entry) in queue.iter().enumerate() {
        let patch = EntryPatch {
            in_progress_position: Some(Some(index as i32 + 1)),
            ..Default::default()
        };
        repaired += store
            .update_entry(user_id, entry.game_id, Some(GameStatus::InProgress), patch)
            .await?;
    }

    Ok(repaired)
}

async fn fetch_entry(
    state: &SharedState,
    user_id: Uuid,
    game_id: u32,
) -> Result<UserGameRecord, ServiceError> {
    state
        .store()
        .find_entry(user_id, game_id)
        .await?
        .ok_or(ServiceError::EntryNotFound)
}

async fn ensure_queue_capacity(state: &SharedState, user_id: Uuid) -> Result<(), ServiceError> {
    let in_progress = state.store().count_in_progress(user_id).await?;
    if in_progress >= IN_PROGRESS_CAP as u64 {
        return Err(ServiceError::InProgressCapReached {
            cap: IN_PROGRESS_CAP,
        });
    }
    Ok(())
}

/// An unlocked count can never exceed the catalog's known total for the game.
fn ensure_achievements_bound(record: &UserGameRecord, unlocked: u32) -> Result<(), ServiceError> {
    if let Some(total) = record.game.achievements_total {
        if unlocked > total {
            return Err(ServiceError::InvalidPayload(format!(
                "achievements_unlocked ({unlocked}) exceeds the game's total ({total})"
            )));
        }
    }
    Ok(())
}
