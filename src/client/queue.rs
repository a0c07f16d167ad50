//! View model for the ordered in-progress queue.

use std::sync::Arc;

use crate::client::api::{ApiError, RateLimitMetadata, UserGamesApi};
use crate::dao::models::GameStatus;
use crate::dto::user_game::{
    CompleteUserGameRequest, ReorderItem, ReorderRequest, UpdateUserGameRequest, UserGameDto,
    UserGamesQueryParams,
};
use crate::services::user_games_service::IN_PROGRESS_CAP;

/// Local mirror of the user's in-progress queue.
///
/// `total` and `is_at_cap` are always recomputed from the local item count
/// against the fixed cap, never fetched separately, so they cannot drift
/// from what the user sees.
pub struct InProgressQueueVm {
    api: Arc<dyn UserGamesApi>,
    items: Vec<UserGameDto>,
    last_error: Option<ApiError>,
    rate_limit: Option<RateLimitMetadata>,
}

impl InProgressQueueVm {
    /// Create an empty view model over the given API handle.
    pub fn new(api: Arc<dyn UserGamesApi>) -> Self {
        Self {
            api,
            items: Vec::new(),
            last_error: None,
            rate_limit: None,
        }
    }

    /// Queue items in rank order.
    pub fn items(&self) -> &[UserGameDto] {
        &self.items
    }

    /// Number of entries currently in the queue.
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Maximum simultaneous in-progress entries.
    pub fn cap(&self) -> u32 {
        IN_PROGRESS_CAP
    }

    /// Whether another entry can still enter the queue.
    pub fn is_at_cap(&self) -> bool {
        self.items.len() as u32 >= IN_PROGRESS_CAP
    }

    /// The most recent failed call, if any.
    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    /// Seconds until the client may retry, from the latest quota metadata.
    pub fn retry_after(&self) -> Option<u64> {
        self.rate_limit.and_then(|meta| meta.retry_after)
    }

    /// Fetch the queue from the server, replacing local state.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        let params = UserGamesQueryParams {
            statuses: Some("in_progress".into()),
            ..Default::default()
        };
        let listing = self
            .api
            .list_user_games(params)
            .await
            .map_err(|err| self.record_error(err))?;

        self.items = listing.results;
        self.normalize_positions();
        Ok(())
    }

    /// Reorder the queue to the given game-id order, optimistically.
    ///
    /// The local list is rearranged and re-ranked 1..N before the request is
    /// sent; if the server rejects it the previous ordering is restored.
    pub async fn reorder(&mut self, ordered_game_ids: &[u32]) -> Result<u64, ApiError> {
        let snapshot = self.items.clone();

        let mut reordered = Vec::with_capacity(ordered_game_ids.len());
        for &game_id in ordered_game_ids {
            let Some(index) = self.items.iter().position(|item| item.game_id == game_id) else {
                self.items = snapshot;
                return Err(self.record_error(ApiError::network(format!(
                    "game {game_id} is not in the local queue"
                ))));
            };
            reordered.push(self.items.remove(index));
        }
        if !self.items.is_empty() {
            self.items = snapshot;
            return Err(self.record_error(ApiError::network(
                "reorder must include every queued game",
            )));
        }

        self.items = reordered;
        self.normalize_positions();

        let request = ReorderRequest {
            items: self
                .items
                .iter()
                .map(|item| ReorderItem {
                    game_id: item.game_id,
                    position: item.in_progress_position.unwrap_or(0),
                })
                .collect(),
        };

        match self.api.reorder_in_progress(request).await {
            Ok(result) => Ok(result.updated),
            Err(err) => {
                self.items = snapshot;
                Err(self.record_error(err))
            }
        }
    }

    /// Mark a queued game completed, optimistically dropping it from the
    /// queue.
    pub async fn complete(
        &mut self,
        game_id: u32,
        achievements_unlocked: Option<u32>,
    ) -> Result<(), ApiError> {
        let snapshot = self.take_out(game_id)?;

        let request = CompleteUserGameRequest {
            achievements_unlocked,
        };
        match self.api.complete_user_game(game_id, request).await {
            Ok(_) => Ok(()),
            Err(err) => {
                self.items = snapshot;
                Err(self.record_error(err))
            }
        }
    }

    /// Send a queued game back to the backlog, optimistically dropping it
    /// from the queue.
    pub async fn remove_to_backlog(&mut self, game_id: u32) -> Result<(), ApiError> {
        let snapshot = self.take_out(game_id)?;

        let request = UpdateUserGameRequest {
            status: Some(GameStatus::Backlog),
            ..Default::default()
        };
        match self.api.update_user_game(game_id, request).await {
            Ok(_) => Ok(()),
            Err(err) => {
                self.items = snapshot;
                Err(self.record_error(err))
            }
        }
    }

    /// Drop `game_id` locally and re-rank, returning the pre-change snapshot.
    fn take_out(&mut self, game_id: u32) -> Result<Vec<UserGameDto>, ApiError> {
        let snapshot = self.items.clone();
        let Some(index) = self.items.iter().position(|item| item.game_id == game_id) else {
            return Err(self.record_error(ApiError::network(format!(
                "game {game_id} is not in the local queue"
            ))));
        };
        self.items.remove(index);
        self.normalize_positions();
        Ok(snapshot)
    }

    /// Re-rank the local items to a contiguous 1..N in list order.
    fn normalize_positions(&mut self) {
        self.items
            .sort_by_key(|item| item.in_progress_position.unwrap_or(i32::MAX));
        for (index, item) in self.items.iter_mut().enumerate() {
            item.in_progress_position = Some(index as i32 + 1);
        }
    }

    fn record_error(&mut self, err: ApiError) -> ApiError {
        if err.rate_limit.is_some() {
            self.rate_limit = err.rate_limit;
        }
        self.last_error = Some(err.clone());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{FlakyApi, LocalApi};
    use crate::dao::models::GameStatus;
    use crate::dto::user_game::CreateUserGameRequest;

    async fn queue_with(entries: &[(u32, i32)]) -> (InProgressQueueVm, Arc<LocalApi>) {
        let api = Arc::new(LocalApi::seeded().await);
        for &(game_id, position) in entries {
            api.create_user_game(CreateUserGameRequest {
                game_id,
                status: GameStatus::InProgress,
                in_progress_position: Some(position),
            })
            .await
            .unwrap();
        }

        let mut vm = InProgressQueueVm::new(api.clone());
        vm.load().await.unwrap();
        (vm, api)
    }

    fn local_ids(vm: &InProgressQueueVm) -> Vec<u32> {
        vm.items().iter().map(|item| item.game_id).collect()
    }

    #[tokio::test]
    async fn load_sorts_and_normalizes_the_queue() {
        let (vm, _) = queue_with(&[(1, 3), (2, 1), (3, 2)]).await;

        assert_eq!(local_ids(&vm), vec![2, 3, 1]);
        let positions: Vec<i32> = vm
            .items()
            .iter()
            .map(|item| item.in_progress_position.unwrap())
            .collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn cap_is_recomputed_from_the_item_count() {
        let (vm, _) = queue_with(&[(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)]).await;
        assert_eq!(vm.total(), 5);
        assert!(vm.is_at_cap());
    }

    #[tokio::test]
    async fn reorder_confirms_against_the_server() {
        let (mut vm, api) = queue_with(&[(1, 1), (2, 2)]).await;

        let updated = vm.reorder(&[2, 1]).await.unwrap();
        assert_eq!(updated, 2);
        assert_eq!(local_ids(&vm), vec![2, 1]);

        let mut fresh = InProgressQueueVm::new(api);
        fresh.load().await.unwrap();
        assert_eq!(local_ids(&fresh), vec![2, 1]);
    }

    #[tokio::test]
    async fn failed_reorder_restores_the_snapshot() {
        let api = Arc::new(LocalApi::seeded().await);
        for (game_id, position) in [(1, 1), (2, 2)] {
            api.create_user_game(CreateUserGameRequest {
                game_id,
                status: GameStatus::InProgress,
                in_progress_position: Some(position),
            })
            .await
            .unwrap();
        }
        let flaky = Arc::new(FlakyApi::new(api));
        let mut vm = InProgressQueueVm::new(flaky.clone());
        vm.load().await.unwrap();

        flaky.fail_next();
        let err = vm.reorder(&[2, 1]).await.unwrap_err();
        assert_eq!(err.kind, crate::client::api::ApiErrorKind::Network);
        assert_eq!(local_ids(&vm), vec![1, 2]);
    }

    #[tokio::test]
    async fn complete_drops_the_item_and_reranks() {
        let (mut vm, _) = queue_with(&[(1, 1), (2, 2), (3, 3)]).await;

        vm.complete(2, Some(10)).await.unwrap();

        assert_eq!(local_ids(&vm), vec![1, 3]);
        let positions: Vec<i32> = vm
            .items()
            .iter()
            .map(|item| item.in_progress_position.unwrap())
            .collect();
        assert_eq!(positions, vec![1, 2]);
        assert!(!vm.is_at_cap());
    }

    #[tokio::test]
    async fn remove_to_backlog_rolls_back_on_server_rejection() {
        let (mut vm, _) = queue_with(&[(1, 1)]).await;

        // The server has never heard of game 99; the local drop must be
        // undone when the call fails.
        vm.items.push(UserGameDto {
            game_id: 99,
            title: "Phantom".into(),
            slug: "phantom".into(),
            status: GameStatus::InProgress,
            in_progress_position: Some(2),
            achievements_unlocked: 0,
            completed_at: None,
            imported_at: String::new(),
            updated_at: String::new(),
            removed_at: None,
            popularity_score: 0,
        });

        let err = vm.remove_to_backlog(99).await.unwrap_err();
        assert_eq!(err.kind, crate::client::api::ApiErrorKind::EntryNotFound);
        assert_eq!(local_ids(&vm), vec![1, 99]);
    }
}
