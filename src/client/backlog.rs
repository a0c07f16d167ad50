//! View model for the paged backlog list.

use std::sync::Arc;

use crate::client::api::{ApiError, RateLimitMetadata, UserGamesApi};
use crate::dao::models::GameStatus;
use crate::dto::user_game::{UpdateUserGameRequest, UserGameDto, UserGamesQueryParams};

const PAGE_SIZE: u64 = 20;

/// Local mirror of the user's backlog, loaded page by page.
pub struct BacklogVm {
    api: Arc<dyn UserGamesApi>,
    items: Vec<UserGameDto>,
    page: u64,
    total: u64,
    last_message: Option<String>,
    rate_limit: Option<RateLimitMetadata>,
}

impl BacklogVm {
    /// Create an empty view model over the given API handle.
    pub fn new(api: Arc<dyn UserGamesApi>) -> Self {
        Self {
            api,
            items: Vec::new(),
            page: 0,
            total: 0,
            last_message: None,
            rate_limit: None,
        }
    }

    /// Backlog entries loaded so far.
    pub fn items(&self) -> &[UserGameDto] {
        &self.items
    }

    /// Exact server-side backlog size, from the last listing response.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Whether more pages remain on the server.
    pub fn has_more(&self) -> bool {
        (self.items.len() as u64) < self.total
    }

    /// User-facing message for the most recent failure, if any.
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Seconds until the client may retry, from the latest quota metadata.
    pub fn retry_after(&self) -> Option<u64> {
        self.rate_limit.and_then(|meta| meta.retry_after)
    }

    /// Fetch the first page, replacing local state.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        let listing = self.fetch_page(1).await?;
        self.items = listing;
        self.page = 1;
        Ok(())
    }

    /// Fetch the next page and merge it into the local list.
    ///
    /// Entries already present locally are skipped, so a row that shifted
    /// pages between requests is not shown twice.
    pub async fn load_more(&mut self) -> Result<(), ApiError> {
        if !self.has_more() {
            return Ok(());
        }

        let next_page = self.page + 1;
        let listing = self.fetch_page(next_page).await?;
        for item in listing {
            if !self.items.iter().any(|known| known.game_id == item.game_id) {
                self.items.push(item);
            }
        }
        self.page = next_page;
        Ok(())
    }

    /// Move a backlog entry into the in-progress queue at `position`,
    /// optimistically dropping it from the local list.
    pub async fn add_to_in_progress(
        &mut self,
        game_id: u32,
        position: i32,
    ) -> Result<UserGameDto, ApiError> {
        let snapshot = self.snapshot();
        self.drop_local(game_id);

        let request = UpdateUserGameRequest {
            status: Some(GameStatus::InProgress),
            in_progress_position: Some(Some(position)),
            ..Default::default()
        };
        match self.api.update_user_game(game_id, request).await {
            Ok(dto) => Ok(dto),
            Err(err) => {
                self.restore(snapshot);
                Err(self.record_error(err))
            }
        }
    }

    /// Soft-remove a backlog entry, optimistically dropping it from the
    /// local list.
    pub async fn remove_from_backlog(&mut self, game_id: u32) -> Result<(), ApiError> {
        let snapshot = self.snapshot();
        self.drop_local(game_id);

        match self.api.remove_user_game(game_id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.restore(snapshot);
                Err(self.record_error(err))
            }
        }
    }

    async fn fetch_page(&mut self, page: u64) -> Result<Vec<UserGameDto>, ApiError> {
        let params = UserGamesQueryParams {
            statuses: Some("backlog".into()),
            page: Some(page),
            page_size: Some(PAGE_SIZE),
            ..Default::default()
        };
        match self.api.list_user_games(params).await {
            Ok(listing) => {
                self.total = listing.total;
                Ok(listing.results)
            }
            Err(err) => Err(self.record_error(err)),
        }
    }

    fn snapshot(&self) -> (Vec<UserGameDto>, u64) {
        (self.items.clone(), self.total)
    }

    fn restore(&mut self, snapshot: (Vec<UserGameDto>, u64)) {
        self.items = snapshot.0;
        self.total = snapshot.1;
    }

    fn drop_local(&mut self, game_id: u32) {
        if let Some(index) = self.items.iter().position(|item| item.game_id == game_id) {
            self.items.remove(index);
            self.total = self.total.saturating_sub(1);
        }
    }

    fn record_error(&mut self, err: ApiError) -> ApiError {
        if err.rate_limit.is_some() {
            self.rate_limit = err.rate_limit;
        }
        self.last_message = Some(err.user_message());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::api::ApiErrorKind;
    use crate::client::testing::{FlakyApi, LocalApi};
    use crate::dto::user_game::CreateUserGameRequest;

    async fn backlog_with(game_ids: &[u32]) -> Arc<LocalApi> {
        let api = Arc::new(LocalApi::seeded().await);
        for &game_id in game_ids {
            api.create_user_game(CreateUserGameRequest {
                game_id,
                status: GameStatus::Backlog,
                in_progress_position: None,
            })
            .await
            .unwrap();
        }
        api
    }

    fn local_ids(vm: &BacklogVm) -> Vec<u32> {
        vm.items().iter().map(|item| item.game_id).collect()
    }

    #[tokio::test]
    async fn load_more_merges_without_duplicates() {
        let api = backlog_with(&[1, 2, 3]).await;
        let mut vm = BacklogVm::new(api);

        vm.load().await.unwrap();
        assert_eq!(vm.total(), 3);
        assert_eq!(vm.items().len(), 3);

        // Everything fit the first page; a further call is a no-op.
        vm.load_more().await.unwrap();
        assert_eq!(vm.items().len(), 3);

        // A row the server returns again is not duplicated locally.
        vm.total = 4;
        vm.page = 0;
        vm.load_more().await.unwrap();
        let ids: Vec<u32> = vm.items().iter().map(|item| item.game_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn add_to_in_progress_confirms_and_drops_the_entry() {
        let api = backlog_with(&[1, 2]).await;
        let mut vm = BacklogVm::new(api);
        vm.load().await.unwrap();

        let dto = vm.add_to_in_progress(1, 1).await.unwrap();
        assert_eq!(dto.status, GameStatus::InProgress);
        assert_eq!(dto.in_progress_position, Some(1));
        assert_eq!(local_ids(&vm), vec![2]);
        assert_eq!(vm.total(), 1);
    }

    #[tokio::test]
    async fn cap_rejection_rolls_back_and_surfaces_actionable_copy() {
        let api = backlog_with(&[6]).await;
        for (game_id, position) in [(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)] {
            api.create_user_game(CreateUserGameRequest {
                game_id,
                status: GameStatus::InProgress,
                in_progress_position: Some(position),
            })
            .await
            .unwrap();
        }
        let mut vm = BacklogVm::new(api);
        vm.load().await.unwrap();

        let err = vm.add_to_in_progress(6, 6).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::InProgressCapReached);
        assert_eq!(local_ids(&vm), vec![6]);
        assert_eq!(
            vm.last_message(),
            Some("Your in-progress queue is full. Finish or remove a game first.")
        );
    }

    #[tokio::test]
    async fn network_failure_rolls_back_the_removal() {
        let api = backlog_with(&[1, 2]).await;
        let flaky = Arc::new(FlakyApi::new(api));
        let mut vm = BacklogVm::new(flaky.clone());
        vm.load().await.unwrap();

        flaky.fail_next();
        let err = vm.remove_from_backlog(1).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Network);
        assert_eq!(local_ids(&vm), vec![1, 2]);
        assert_eq!(vm.total(), 2);
    }

    #[tokio::test]
    async fn successful_removal_stays_gone() {
        let api = backlog_with(&[1, 2]).await;
        let mut vm = BacklogVm::new(api.clone());
        vm.load().await.unwrap();

        vm.remove_from_backlog(1).await.unwrap();
        assert_eq!(local_ids(&vm), vec![2]);

        let mut fresh = BacklogVm::new(api);
        fresh.load().await.unwrap();
        assert_eq!(local_ids(&fresh), vec![2]);
    }
}
