//! In-process [`UserGamesApi`] implementations for view-model tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::client::api::{ApiError, ApiResult, UserGamesApi};
use crate::config::AppConfig;
use crate::dao::entry_store::UserGameStore;
use crate::dao::entry_store::memory::MemoryEntryStore;
use crate::dao::models::GameEntity;
use crate::dto::game::{GamesListDto, GamesQueryParams};
use crate::dto::user_game::{
    CompleteUserGameRequest, CreateUserGameRequest, ReorderRequest, ReorderResultDto,
    UpdateUserGameRequest, UserGameDto, UserGamesListDto, UserGamesQueryParams,
};
use crate::error::ServiceError;
use crate::services::{catalog_service, user_games_service};
use crate::state::{AppState, SharedState};

/// Drives the real service layer over an in-memory store, standing in for
/// the HTTP transport.
pub(crate) struct LocalApi {
    state: SharedState,
    user_id: Uuid,
}

impl LocalApi {
    /// A fresh instance with a seeded seven-game catalog.
    pub(crate) async fn seeded() -> Self {
        let store = Arc::new(MemoryEntryStore::new());
        for (id, title) in [
            (1, "Alpha Station"),
            (2, "Beta Drift"),
            (3, "Gamma Break"),
            (4, "Delta Wing"),
            (5, "Epsilon Run"),
            (6, "Zeta Storm"),
            (7, "Eta Signal"),
        ] {
            store
                .upsert_game(GameEntity {
                    game_id: id,
                    title: title.into(),
                    slug: title.to_lowercase().replace(' ', "-"),
                    popularity_score: id as i64 * 10,
                    achievements_total: Some(40),
                })
                .await
                .unwrap();
        }

        Self {
            state: AppState::new(AppConfig::default(), store),
            user_id: Uuid::new_v4(),
        }
    }
}

fn api_error(err: ServiceError) -> ApiError {
    let status = match &err {
        ServiceError::Unavailable(_) => 500,
        ServiceError::EntryNotFound | ServiceError::GameNotFound => 404,
        ServiceError::InvalidTransition(_) => 422,
        ServiceError::InProgressCapReached { .. }
        | ServiceError::QueueMismatch
        | ServiceError::DuplicateEntry => 409,
        ServiceError::PositionRule(_)
        | ServiceError::DuplicatePositions
        | ServiceError::InvalidPayload(_) => 400,
    };
    ApiError::from_response(status, err.code(), err.to_string(), None)
}

impl UserGamesApi for LocalApi {
    fn list_user_games(
        &self,
        params: UserGamesQueryParams,
    ) -> BoxFuture<'static, ApiResult<UserGamesListDto>> {
        let state = self.state.clone();
        let user_id = self.user_id;
        Box::pin(async move {
            let query = params
                .into_query()
                .map_err(|err| ApiError::from_response(400, "InvalidQuery", err.to_string(), None))?;
            user_games_service::list_user_games(&state, user_id, query)
                .await
                .map_err(api_error)
        })
    }

    fn create_user_game(
        &self,
        request: CreateUserGameRequest,
    ) -> BoxFuture<'static, ApiResult<UserGameDto>> {
        let state = self.state.clone();
        let user_id = self.user_id;
        Box::pin(async move {
            user_games_service::create_user_game(&state, user_id, request)
                .await
                .map_err(api_error)
        })
    }

    fn update_user_game(
        &self,
        game_id: u32,
        request: UpdateUserGameRequest,
    ) -> BoxFuture<'static, ApiResult<UserGameDto>> {
        let state = self.state.clone();
        let user_id = self.user_id;
        Box::pin(async move {
            user_games_service::update_user_game(&state, user_id, game_id, request)
                .await
                .map_err(api_error)
        })
    }

    fn complete_user_game(
        &self,
        game_id: u32,
        request: CompleteUserGameRequest,
    ) -> BoxFuture<'static, ApiResult<UserGameDto>> {
        let state = self.state.clone();
        let user_id = self.user_id;
        Box::pin(async move {
            user_games_service::complete_user_game(&state, user_id, game_id, request)
                .await
                .map_err(api_error)
        })
    }

    fn remove_user_game(&self, game_id: u32) -> BoxFuture<'static, ApiResult<()>> {
        let state = self.state.clone();
        let user_id = self.user_id;
        Box::pin(async move {
            user_games_service::remove_user_game(&state, user_id, game_id)
                .await
                .map(|_| ())
                .map_err(api_error)
        })
    }

    fn reorder_in_progress(
        &self,
        request: ReorderRequest,
    ) -> BoxFuture<'static, ApiResult<ReorderResultDto>> {
        let state = self.state.clone();
        let user_id = self.user_id;
        Box::pin(async move {
            user_games_service::reorder_in_progress(&state, user_id, request)
                .await
                .map_err(api_error)
        })
    }

    fn search_games(
        &self,
        params: GamesQueryParams,
    ) -> BoxFuture<'static, ApiResult<GamesListDto>> {
        let state = self.state.clone();
        Box::pin(async move {
            catalog_service::list_games(&state, params)
                .await
                .map_err(api_error)
        })
    }
}

/// Wraps another API and fails the next call with a network error when
/// asked, for rollback tests.
pub(crate) struct FlakyApi {
    inner: Arc<dyn UserGamesApi>,
    fail_next: AtomicBool,
}

impl FlakyApi {
    pub(crate) fn new(inner: Arc<dyn UserGamesApi>) -> Self {
        Self {
            inner,
            fail_next: AtomicBool::new(false),
        }
    }

    /// Make the next call fail before reaching the inner API.
    pub(crate) fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn should_fail(&self) -> bool {
        self.fail_next.swap(false, Ordering::SeqCst)
    }
}

fn dropped<T: Send + 'static>() -> BoxFuture<'static, ApiResult<T>> {
    Box::pin(async { Err(ApiError::network("connection reset")) })
}

impl UserGamesApi for FlakyApi {
    fn list_user_games(
        &self,
        params: UserGamesQueryParams,
    ) -> BoxFuture<'static, ApiResult<UserGamesListDto>> {
        if self.should_fail() {
            return dropped();
        }
        self.inner.list_user_games(params)
    }

    fn create_user_game(
        &self,
        request: CreateUserGameRequest,
    ) -> BoxFuture<'static, ApiResult<UserGameDto>> {
        if self.should_fail() {
            return dropped();
        }
        self.inner.create_user_game(request)
    }

    fn update_user_game(
        &self,
        game_id: u32,
        request: UpdateUserGameRequest,
    ) -> BoxFuture<'static, ApiResult<UserGameDto>> {
        if self.should_fail() {
            return dropped();
        }
        self.inner.update_user_game(game_id, request)
    }

    fn complete_user_game(
        &self,
        game_id: u32,
        request: CompleteUserGameRequest,
    ) -> BoxFuture<'static, ApiResult<UserGameDto>> {
        if self.should_fail() {
            return dropped();
        }
        self.inner.complete_user_game(game_id, request)
    }

    fn remove_user_game(&self, game_id: u32) -> BoxFuture<'static, ApiResult<()>> {
        if self.should_fail() {
            return dropped();
        }
        self.inner.remove_user_game(game_id)
    }

    fn reorder_in_progress(
        &self,
        request: ReorderRequest,
    ) -> BoxFuture<'static, ApiResult<ReorderResultDto>> {
        if self.should_fail() {
            return dropped();
        }
        self.inner.reorder_in_progress(request)
    }

    fn search_games(
        &self,
        params: GamesQueryParams,
    ) -> BoxFuture<'static, ApiResult<GamesListDto>> {
        if self.should_fail() {
            return dropped();
        }
        self.inner.search_games(params)
    }
}
