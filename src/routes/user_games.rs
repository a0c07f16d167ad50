use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use validator::Validate;

use crate::{
    auth::AuthUser,
    dto::user_game::{
        CompleteUserGameRequest, CreateUserGameRequest, ReorderRequest, ReorderResultDto,
        UpdateUserGameRequest, UserGameDto, UserGamesListDto, UserGamesQueryParams,
    },
    error::AppError,
    services::user_games_service,
    state::SharedState,
};

/// Routes handling the authenticated user's collection and queue.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/user-games", get(list_user_games).post(create_user_game))
        // The static segment wins over the `{game_id}` capture.
        .route("/user-games/reorder", patch(reorder_in_progress))
        .route(
            "/user-games/{game_id}",
            patch(update_user_game).delete(remove_user_game),
        )
        .route("/user-games/{game_id}/complete", post(complete_user_game))
}

/// List the caller's entries with filtering, ordering, and pagination.
#[utoipa::path(
    get,
    path = "/user-games",
    tag = "user-games",
    params(
        ("statuses" = Option<String>, Query, description = "Comma-separated status filter"),
        ("search" = Option<String>, Query, description = "Title search term"),
        ("order_by" = Option<String>, Query, description = "in_progress_position, updated_at, or popularity_score"),
        ("order_direction" = Option<String>, Query, description = "asc or desc"),
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("page_size" = Option<u64>, Query, description = "Page size (1..=100)"),
    ),
    responses(
        (status = 200, description = "Entries page", body = UserGamesListDto),
        (status = 400, description = "Unparseable query"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn list_user_games(
    State(state): State<SharedState>,
    user: AuthUser,
    Query(params): Query<UserGamesQueryParams>,
) -> Result<Json<UserGamesListDto>, AppError> {
    let query = params.into_query().map_err(|err| AppError::BadRequest {
        code: "InvalidQuery",
        message: err.to_string(),
    })?;
    let listing = user_games_service::list_user_games(&state, user.user_id, query).await?;
    Ok(Json(listing))
}

/// Add a catalog game to the caller's collection.
#[utoipa::path(
    post,
    path = "/user-games",
    tag = "user-games",
    request_body = CreateUserGameRequest,
    responses(
        (status = 201, description = "Entry created", body = UserGameDto),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Unknown catalog game"),
        (status = 409, description = "Duplicate entry or full queue"),
    )
)]
pub async fn create_user_game(
    State(state): State<SharedState>,
    user: AuthUser,
    Json(payload): Json<CreateUserGameRequest>,
) -> Result<(StatusCode, Json<UserGameDto>), AppError> {
    payload.validate()?;
    let dto = user_games_service::create_user_game(&state, user.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(dto)))
}

/// Patch an entry's status, queue position, or achievement count.
#[utoipa::path(
    patch,
    path = "/user-games/{game_id}",
    tag = "user-games",
    params(("game_id" = u32, Path, description = "Catalog id of the entry's game")),
    request_body = UpdateUserGameRequest,
    responses(
        (status = 200, description = "Updated entry", body = UserGameDto),
        (status = 400, description = "Invalid payload or position rule violation"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such entry"),
        (status = 409, description = "Full queue or position conflict"),
        (status = 422, description = "Forbidden status transition"),
    )
)]
pub async fn update_user_game(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(game_id): Path<u32>,
    Json(payload): Json<UpdateUserGameRequest>,
) -> Result<Json<UserGameDto>, AppError> {
    payload.validate()?;
    let dto = user_games_service::update_user_game(&state, user.user_id, game_id, payload).await?;
    Ok(Json(dto))
}

/// Mark an entry completed.
#[utoipa::path(
    post,
    path = "/user-games/{game_id}/complete",
    tag = "user-games",
    params(("game_id" = u32, Path, description = "Catalog id of the entry's game")),
    request_body = CompleteUserGameRequest,
    responses(
        (status = 200, description = "Completed entry", body = UserGameDto),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such entry"),
        (status = 422, description = "Entry cannot be completed from its current status"),
    )
)]
pub async fn complete_user_game(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(game_id): Path<u32>,
    Json(payload): Json<CompleteUserGameRequest>,
) -> Result<Json<UserGameDto>, AppError> {
    let dto =
        user_games_service::complete_user_game(&state, user.user_id, game_id, payload).await?;
    Ok(Json(dto))
}

/// Soft-remove an entry.
#[utoipa::path(
    delete,
    path = "/user-games/{game_id}",
    tag = "user-games",
    params(("game_id" = u32, Path, description = "Catalog id of the entry's game")),
    responses(
        (status = 204, description = "Entry removed"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such entry"),
        (status = 422, description = "Entry is already removed"),
    )
)]
pub async fn remove_user_game(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(game_id): Path<u32>,
) -> Result<StatusCode, AppError> {
    user_games_service::remove_user_game(&state, user.user_id, game_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rewrite the caller's in-progress queue to the submitted ordering.
#[utoipa::path(
    patch,
    path = "/user-games/reorder",
    tag = "user-games",
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Queue reordered", body = ReorderResultDto),
        (status = 400, description = "Invalid payload or duplicate positions"),
        (status = 401, description = "Missing or invalid token"),
        (status = 409, description = "Submitted items do not match the stored queue"),
    )
)]
pub async fn reorder_in_progress(
    State(state): State<SharedState>,
    user: AuthUser,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<ReorderResultDto>, AppError> {
    payload.validate()?;
    let result = user_games_service::reorder_in_progress(&state, user.user_id, payload).await?;
    Ok(Json(result))
}
