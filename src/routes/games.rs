use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::game::{GamesListDto, GamesQueryParams},
    error::AppError,
    services::catalog_service,
    state::SharedState,
};

/// Routes exposing the read-only game catalog.
pub fn router() -> Router<SharedState> {
    Router::new().route("/games", get(list_games))
}

/// Search the game catalog, most popular first.
#[utoipa::path(
    get,
    path = "/games",
    tag = "games",
    params(
        ("search" = Option<String>, Query, description = "Title search term"),
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("page_size" = Option<u64>, Query, description = "Page size (1..=100)"),
    ),
    responses(
        (status = 200, description = "Catalog page", body = GamesListDto),
    )
)]
pub async fn list_games(
    State(state): State<SharedState>,
    Query(params): Query<GamesQueryParams>,
) -> Result<Json<GamesListDto>, AppError> {
    let listing = catalog_service::list_games(&state, params).await?;
    Ok(Json(listing))
}
