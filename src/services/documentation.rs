use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Play Queue Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::games::list_games,
        crate::routes::user_games::list_user_games,
        crate::routes::user_games::create_user_game,
        crate::routes::user_games::update_user_game,
        crate::routes::user_games::complete_user_game,
        crate::routes::user_games::remove_user_game,
        crate::routes::user_games::reorder_in_progress,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::CatalogGameDto,
            crate::dto::game::GamesListDto,
            crate::dto::user_game::CreateUserGameRequest,
            crate::dto::user_game::UpdateUserGameRequest,
            crate::dto::user_game::CompleteUserGameRequest,
            crate::dto::user_game::ReorderItem,
            crate::dto::user_game::ReorderRequest,
            crate::dto::user_game::ReorderResultDto,
            crate::dto::user_game::UserGameDto,
            crate::dto::user_game::UserGamesListDto,
            crate::dao::models::GameStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "games", description = "Read-only game catalog"),
        (name = "user-games", description = "Per-user collection and in-progress queue"),
    )
)]
pub struct ApiDoc;
