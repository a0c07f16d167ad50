/// Read-only game catalog queries.
pub mod catalog_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Status transition rules for user-game entries.
pub mod transitions;
/// User-game collection and in-progress queue operations.
pub mod user_games_service;
