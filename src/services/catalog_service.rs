//! Read-only queries against the game catalog.

use crate::dao::entry_store::{CatalogQuery, UserGameStore};
use crate::dto::game::{CatalogGameDto, GamesListDto, GamesQueryParams};
use crate::error::ServiceError;
use crate::state::SharedState;

/// List catalog games matching the query, most popular first.
pub async fn list_games(
    state: &SharedState,
    params: GamesQueryParams,
) -> Result<GamesListDto, ServiceError> {
    let page = params.page();
    let page_size = params.page_size();

    let result = state
        .store()
        .list_games(CatalogQuery {
            search: params.search(),
            offset: (page - 1) * page_size,
            limit: page_size,
        })
        .await?;

    Ok(GamesListDto {
        page,
        page_size,
        total: result.total,
        results: result.games.into_iter().map(CatalogGameDto::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::AppConfig;
    use crate::dao::entry_store::memory::MemoryEntryStore;
    use crate::dao::entry_store::UserGameStore;
    use crate::dao::models::GameEntity;
    use crate::state::AppState;

    async fn seeded_state() -> SharedState {
        let store = Arc::new(MemoryEntryStore::new());
        for (id, title, popularity) in [
            (1, "Alpha Station", 10),
            (2, "Beta Drift", 30),
            (3, "Gamma Break", 20),
        ] {
            store
                .upsert_game(GameEntity {
                    game_id: id,
                    title: title.into(),
                    slug: title.to_lowercase().replace(' ', "-"),
                    popularity_score: popularity,
                    achievements_total: None,
                })
                .await
                .unwrap();
        }
        AppState::new(AppConfig::default(), store)
    }

    #[tokio::test]
    async fn catalog_is_ordered_by_popularity() {
        let state = seeded_state().await;
        let listing = list_games(&state, GamesQueryParams::default())
            .await
            .unwrap();

        let ids: Vec<u32> = listing.results.iter().map(|game| game.game_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(listing.total, 3);
    }

    #[tokio::test]
    async fn search_filters_by_title_substring() {
        let state = seeded_state().await;
        let listing = list_games(
            &state,
            GamesQueryParams {
                search: Some("beta".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(listing.total, 1);
        assert_eq!(listing.results[0].title, "Beta Drift");
    }
}
