use axum::{Router, middleware};

use crate::http::rate_limit::enforce_rate_limit;
use crate::state::SharedState;

pub mod docs;
pub mod games;
pub mod health;
pub mod user_games;

/// Compose all route trees, wiring in shared state, rate limiting, and
/// documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(games::router())
        .merge(user_games::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_rate_limit,
        ));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header::AUTHORIZATION},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{
        auth::token::issue_token,
        config::AppConfig,
        dao::entry_store::memory::MemoryEntryStore,
        state::{AppState, SharedState},
    };

    fn test_state(config: AppConfig) -> SharedState {
        AppState::new(config, Arc::new(MemoryEntryStore::new()))
    }

    async fn get(router: &Router<()>, uri: &str, bearer: Option<&str>) -> axum::response::Response {
        let mut request = Request::builder().uri(uri);
        if let Some(token) = bearer {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        router
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn successful_responses_carry_quota_headers() {
        let app = super::router(test_state(AppConfig::default()));

        let response = get(&app, "/healthcheck", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers["x-ratelimit-limit"], "60");
        assert_eq!(headers["x-ratelimit-remaining"], "59");
        assert!(headers.contains_key("x-ratelimit-reset"));
    }

    #[tokio::test]
    async fn missing_token_yields_401_with_quota_headers() {
        let app = super::router(test_state(AppConfig::default()));

        let response = get(&app, "/user-games", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("x-ratelimit-remaining"));

        let body = body_string(response).await;
        assert!(body.contains("Unauthorized"));
        assert!(body.contains("signed in"));
    }

    #[tokio::test]
    async fn malformed_authorization_scheme_yields_401() {
        let state = test_state(AppConfig::default());
        let app = super::router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/user-games")
                    .header(AUTHORIZATION, "Basic abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_string(response).await;
        assert!(body.contains("Bearer"));
    }

    #[tokio::test]
    async fn exhausted_quota_answers_429_before_handlers_run() {
        let config = AppConfig {
            rate_limit: 1,
            ..AppConfig::default()
        };
        let app = super::router(test_state(config));

        let first = get(&app, "/healthcheck", None).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = get(&app, "/healthcheck", None).await;
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

        let headers = second.headers();
        assert_eq!(headers["x-ratelimit-remaining"], "0");
        assert!(headers.contains_key("retry-after"));

        let body = body_string(second).await;
        assert!(body.contains("RateLimited"));
        assert!(body.contains("retry later"));
    }

    #[tokio::test]
    async fn valid_bearer_token_reaches_the_user_games_handler() {
        let config = AppConfig::default();
        let token = issue_token(Uuid::new_v4(), "player@example.com", &config.token_secret).unwrap();
        let app = super::router(test_state(config));

        let response = get(&app, "/user-games", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(body.contains("\"total\":0"));
    }
}
