//! Play Queue Back binary entrypoint wiring REST, auth, and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod config;
mod dao;
mod dto;
mod error;
mod http;
mod routes;
mod services;
mod state;

use config::AppConfig;
use dao::entry_store::UserGameStore;
use dao::entry_store::memory::MemoryEntryStore;
use dao::models::GameEntity;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = Arc::new(MemoryEntryStore::new());
    seed_catalog(store.as_ref()).await;

    let app_state = AppState::new(config, store);
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Seed the in-memory catalog so the API is usable out of the box.
///
/// In a deployment the catalog is populated by the external import
/// pipeline; the built-in rows only cover local development.
async fn seed_catalog(store: &dyn UserGameStore) {
    let games = [
        (1, "Hollow Knight", 920, Some(63)),
        (2, "Celeste", 870, Some(32)),
        (3, "Hades", 950, Some(49)),
        (4, "Outer Wilds", 810, Some(42)),
        (5, "Disco Elysium", 780, Some(54)),
        (6, "Slay the Spire", 760, Some(46)),
        (7, "Stardew Valley", 900, Some(40)),
        (8, "Return of the Obra Dinn", 700, None),
    ];

    for (game_id, title, popularity_score, achievements_total) in games {
        let game = GameEntity {
            game_id,
            title: title.into(),
            slug: title.to_lowercase().replace(' ', "-"),
            popularity_score,
            achievements_total,
        };
        if let Err(err) = store.upsert_game(game).await {
            warn!(error = %err, game_id, "failed to seed catalog game");
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: state::SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
