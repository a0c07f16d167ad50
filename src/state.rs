use std::{sync::Arc, time::Duration};

use crate::{config::AppConfig, dao::entry_store::UserGameStore, http::rate_limit::RateLimiter};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state: the injected store handle, configuration, and
/// the rate limiter.
///
/// Constructed once at startup and passed into every request-scoped
/// operation; nothing here is a process-global.
pub struct AppState {
    config: AppConfig,
    store: Arc<dyn UserGameStore>,
    rate_limiter: RateLimiter,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned
    /// cheaply across handlers.
    pub fn new(config: AppConfig, store: Arc<dyn UserGameStore>) -> SharedState {
        let rate_limiter = RateLimiter::new(
            config.rate_limit,
            Duration::from_secs(config.rate_window_secs),
        );
        Arc::new(Self {
            config,
            store,
            rate_limiter,
        })
    }

    /// Handle to the row store.
    pub fn store(&self) -> Arc<dyn UserGameStore> {
        self.store.clone()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Per-identity request rate limiter.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}
