//! Application-level configuration loading: rate-limit quotas and the
//! bearer-token secret.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PLAY_QUEUE_BACK_CONFIG_PATH";
/// Environment variable overriding the token secret from the config file.
const TOKEN_SECRET_ENV: &str = "PLAY_QUEUE_BACK_TOKEN_SECRET";

/// Requests allowed per identity per window when the config omits a value.
const DEFAULT_RATE_LIMIT: u32 = 60;
/// Window length in seconds when the config omits a value.
const DEFAULT_RATE_WINDOW_SECS: u64 = 60;
/// Development-only fallback secret; overridden in any real deployment.
const DEFAULT_TOKEN_SECRET: &str = "play-queue-dev-secret";

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Requests allowed per identity within one rate-limit window.
    pub rate_limit: u32,
    /// Length of the rate-limit window in seconds.
    pub rate_window_secs: u64,
    /// HMAC secret used to verify bearer tokens.
    pub token_secret: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in
    /// defaults, then apply environment overrides.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Ok(secret) = env::var(TOKEN_SECRET_ENV) {
            if !secret.is_empty() {
                config.token_secret = secret;
            }
        }

        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_window_secs: DEFAULT_RATE_WINDOW_SECS,
            token_secret: DEFAULT_TOKEN_SECRET.into(),
        }
    }
}

/// JSON representation of the configuration file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    rate_limit: Option<u32>,
    #[serde(default)]
    rate_window_secs: Option<u64>,
    #[serde(default)]
    token_secret: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            rate_limit: value.rate_limit.unwrap_or(defaults.rate_limit),
            rate_window_secs: value.rate_window_secs.unwrap_or(defaults.rate_window_secs),
            token_secret: value.token_secret.unwrap_or(defaults.token_secret),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
