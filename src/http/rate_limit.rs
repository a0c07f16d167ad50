//! Fixed-window request rate limiting.
//!
//! Every API response carries `x-ratelimit-*` headers so clients always see
//! their current quota; exhausted identities receive a 429 with a
//! `retry-after` header before any handler runs.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde::Serialize;
use tracing::warn;

use crate::state::SharedState;

const HEADER_LIMIT: &str = "x-ratelimit-limit";
const HEADER_REMAINING: &str = "x-ratelimit-remaining";
const HEADER_RESET: &str = "x-ratelimit-reset";
const HEADER_RETRY_AFTER: &str = "retry-after";

/// Outcome of a rate-limit check for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests left in the current window (after this one).
    pub remaining: u32,
    /// Epoch second at which the current window resets.
    pub reset: u64,
    /// Seconds to wait before retrying; present only when limited.
    pub retry_after: Option<u64>,
}

impl RateLimitDecision {
    /// Whether the request exceeded the quota.
    pub fn is_limited(&self) -> bool {
        self.retry_after.is_some()
    }
}

struct Window {
    started: SystemTime,
    count: u32,
}

/// Per-identity fixed-window counter.
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    /// Build a limiter allowing `limit` requests per `window` per identity.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window,
        }
    }

    /// Record one request for `key` and return the resulting quota state.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = SystemTime::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now
            .duration_since(entry.started)
            .unwrap_or(Duration::ZERO);
        if elapsed >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        let reset_at = entry.started + self.window;
        let reset = reset_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();

        if entry.count >= self.limit {
            let retry_after = reset_at
                .duration_since(now)
                .unwrap_or(Duration::ZERO)
                .as_secs()
                .max(1);
            return RateLimitDecision {
                limit: self.limit,
                remaining: 0,
                reset,
                retry_after: Some(retry_after),
            };
        }

        entry.count += 1;
        RateLimitDecision {
            limit: self.limit,
            remaining: self.limit - entry.count,
            reset,
            retry_after: None,
        }
    }
}

#[derive(Serialize)]
struct RateLimitedBody {
    code: &'static str,
    message: String,
}

/// Middleware enforcing the per-identity quota and stamping quota headers on
/// every response.
///
/// The identity key is the `Authorization` header when present (one quota per
/// session token), falling back to a shared anonymous bucket.
pub async fn enforce_rate_limit(
    State(state): State<SharedState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("anonymous")
        .to_string();

    let decision = state.rate_limiter().check(&key);

    if decision.is_limited() {
        warn!(limit = decision.limit, reset = decision.reset, "rate limit exceeded");
        let body = Json(RateLimitedBody {
            code: "RateLimited",
            message: "Too many requests. Please retry later.".into(),
        });
        let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
        apply_headers(&mut response, decision);
        return response;
    }

    let mut response = next.run(request).await;
    apply_headers(&mut response, decision);
    response
}

fn apply_headers(response: &mut Response, decision: RateLimitDecision) {
    let headers = response.headers_mut();
    headers.insert(HEADER_LIMIT, numeric_header(decision.limit as u64));
    headers.insert(HEADER_REMAINING, numeric_header(decision.remaining as u64));
    headers.insert(HEADER_RESET, numeric_header(decision.reset));
    if let Some(retry_after) = decision.retry_after {
        headers.insert(HEADER_RETRY_AFTER, numeric_header(retry_after));
    }
}

fn numeric_header(value: u64) -> HeaderValue {
    // Decimal digits are always a valid header value.
    HeaderValue::from_str(&value.to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("0"))
}
