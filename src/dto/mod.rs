use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Catalog browsing DTOs.
pub mod game;
/// Health check response shape.
pub mod health;
/// User-game requests, responses, and query parsing.
pub mod user_game;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
