//! Bearer-token authentication extractor.

pub mod token;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::auth::token::validate_token;
use crate::error::AppError;
use crate::state::SharedState;

/// Authenticated user resolved from a `Bearer` token in the `Authorization`
/// header.
///
/// Handlers take this as an extractor parameter; the user id used to scope
/// reads and writes always comes from here, never from the request payload.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's stable identifier.
    pub user_id: Uuid,
    /// Email the identity provider verified for this user.
    pub email: String,
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized("You must be signed in to access this resource.".into())
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".into())
        })?;

        let claims = validate_token(token, &state.config().token_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}
