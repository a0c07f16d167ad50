//! Bearer-token generation and validation.
//!
//! Tokens are HS256-signed JWTs carrying the user's id and email. Issuance
//! normally happens in the external identity provider; the helper here exists
//! for local development and tests.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Token lifetime used by [`issue_token`].
const TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's id.
    pub sub: Uuid,
    /// Email the identity provider verified for this user.
    pub email: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: u64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: u64,
}

/// Sign a short-lived access token for the given user.
pub fn issue_token(
    user_id: Uuid,
    email: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs();

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: now + TOKEN_LIFETIME.as_secs(),
        iat: now,
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}
