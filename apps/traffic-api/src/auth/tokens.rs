//! Bearer token verification (HS256 JWT) and dev-time minting.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Lifetime of tokens minted by [`mint_token`] (24 hours).
pub const TOKEN_TTL_SECS: i64 = 24 * 3600;

/// Claims carried by a dashboard bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign a token for `user_id` that expires after `ttl`.
pub fn mint_token(
    secret: &str,
    user_id: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify signature and expiry, returning the claims.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, GatewayError> {
    let validation = Validation::new(Algorithm::HS256);
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(?e, "bearer token validation failed");
        GatewayError::Unauthenticated("Invalid or expired token".to_string())
    })
}
