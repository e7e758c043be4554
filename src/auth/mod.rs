use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

pub mod cookies;
pub mod extract;
pub mod middleware;

pub const TOKEN_KIND_ACCESS: &str = "access";
pub const TOKEN_KIND_REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub username: String,
    /// "access" or "refresh"; tokens are not interchangeable
    pub kind: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn access(user_id: i64, username: &str) -> Self {
        let lifetime =
            Duration::minutes(config::config().security.access_token_lifetime_mins);
        Self::new(user_id, username, TOKEN_KIND_ACCESS, lifetime)
    }

    pub fn refresh(user_id: i64, username: &str) -> Self {
        let lifetime =
            Duration::hours(config::config().security.refresh_token_lifetime_hours);
        Self::new(user_id, username, TOKEN_KIND_REFRESH, lifetime)
    }

    fn new(user_id: i64, username: &str, kind: &str, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            username: username.to_string(),
            kind: kind.to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token generation failed: {0}")]
    TokenGeneration(String),

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("wrong token kind")]
    WrongTokenKind,
}

pub fn encode_token(claims: &Claims) -> Result<String, AuthError> {
    let secret = &config::config().security.jwt_secret;
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Decode and validate a token, including its kind. Expiry is validated
/// with the library's default leeway.
pub fn decode_token(token: &str, expected_kind: &str) -> Result<Claims, AuthError> {
    let secret = &config::config().security.jwt_secret;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    if data.claims.kind != expected_kind {
        return Err(AuthError::WrongTokenKind);
    }
    Ok(data.claims)
}

/// Exchange a refresh token for a fresh access token. This is the single
/// refresh primitive shared by the refresh endpoint and the reauth
/// middleware.
pub fn refresh_access_token(refresh_token: &str) -> Result<String, AuthError> {
    let claims = decode_token(refresh_token, TOKEN_KIND_REFRESH)?;
    encode_token(&Claims::access(claims.sub, &claims.username))
}
