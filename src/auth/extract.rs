use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::{self, cookies, TOKEN_KIND_ACCESS};
use crate::config;
use crate::error::ApiError;

/// Authenticated caller, resolved from the access-token cookie.
///
/// Handlers that take this extractor reject unauthenticated requests with
/// 401 before any of their own logic runs.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let name = &config::config().security.access_cookie_name;
        let token = cookies::read_cookie(&parts.headers, name).ok_or_else(|| {
            ApiError::unauthorized("Authentication credentials were not provided.")
        })?;

        let claims = auth::decode_token(&token, TOKEN_KIND_ACCESS)
            .map_err(|_| ApiError::unauthorized("Invalid or expired access token."))?;

        Ok(CurrentUser {
            id: claims.sub,
            username: claims.username,
        })
    }
}
