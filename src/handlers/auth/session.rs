use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use super::utils::verify_password;
use crate::auth::{self, cookies, Claims};
use crate::config;
use crate::database::repository::UserRepository;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

/// POST /api/auth/token - authenticate and receive token cookies
///
/// Accepts either username or email. On success both the access and the
/// refresh token are set as HTTP-only cookies; the access token is also
/// returned in the body for non-browser clients.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let login = payload
        .username
        .as_deref()
        .or(payload.email.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation_error("Username or email is required.", None))?;

    let users = UserRepository::new(state.pool.clone());
    let user = users
        .find_by_login(login)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials."))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Invalid credentials."));
    }

    let access = auth::encode_token(&Claims::access(user.id, &user.username))?;
    let refresh = auth::encode_token(&Claims::refresh(user.id, &user.username))?;

    let mut response = Json(json!({
        "access": access,
        "user": user.public(),
    }))
    .into_response();
    append_set_cookie(response.headers_mut(), &cookies::access_cookie(&access));
    append_set_cookie(response.headers_mut(), &cookies::refresh_cookie(&refresh));

    tracing::info!(user_id = user.id, "login");
    Ok(response)
}

/// POST /api/auth/token/refresh - exchange the refresh token for a new
/// access token
///
/// The token is read from the refresh cookie, with a `refresh` body field
/// as a fallback for non-browser clients.
pub async fn refresh(
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> Result<Response, ApiError> {
    let cfg = &config::config().security;
    let token = cookies::read_cookie(&headers, &cfg.refresh_cookie_name)
        .or_else(|| body.and_then(|Json(b)| b.refresh))
        .ok_or_else(|| ApiError::unauthorized("Refresh token was not provided."))?;

    let access = auth::refresh_access_token(&token)
        .map_err(|_| ApiError::unauthorized("Token is invalid or expired."))?;

    let mut response = Json(json!({ "access": access })).into_response();
    append_set_cookie(response.headers_mut(), &cookies::access_cookie(&access));
    Ok(response)
}

fn append_set_cookie(headers: &mut HeaderMap, cookie: &cookie::Cookie<'static>) {
    if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
        headers.append(SET_COOKIE, value);
    }
}
