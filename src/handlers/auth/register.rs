use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use super::utils::{hash_password, validate_email_format, MIN_PASSWORD_LENGTH};
use crate::database::models::user::UserPublic;
use crate::database::repository::UserRepository;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// POST /api/auth/register - create a new user account
///
/// Username is optional; when omitted or blank one is derived from the
/// email local-part, with integer suffixes appended until an unused name
/// is found. Only public fields come back, never the password.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserPublic>), ApiError> {
    validate_email_format(&payload.email)
        .map_err(|msg| ApiError::validation_error(msg, None))?;

    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation_error(
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters."),
            None,
        ));
    }
    if payload.password != payload.password2 {
        return Err(ApiError::validation_error("Passwords do not match", None));
    }

    let users = UserRepository::new(state.pool.clone());

    if users.email_exists(&payload.email).await? {
        return Err(ApiError::validation_error(
            "This email is already registered.",
            None,
        ));
    }

    let username = match payload.username.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            if users.username_exists(name).await? {
                return Err(ApiError::validation_error(
                    "This username is already taken.",
                    None,
                ));
            }
            name.to_string()
        }
        _ => {
            // Derive from the email local-part; probe the store until an
            // unused candidate turns up.
            let base = payload.email.split('@').next().unwrap_or_default();
            let mut candidate = base.to_string();
            let mut counter = 1u32;
            while users.username_exists(&candidate).await? {
                candidate = format!("{base}{counter}");
                counter += 1;
            }
            candidate
        }
    };

    let password_hash = hash_password(&payload.password)?;
    let user = users
        .insert(
            &username,
            &payload.email,
            &password_hash,
            payload.first_name.as_deref().unwrap_or(""),
            payload.last_name.as_deref().unwrap_or(""),
        )
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "registered new user");
    Ok((StatusCode::CREATED, Json(user.public())))
}
