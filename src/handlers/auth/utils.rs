use crate::error::ApiError;

/// Default password minimum length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Basic email validation for registration and user management.
pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    if !email.contains('@') || !email.contains('.') {
        return Err("Invalid email format".to_string());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| {
        tracing::error!("password hashing failed: {}", e);
        ApiError::internal_server_error("Could not process registration")
    })
}

/// Verify a password against a stored bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    bcrypt::verify(password, hash).map_err(|e| {
        tracing::error!("password verification failed: {}", e);
        ApiError::internal_server_error("Could not verify credentials")
    })
}
