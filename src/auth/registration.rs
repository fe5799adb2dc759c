//! User registration for Files Manager.

use tracing::{info, warn};

use crate::auth::{hash_password, PasswordError};
use crate::db::{NewUser, User, UserRepository};
use crate::{FilesError, Result};

/// Registration request data.
#[derive(Debug, Clone, Default)]
pub struct RegistrationRequest {
    /// Email address, used as the login name.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Register a new user.
///
/// Checks run in a fixed order so the first failure is the one reported:
/// missing email, missing password, duplicate email.
pub async fn register(repo: &UserRepository, request: RegistrationRequest) -> Result<User> {
    let email = request.email.trim();
    if email.is_empty() {
        return Err(FilesError::Validation("Missing email".to_string()));
    }
    if request.password.is_empty() {
        return Err(FilesError::Validation("Missing password".to_string()));
    }

    if repo.email_exists(email).await? {
        warn!(email = %email, "Registration failed: email already registered");
        return Err(FilesError::Validation("Already exist".to_string()));
    }

    let password_hash = hash_password(&request.password).map_err(|e| match e {
        PasswordError::HashError(msg) => FilesError::Database(msg),
        other => FilesError::Validation(other.to_string()),
    })?;

    let user = repo.create(&NewUser::new(email, password_hash)).await?;
    info!(user_id = %user.id, email = %user.email, "User registered");

    Ok(user)
}
