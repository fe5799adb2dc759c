//! Session management for Files Manager.
//!
//! A session is an opaque token mapped to a user id in the [`Cache`] under
//! `auth_<token>`. The mapping expires after a fixed TTL; reads never
//! extend it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::registration::{register, RegistrationRequest};
use crate::auth::verify_password;
use crate::cache::Cache;
use crate::db::{User, UserRepository};
use crate::{FilesError, Result};

/// Default session lifetime in seconds (24 hours).
pub const DEFAULT_SESSION_DURATION_SECS: u64 = 24 * 60 * 60;

/// Prefix of session keys in the cache.
pub const SESSION_KEY_PREFIX: &str = "auth_";

/// Cache key holding the session for `token`.
pub fn session_key(token: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{token}")
}

/// Issues, resolves and revokes session tokens.
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl AuthService {
    /// Create an auth service with the default session lifetime.
    pub fn new(users: UserRepository, cache: Arc<dyn Cache>) -> Self {
        Self::with_ttl(
            users,
            cache,
            Duration::from_secs(DEFAULT_SESSION_DURATION_SECS),
        )
    }

    /// Create an auth service with a custom session lifetime.
    pub fn with_ttl(users: UserRepository, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { users, cache, ttl }
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The user repository this service authenticates against.
    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    /// Register a new user.
    pub async fn register(&self, email: &str, password: &str) -> Result<User> {
        register(&self.users, RegistrationRequest::new(email, password)).await
    }

    /// Check credentials and open a session, returning its token.
    ///
    /// An unknown email and a wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let email = email.trim();
        let user = match self.users.get_by_email(email).await? {
            Some(user) => user,
            None => {
                warn!(email = %email, "Login failed: user not found");
                return Err(FilesError::Unauthorized);
            }
        };

        if verify_password(password, &user.password_hash).is_err() {
            warn!(email = %email, "Login failed: wrong password");
            return Err(FilesError::Unauthorized);
        }

        let token = Uuid::new_v4().to_string();
        self.cache
            .set(&session_key(&token), &user.id, self.ttl)
            .await?;

        info!(
            user_id = %user.id,
            ttl_secs = self.ttl.as_secs(),
            "Login successful"
        );
        Ok(token)
    }

    /// Close the session for `token`.
    pub async fn logout(&self, token: &str) -> Result<()> {
        let key = session_key(token);
        let user_id = match self.cache.get(&key).await? {
            Some(user_id) => user_id,
            None => {
                debug!("Logout: session not found");
                return Err(FilesError::Unauthorized);
            }
        };

        self.cache.del(&key).await?;
        info!(user_id = %user_id, "Session logged out");
        Ok(())
    }

    /// Resolve `token` to the user id it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<String> {
        if token.is_empty() {
            return Err(FilesError::Unauthorized);
        }

        self.cache
            .get(&session_key(token))
            .await?
            .ok_or(FilesError::Unauthorized)
    }

    /// Resolve `token` to the full user record.
    ///
    /// A session whose user no longer exists is treated as invalid.
    pub async fn current_user(&self, token: &str) -> Result<User> {
        let user_id = self.authenticate(token).await?;
        self.users
            .get_by_id(&user_id)
            .await?
            .ok_or(FilesError::Unauthorized)
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("users", &self.users)
            .field("cache", &self.cache.backend_name())
            .field("ttl", &self.ttl)
            .finish()
    }
}
