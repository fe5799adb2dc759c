//! User repository for Files Manager.

use std::sync::Arc;

use super::{from_document, to_document, Collection, DocumentStore, Filter, NewUser, User};
use crate::{FilesError, Result};

/// Repository for user operations on the `users` collection.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    /// Create a new UserRepository.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a new user.
    ///
    /// Fails with `Validation("Already exist")` when the email is taken,
    /// including by a registration racing this one.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id = self
            .store
            .insert_unique(Collection::Users, to_document(new_user)?, "email")
            .await
            .map_err(|e| match e {
                FilesError::Duplicate(_) => FilesError::Validation("Already exist".to_string()),
                other => other,
            })?;

        Ok(User {
            id,
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
        })
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        self.find(Filter::by_id(id)).await
    }

    /// Get a user by email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find(Filter::new().eq("email", email)).await
    }

    /// Check if an email is already registered.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.get_by_email(email).await?.is_some())
    }

    /// Count all users.
    pub async fn count(&self) -> Result<u64> {
        self.store.count(Collection::Users).await
    }

    async fn find(&self, filter: Filter) -> Result<Option<User>> {
        match self.store.find_one(Collection::Users, &filter).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for UserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRepository")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}
