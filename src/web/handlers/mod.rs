//! API handlers.

pub mod app;
pub mod auth;
pub mod file;
pub mod user;

pub use app::*;
pub use auth::*;
pub use file::*;
pub use user::*;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthService;
use crate::cache::Cache;
use crate::db::{DocumentStore, UserRepository};
use crate::file::{FileRepository, FileService, FileStorage};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document store holding users and file records.
    pub store: Arc<dyn DocumentStore>,
    /// Session cache.
    pub cache: Arc<dyn Cache>,
    /// Login, logout and token resolution.
    pub auth: AuthService,
    /// File records and content.
    pub files: FileService,
}

impl AppState {
    /// Create application state over the given backends with default limits.
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<dyn Cache>, storage: FileStorage) -> Self {
        let auth = AuthService::new(UserRepository::new(store.clone()), cache.clone());
        let files = FileService::new(FileRepository::new(store.clone()), storage);

        Self {
            store,
            cache,
            auth,
            files,
        }
    }

    /// Set the session lifetime.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.auth = AuthService::with_ttl(self.auth.users().clone(), self.cache.clone(), ttl);
        self
    }

    /// Set the maximum accepted content size.
    pub fn with_max_upload_size(mut self, bytes: u64) -> Self {
        self.files = self.files.with_max_file_size(bytes);
        self
    }

    /// Set the listing page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.files = self.files.with_page_size(page_size);
        self
    }

    /// The user repository.
    pub fn users(&self) -> &UserRepository {
        self.auth.users()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store.backend_name())
            .field("cache", &self.cache.backend_name())
            .field("auth", &self.auth)
            .field("files", &self.files)
            .finish()
    }
}
