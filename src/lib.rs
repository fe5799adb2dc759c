//! Files Manager - a small file upload and sharing service.
//!
//! Users register with an email and password, exchange them for a session
//! token, and upload files and folders that stay private until published.

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use auth::{AuthService, PasswordError};
pub use cache::{Cache, MemoryCache, SqliteCache};
pub use config::Config;
pub use db::{Database, DocumentStore, MemoryStore, User, UserRepository};
pub use error::{FilesError, Result};
pub use file::{FileKind, FileRecord, FileService, FileStorage, UploadRequest};
