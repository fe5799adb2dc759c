//! Response DTOs for the HTTP API.

use serde::Serialize;
use serde_json::Value;

use crate::db::User;
use crate::file::{FileKind, FileRecord};

/// `GET /status` response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Whether the session cache is reachable.
    pub redis: bool,
    /// Whether the document store is reachable.
    pub db: bool,
}

/// `GET /stats` response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Number of registered users.
    pub users: u64,
    /// Number of file records.
    pub files: u64,
}

/// Public view of a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: String,
    /// Email address.
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// `GET /connect` response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Session token, sent back in `X-Token`.
    pub token: String,
}

/// Public view of a file record.
///
/// The content location is never exposed; the root parent is `0`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    /// Record ID.
    pub id: String,
    /// Owner's user ID.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Record kind.
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Visibility.
    pub is_public: bool,
    /// Containing folder ID, or `0` at the root.
    pub parent_id: Value,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        Self {
            id: file.id,
            user_id: file.user_id,
            name: file.name,
            kind: file.kind,
            is_public: file.is_public,
            parent_id: file.parent_id.map_or(Value::from(0), Value::String),
        }
    }
}
