//! Request DTOs for the HTTP API.

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

/// `POST /users` body.
///
/// Both fields are optional on the wire so that a missing field is reported
/// as "Missing email" / "Missing password" rather than as malformed JSON.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address.
    #[serde(default)]
    #[validate(length(max = 254))]
    pub email: Option<String>,
    /// Password.
    #[serde(default)]
    pub password: Option<String>,
}

/// `POST /files` body.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
    /// Display name.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub name: Option<String>,
    /// `folder`, `file` or `image`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Containing folder id; `0`, `"0"` or absent for the root.
    #[serde(default)]
    pub parent_id: Option<Value>,
    /// Initial visibility.
    #[serde(default)]
    pub is_public: Option<bool>,
    /// Base64-encoded content.
    #[serde(default)]
    pub data: Option<String>,
}

impl CreateFileRequest {
    /// The parent folder id, or `None` for the root.
    pub fn parent(&self) -> Option<String> {
        parent_ref(self.parent_id.as_ref()?)
    }
}

/// `GET /files` query.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesQuery {
    /// Folder to list; root when absent or `0`.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// 0-based page; unparsable values mean the first page.
    #[serde(default)]
    pub page: Option<String>,
}

impl ListFilesQuery {
    /// The folder to list, or `None` for the root.
    pub fn parent(&self) -> Option<String> {
        parent_ref(&Value::String(self.parent_id.clone()?))
    }

    /// The requested page.
    pub fn page(&self) -> usize {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// Interpret a wire parent reference, where `0` names the root.
fn parent_ref(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() || s == "0" => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_u64() == Some(0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}
