//! File record types and repository for Files Manager.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::db::{from_document, to_document, Collection, DocumentStore, Filter, FindOptions};
use crate::{FilesError, Result};

/// Kind of a file record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// A container for other records. Has no content.
    Folder,
    /// A plain file.
    File,
    /// An image. Stored and served exactly like a plain file.
    Image,
}

impl FileKind {
    /// Name of the kind on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Folder => "folder",
            FileKind::File => "file",
            FileKind::Image => "image",
        }
    }

    /// Whether records of this kind carry content.
    pub fn has_content(&self) -> bool {
        !matches!(self, FileKind::Folder)
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = FilesError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "folder" => Ok(FileKind::Folder),
            "file" => Ok(FileKind::File),
            "image" => Ok(FileKind::Image),
            _ => Err(FilesError::Validation("Missing type".to_string())),
        }
    }
}

/// A stored file or folder record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Unique record ID.
    #[serde(rename = "_id")]
    pub id: String,
    /// Owner's user ID.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Record kind.
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Whether anyone may read the record.
    #[serde(default)]
    pub is_public: bool,
    /// Containing folder; `None` at the root.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Where the content lives on disk. Folders have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

impl FileRecord {
    /// Whether `requester` may see this record.
    pub fn is_visible_to(&self, requester: Option<&str>) -> bool {
        self.is_public || requester == Some(self.user_id.as_str())
    }
}

/// Data for creating a new file record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFile {
    /// Owner's user ID.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Record kind.
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Initial visibility.
    pub is_public: bool,
    /// Containing folder; serialized as `null` at the root.
    pub parent_id: Option<String>,
    /// Where the content lives on disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

impl NewFile {
    /// Create a private record at the root.
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, kind: FileKind) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            kind,
            is_public: false,
            parent_id: None,
            local_path: None,
        }
    }

    /// Place the record inside a folder.
    pub fn with_parent(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Set the initial visibility.
    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Set the content location.
    pub fn with_local_path(mut self, local_path: impl Into<String>) -> Self {
        self.local_path = Some(local_path.into());
        self
    }
}

/// Repository for the `files` collection.
#[derive(Clone)]
pub struct FileRepository {
    store: Arc<dyn DocumentStore>,
}

impl FileRepository {
    /// Create a new FileRepository.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a new record.
    pub async fn create(&self, file: &NewFile) -> Result<FileRecord> {
        let id = self
            .store
            .insert_one(Collection::Files, to_document(file)?)
            .await?;

        Ok(FileRecord {
            id,
            user_id: file.user_id.clone(),
            name: file.name.clone(),
            kind: file.kind,
            is_public: file.is_public,
            parent_id: file.parent_id.clone(),
            local_path: file.local_path.clone(),
        })
    }

    /// Get a record by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<FileRecord>> {
        self.find_one(Filter::by_id(id)).await
    }

    /// Get a record by ID, only if owned by `owner`.
    pub async fn get_owned(&self, id: &str, owner: &str) -> Result<Option<FileRecord>> {
        self.find_one(Filter::by_id(id).eq("userId", owner)).await
    }

    /// List `owner`'s records directly under `parent` (root when `None`).
    pub async fn list_by_owner(
        &self,
        owner: &str,
        parent: Option<&str>,
        options: FindOptions,
    ) -> Result<Vec<FileRecord>> {
        let parent = parent.map_or(Value::Null, Value::from);
        let filter = Filter::new().eq("userId", owner).eq("parentId", parent);

        self.store
            .find(Collection::Files, &filter, options)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Set the visibility flag. Returns `false` if no record has this ID.
    pub async fn set_public(&self, id: &str, is_public: bool) -> Result<bool> {
        let mut patch = Map::new();
        patch.insert("isPublic".to_string(), Value::Bool(is_public));

        self.store
            .update_one(Collection::Files, &Filter::by_id(id), patch)
            .await
    }

    /// Count all records.
    pub async fn count(&self) -> Result<u64> {
        self.store.count(Collection::Files).await
    }

    async fn find_one(&self, filter: Filter) -> Result<Option<FileRecord>> {
        match self.store.find_one(Collection::Files, &filter).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for FileRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRepository")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}
