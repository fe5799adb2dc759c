//! File service for Files Manager.
//!
//! This module provides high-level file operations including:
//! - Creation of folders and content-bearing files
//! - Paged listing of a user's folder
//! - Visibility-checked retrieval and download
//! - Publishing and unpublishing

use std::path::Path;

use tracing::{debug, info, warn};

use crate::db::FindOptions;
use crate::error::InvalidParent;
use crate::{FilesError, Result};

use super::metadata::{FileKind, FileRecord, FileRepository, NewFile};
use super::storage::FileStorage;
use super::{DEFAULT_MAX_FILE_SIZE, DEFAULT_PAGE_SIZE, MAX_FILENAME_LENGTH};

/// Request data for creating a file or folder.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Display name.
    pub name: String,
    /// Record kind; `None` when the client sent none or an unknown one.
    pub kind: Option<FileKind>,
    /// Containing folder; root when `None`.
    pub parent_id: Option<String>,
    /// Initial visibility.
    pub is_public: bool,
    /// Content, required for files and images.
    pub data: Option<Vec<u8>>,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(name: impl Into<String>, kind: FileKind) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind),
            ..Default::default()
        }
    }

    /// Set the containing folder.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Set the initial visibility.
    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Set the content.
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = Some(data.into());
        self
    }
}

/// Result of a file download.
#[derive(Debug)]
pub struct DownloadResult {
    /// File record.
    pub file: FileRecord,
    /// File content.
    pub content: Vec<u8>,
}

/// File service for managing file records and their content.
#[derive(Debug, Clone)]
pub struct FileService {
    files: FileRepository,
    storage: FileStorage,
    max_file_size: u64,
    page_size: usize,
}

impl FileService {
    /// Create a new FileService.
    pub fn new(files: FileRepository, storage: FileStorage) -> Self {
        Self {
            files,
            storage,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set a custom max file size.
    pub fn with_max_file_size(mut self, max_size: u64) -> Self {
        self.max_file_size = max_size;
        self
    }

    /// Set a custom listing page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// The underlying repository.
    pub fn repository(&self) -> &FileRepository {
        &self.files
    }

    /// Create a file or folder owned by `user_id`.
    ///
    /// # Validation
    /// - Name: present, max 255 characters
    /// - Kind: one of `folder`, `file`, `image`
    /// - Data: required unless the kind is `folder`
    /// - Parent: if given, an existing folder
    ///
    /// Content is written to storage before the record is persisted.
    pub async fn create(&self, user_id: &str, request: &UploadRequest) -> Result<FileRecord> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(FilesError::Validation("Missing name".to_string()));
        }
        if name.chars().count() > MAX_FILENAME_LENGTH {
            return Err(FilesError::Validation(format!(
                "Name must be at most {MAX_FILENAME_LENGTH} characters"
            )));
        }

        let kind = request
            .kind
            .ok_or_else(|| FilesError::Validation("Missing type".to_string()))?;

        let data = match (&request.data, kind.has_content()) {
            (None, true) => return Err(FilesError::Validation("Missing data".to_string())),
            (Some(data), true) => Some(data.as_slice()),
            (_, false) => None,
        };

        if let Some(data) = data {
            if data.len() as u64 > self.max_file_size {
                let max_mb = self.max_file_size / 1024 / 1024;
                return Err(FilesError::Validation(format!(
                    "File too large (max {max_mb}MB)"
                )));
            }
        }

        if let Some(parent_id) = &request.parent_id {
            let parent = self
                .files
                .get_by_id(parent_id)
                .await?
                .ok_or(FilesError::InvalidParent(InvalidParent::NotFound))?;
            if parent.kind != FileKind::Folder {
                return Err(FilesError::InvalidParent(InvalidParent::NotAFolder));
            }
        }

        let new_file = NewFile::new(user_id, name, kind)
            .with_parent(request.parent_id.clone())
            .with_public(request.is_public);

        let Some(data) = data else {
            let folder = self.files.create(&new_file).await?;
            info!(file_id = %folder.id, user_id = %user_id, "Folder created");
            return Ok(folder);
        };

        let path = self.storage.save(data, name).await?;
        let new_file = new_file.with_local_path(path.to_string_lossy());

        match self.files.create(&new_file).await {
            Ok(file) => {
                info!(
                    file_id = %file.id,
                    user_id = %user_id,
                    kind = %kind,
                    size = data.len(),
                    "File created"
                );
                Ok(file)
            }
            Err(e) => {
                // Don't leave orphaned content behind.
                if let Err(cleanup) = self.storage.delete(&path).await {
                    warn!(
                        path = %path.display(),
                        error = %cleanup,
                        "Failed to remove orphaned content"
                    );
                }
                Err(e)
            }
        }
    }

    /// List `user_id`'s records directly under `parent_id` (root when `None`).
    ///
    /// Pages are 0-based and follow insertion order.
    pub async fn list(
        &self,
        user_id: &str,
        parent_id: Option<&str>,
        page: usize,
    ) -> Result<Vec<FileRecord>> {
        self.files
            .list_by_owner(user_id, parent_id, FindOptions::page(page, self.page_size))
            .await
    }

    /// Get a record visible to `requester`.
    ///
    /// Private records of other users are reported as missing.
    pub async fn get(&self, file_id: &str, requester: Option<&str>) -> Result<FileRecord> {
        match self.files.get_by_id(file_id).await? {
            Some(file) if file.is_visible_to(requester) => Ok(file),
            Some(_) => {
                debug!(file_id = %file_id, "Private file hidden from requester");
                Err(FilesError::NotFound("File".to_string()))
            }
            None => Err(FilesError::NotFound("File".to_string())),
        }
    }

    /// Publish or unpublish a record owned by `user_id`.
    pub async fn set_visibility(
        &self,
        file_id: &str,
        user_id: &str,
        is_public: bool,
    ) -> Result<FileRecord> {
        let mut file = self
            .files
            .get_owned(file_id, user_id)
            .await?
            .ok_or_else(|| FilesError::NotFound("File".to_string()))?;

        if !self.files.set_public(&file.id, is_public).await? {
            return Err(FilesError::NotFound("File".to_string()));
        }
        file.is_public = is_public;

        info!(file_id = %file.id, is_public, "File visibility changed");
        Ok(file)
    }

    /// Read the content of a record visible to `requester`.
    ///
    /// Folders have no content and are reported as missing.
    pub async fn read_content(
        &self,
        file_id: &str,
        requester: Option<&str>,
    ) -> Result<DownloadResult> {
        let file = self.get(file_id, requester).await?;

        let Some(local_path) = file.local_path.as_deref().filter(|_| file.kind.has_content())
        else {
            return Err(FilesError::NotFound("Content".to_string()));
        };

        let content = self.storage.load(Path::new(local_path)).await?;
        Ok(DownloadResult { file, content })
    }

    /// Count all records.
    pub async fn count(&self) -> Result<u64> {
        self.files.count().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::MemoryStore;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileService) {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let files = FileRepository::new(Arc::new(MemoryStore::new()));
        (dir, FileService::new(files, storage))
    }

    #[tokio::test]
    async fn test_create_file_defaults_private() {
        let (_dir, service) = setup();
        let file = service
            .create("u1", &UploadRequest::new("x.txt", FileKind::File).with_data("hi"))
            .await
            .unwrap();

        assert_eq!(file.user_id, "u1");
        assert_eq!(file.name, "x.txt");
        assert_eq!(file.kind, FileKind::File);
        assert!(!file.is_public);
        assert!(file.parent_id.is_none());
        assert!(file.local_path.is_some());
    }

    #[tokio::test]
    async fn test_create_public_folder() {
        let (_dir, service) = setup();
        let folder = service
            .create(
                "u1",
                &UploadRequest::new("dir", FileKind::Folder).with_public(true),
            )
            .await
            .unwrap();

        assert!(folder.is_public);
        assert!(folder.local_path.is_none());
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (_dir, service) = setup();

        let err = service
            .create("u1", &UploadRequest::new("  ", FileKind::Folder))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing name");

        let request = UploadRequest {
            name: "x".to_string(),
            ..Default::default()
        };
        let err = service.create("u1", &request).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing type");

        let err = service
            .create("u1", &UploadRequest::new("x", FileKind::File))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing data");

        let err = service
            .create("u1", &UploadRequest::new("x", FileKind::Image))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing data");

        assert_eq!(service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_too_large() {
        let (_dir, service) = setup();
        let service = service.with_max_file_size(4);

        let err = service
            .create("u1", &UploadRequest::new("x", FileKind::File).with_data("12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, FilesError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_invalid_parent() {
        let (_dir, service) = setup();

        let err = service
            .create(
                "u1",
                &UploadRequest::new("x", FileKind::Folder).with_parent("missing"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FilesError::InvalidParent(InvalidParent::NotFound)
        ));
        assert_eq!(err.to_string(), "Parent not found");

        let plain = service
            .create("u1", &UploadRequest::new("p", FileKind::File).with_data("x"))
            .await
            .unwrap();
        let err = service
            .create(
                "u1",
                &UploadRequest::new("x", FileKind::Folder).with_parent(plain.id),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FilesError::InvalidParent(InvalidParent::NotAFolder)
        ));
        assert_eq!(err.to_string(), "Parent is not a folder");
    }

    #[tokio::test]
    async fn test_create_inside_folder() {
        let (_dir, service) = setup();
        let folder = service
            .create("u1", &UploadRequest::new("dir", FileKind::Folder))
            .await
            .unwrap();
        let file = service
            .create(
                "u1",
                &UploadRequest::new("x.txt", FileKind::File)
                    .with_parent(folder.id.clone())
                    .with_data("hi"),
            )
            .await
            .unwrap();

        assert_eq!(file.parent_id.as_deref(), Some(folder.id.as_str()));
    }

    #[tokio::test]
    async fn test_list_pages_of_twenty() {
        let (_dir, service) = setup();
        for i in 0..25 {
            service
                .create("u1", &UploadRequest::new(format!("d{i}"), FileKind::Folder))
                .await
                .unwrap();
        }
        service
            .create("u2", &UploadRequest::new("other", FileKind::Folder))
            .await
            .unwrap();

        let first = service.list("u1", None, 0).await.unwrap();
        assert_eq!(first.len(), 20);
        assert_eq!(first[0].name, "d0");

        let second = service.list("u1", None, 1).await.unwrap();
        assert_eq!(second.len(), 5);
        assert_eq!(second[0].name, "d20");

        assert!(service.list("u1", None, 2).await.unwrap().is_empty());
        assert_eq!(service.list("u2", None, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_by_parent() {
        let (_dir, service) = setup();
        let folder = service
            .create("u1", &UploadRequest::new("dir", FileKind::Folder))
            .await
            .unwrap();
        service
            .create(
                "u1",
                &UploadRequest::new("inner", FileKind::Folder).with_parent(folder.id.clone()),
            )
            .await
            .unwrap();

        let root = service.list("u1", None, 0).await.unwrap();
        assert_eq!(root.len(), 1);

        let inside = service.list("u1", Some(&folder.id), 0).await.unwrap();
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].name, "inner");

        assert!(service.list("u1", Some("unknown"), 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_respects_visibility() {
        let (_dir, service) = setup();
        let file = service
            .create("u1", &UploadRequest::new("x.txt", FileKind::File).with_data("hi"))
            .await
            .unwrap();

        assert_eq!(service.get(&file.id, Some("u1")).await.unwrap(), file);
        assert!(matches!(
            service.get(&file.id, Some("u2")).await,
            Err(FilesError::NotFound(_))
        ));
        assert!(matches!(
            service.get(&file.id, None).await,
            Err(FilesError::NotFound(_))
        ));
        assert!(matches!(
            service.get("missing", Some("u1")).await,
            Err(FilesError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_set_visibility() {
        let (_dir, service) = setup();
        let file = service
            .create("u1", &UploadRequest::new("x.txt", FileKind::File).with_data("hi"))
            .await
            .unwrap();

        let published = service.set_visibility(&file.id, "u1", true).await.unwrap();
        assert!(published.is_public);
        assert_eq!(service.get(&file.id, None).await.unwrap(), published);

        // Idempotent.
        assert!(service.set_visibility(&file.id, "u1", true).await.unwrap().is_public);

        let unpublished = service.set_visibility(&file.id, "u1", false).await.unwrap();
        assert!(!unpublished.is_public);
        assert!(service.get(&file.id, None).await.is_err());
    }

    #[tokio::test]
    async fn test_set_visibility_requires_owner() {
        let (_dir, service) = setup();
        let file = service
            .create("u1", &UploadRequest::new("x.txt", FileKind::File).with_data("hi"))
            .await
            .unwrap();

        assert!(matches!(
            service.set_visibility(&file.id, "u2", true).await,
            Err(FilesError::NotFound(_))
        ));
        assert!(!service.get(&file.id, Some("u1")).await.unwrap().is_public);

        assert!(matches!(
            service.set_visibility("missing", "u1", true).await,
            Err(FilesError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_read_content() {
        let (_dir, service) = setup();
        let file = service
            .create("u1", &UploadRequest::new("x.txt", FileKind::File).with_data("Hello"))
            .await
            .unwrap();

        let download = service.read_content(&file.id, Some("u1")).await.unwrap();
        assert_eq!(download.content, b"Hello");
        assert_eq!(download.file.id, file.id);

        assert!(matches!(
            service.read_content(&file.id, None).await,
            Err(FilesError::NotFound(_))
        ));

        service.set_visibility(&file.id, "u1", true).await.unwrap();
        let download = service.read_content(&file.id, None).await.unwrap();
        assert_eq!(download.content, b"Hello");
    }

    #[tokio::test]
    async fn test_read_content_of_folder() {
        let (_dir, service) = setup();
        let folder = service
            .create("u1", &UploadRequest::new("dir", FileKind::Folder))
            .await
            .unwrap();

        assert!(matches!(
            service.read_content(&folder.id, Some("u1")).await,
            Err(FilesError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_read_content_missing_from_storage() {
        let (_dir, service) = setup();
        let file = service
            .create("u1", &UploadRequest::new("x.txt", FileKind::File).with_data("hi"))
            .await
            .unwrap();
        let path = file.local_path.clone().unwrap();
        std::fs::remove_file(path).unwrap();

        assert!(matches!(
            service.read_content(&file.id, Some("u1")).await,
            Err(FilesError::NotFound(_))
        ));
    }
}
