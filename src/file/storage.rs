//! Content storage for Files Manager.
//!
//! This module keeps file content on local disk:
//! - UUID-based file naming
//! - Directory sharding by first 2 characters of UUID
//! - Save, load, and delete operations

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::{FilesError, Result};

/// Content storage on the local filesystem.
///
/// Files are stored in a sharded directory structure:
/// ```text
/// {base_path}/
/// ├── ab/
/// │   └── ab12cd34-5678-90ab-cdef-123456789012.txt
/// ├── cd/
/// │   └── cd90ab12-3456-7890-abcd-ef1234567890.bin
/// └── ...
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Save content under a new UUID-based name.
    ///
    /// Returns the full path of the written file.
    pub async fn save(&self, content: &[u8], original_name: &str) -> Result<PathBuf> {
        let stored_name = Self::generate_stored_name(original_name);
        let file_path = self.get_file_path(&stored_name);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&file_path, content).await?;

        Ok(file_path)
    }

    /// Load content from a path returned by [`FileStorage::save`].
    pub async fn load(&self, path: &Path) -> Result<Vec<u8>> {
        match fs::read(path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FilesError::NotFound("Content".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a stored file.
    ///
    /// Returns `true` if the file was deleted, `false` if it didn't exist.
    pub async fn delete(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the full file path for a stored name.
    ///
    /// The path is constructed as: {base_path}/{shard}/{stored_name}
    pub fn get_file_path(&self, stored_name: &str) -> PathBuf {
        self.base_path
            .join(Self::get_shard(stored_name))
            .join(stored_name)
    }

    fn get_shard(stored_name: &str) -> &str {
        stored_name.get(..2).unwrap_or(stored_name)
    }

    /// Extract the file extension from a filename.
    ///
    /// Returns "bin" if no extension is found.
    fn extract_extension(filename: &str) -> &str {
        Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin")
    }

    /// Generate a new UUID-based stored name keeping the extension.
    pub fn generate_stored_name(original_name: &str) -> String {
        let ext = Self::extract_extension(original_name);
        format!("{}.{ext}", Uuid::new_v4())
    }
}
