//! File management module for Files Manager.
//!
//! This module provides:
//! - Folder and file records in a document store
//! - Public/private visibility owned by the uploader
//! - Content storage with UUID naming

mod metadata;
mod service;
mod storage;

pub use metadata::{FileKind, FileRecord, FileRepository, NewFile};
pub use service::{DownloadResult, FileService, UploadRequest};
pub use storage::FileStorage;

/// Maximum length for a file name (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Default maximum file size (10MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Number of records per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 20;
