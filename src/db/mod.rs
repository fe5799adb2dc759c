//! Document store for Files Manager.
//!
//! Users and file records are kept as JSON documents in named collections.
//! Services never talk to a backend directly: they receive an
//! `Arc<dyn DocumentStore>` and go through the typed repositories.

mod memory;
mod repository;
mod schema;
mod sqlite;
mod user;

pub use memory::MemoryStore;
pub use repository::UserRepository;
pub use schema::MIGRATIONS;
pub use sqlite::{Database, DbPool};
pub use user::{NewUser, User};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{FilesError, Result};

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

/// Store-assigned document identifier.
pub type DocumentId = String;

/// Field holding the document identifier.
pub const ID_FIELD: &str = "_id";

/// Collections known to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Registered users.
    Users,
    /// File and folder records.
    Files,
}

impl Collection {
    /// Collection name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Files => "files",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equality filter over top-level document fields.
///
/// A `null` condition also matches documents that lack the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Create an empty filter that matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on the document identifier.
    pub fn by_id(id: &str) -> Self {
        Self::new().eq(ID_FIELD, id)
    }

    /// Add an equality condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// The conditions of this filter.
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Whether a document satisfies every condition.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| doc.get(field).unwrap_or(&Value::Null) == value)
    }
}

/// Window into the insertion-ordered result of a `find`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Number of matching documents to skip.
    pub skip: usize,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl FindOptions {
    /// A page of `size` documents starting at page `page` (0-based).
    pub fn page(page: usize, size: usize) -> Self {
        Self {
            skip: page.saturating_mul(size),
            limit: Some(size),
        }
    }
}

/// Operations the service needs from a document store.
///
/// Each call is atomic on a single document; nothing spans documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the backend, for logs and diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Insert a document and return its new identifier.
    ///
    /// Any `_id` in `doc` is replaced.
    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<DocumentId>;

    /// Insert a document unless another document of the collection has the
    /// same string value in `field`.
    ///
    /// The check and the insert are one atomic step. A clash is reported as
    /// [`FilesError::Duplicate`] naming the field.
    async fn insert_unique(
        &self,
        collection: Collection,
        doc: Document,
        field: &str,
    ) -> Result<DocumentId>;

    /// First document matching `filter`, in insertion order.
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>>;

    /// All documents matching `filter`, in insertion order, windowed by `options`.
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>>;

    /// Merge `patch` into the first document matching `filter`.
    ///
    /// Returns `false` when nothing matched. `_id` is never patched.
    async fn update_one(&self, collection: Collection, filter: &Filter, patch: Document)
        -> Result<bool>;

    /// Number of documents in a collection.
    async fn count(&self, collection: Collection) -> Result<u64>;

    /// Whether the backend is reachable.
    async fn is_alive(&self) -> bool;
}

/// Generate a new document identifier.
pub(crate) fn new_document_id() -> DocumentId {
    uuid::Uuid::new_v4().simple().to_string()
}

/// The string held by a unique field of `doc`.
pub(crate) fn unique_value<'a>(doc: &'a Document, field: &str) -> Result<&'a str> {
    doc.get(field).and_then(Value::as_str).ok_or_else(|| {
        FilesError::Database(format!("unique field '{field}' must be a string"))
    })
}

/// Serialize a value into a document.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(FilesError::Database(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Deserialize a document into a typed value.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}
