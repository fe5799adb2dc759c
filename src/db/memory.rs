//! In-process document store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    new_document_id, unique_value, Collection, Document, DocumentId, DocumentStore, Filter,
    FindOptions, ID_FIELD,
};
use crate::{FilesError, Result};

/// Document store held in memory.
///
/// Used by tests and by `backend = "memory"`. Collections are vectors, so
/// iteration order is insertion order.
#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate losing (or regaining) the connection to the store.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(FilesError::Unavailable("memory store is offline".to_string()))
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<DocumentId> {
        self.check_available()?;

        let id = new_document_id();
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        let mut collections = self.collections.write().await;
        collections.entry(collection).or_default().push(doc);

        Ok(id)
    }

    async fn insert_unique(
        &self,
        collection: Collection,
        mut doc: Document,
        field: &str,
    ) -> Result<DocumentId> {
        self.check_available()?;

        let value = Value::String(unique_value(&doc, field)?.to_string());

        // Held across the check and the push.
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|d| d.get(field) == Some(&value)) {
            return Err(FilesError::Duplicate(field.to_string()));
        }

        let id = new_document_id();
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        docs.push(doc);

        Ok(id)
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        self.check_available()?;

        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)).cloned()))
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>> {
        self.check_available()?;

        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let matching = docs.iter().filter(|d| filter.matches(d)).skip(options.skip);
        let result = match options.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        };
        Ok(result)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Document,
    ) -> Result<bool> {
        self.check_available()?;

        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| filter.matches(d)))
        else {
            return Ok(false);
        };

        for (field, value) in patch {
            if field != ID_FIELD {
                doc.insert(field, value);
            }
        }
        Ok(true)
    }

    async fn count(&self, collection: Collection) -> Result<u64> {
        self.check_available()?;

        let collections = self.collections.read().await;
        Ok(collections.get(&collection).map_or(0, |docs| docs.len() as u64))
    }

    async fn is_alive(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
