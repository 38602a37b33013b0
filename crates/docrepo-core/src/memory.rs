//! MemoryStore - HashMap-backed document store for tests and embedding.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::Result;
use crate::document::{Document, StoredDocument};
use crate::error::BackendError;
use crate::model::Metadata;
use crate::query::Query;
use crate::traits::DocumentStore;
use crate::types::{CollectionName, DocumentId};

type Collections = HashMap<CollectionName, BTreeMap<DocumentId, Document>>;

/// In-memory document store.
///
/// Clone-friendly via Arc; clones share the same documents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    storage: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &CollectionName) -> Result<usize> {
        Ok(self.read()?.get(collection).map_or(0, BTreeMap::len))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>> {
        self.storage.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>> {
        self.storage.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> crate::Error {
    BackendError::Unavailable {
        message: "lock poisoned".into(),
    }
    .into()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
    ) -> Result<Option<StoredDocument>> {
        let storage = self.read()?;
        Ok(storage
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| StoredDocument::new(id.clone(), data.clone())))
    }

    async fn create_document(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        data: &Document,
    ) -> Result<()> {
        let mut storage = self.write()?;
        let docs = storage.entry(collection.clone()).or_default();
        if docs.contains_key(id) {
            return Err(BackendError::AlreadyExists {
                collection: collection.to_string(),
                id: id.to_string(),
            }
            .into());
        }
        docs.insert(id.clone(), data.clone());
        Ok(())
    }

    async fn set_document(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        data: &Document,
    ) -> Result<()> {
        let mut storage = self.write()?;
        storage
            .entry(collection.clone())
            .or_default()
            .insert(id.clone(), data.clone());
        Ok(())
    }

    async fn update_document(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        data: &Document,
    ) -> Result<StoredDocument> {
        let mut storage = self.write()?;
        let Some(current) = storage.get_mut(collection).and_then(|docs| docs.get_mut(id)) else {
            return Err(BackendError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }
            .into());
        };
        *current = Metadata::replacement_body(current, data, Utc::now());
        Ok(StoredDocument::new(id.clone(), current.clone()))
    }

    async fn delete_document(&self, collection: &CollectionName, id: &DocumentId) -> Result<bool> {
        let mut storage = self.write()?;
        Ok(storage
            .get_mut(collection)
            .is_some_and(|docs| docs.remove(id).is_some()))
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<StoredDocument>> {
        let storage = self.read()?;
        let Some(docs) = storage.get(query.collection()) else {
            return Ok(Vec::new());
        };
        let results = query.apply(
            docs.iter()
                .map(|(id, data)| StoredDocument::new(id.clone(), data.clone())),
        );
        debug!(collection = %query.collection(), count = results.len(), "Evaluated query in memory");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> CollectionName {
        CollectionName::new("users").unwrap()
    }

    fn doc(value: serde_json::Value) -> Document {
        Document::new(value).unwrap()
    }

    #[tokio::test]
    async fn create_rejects_duplicates() {
        let store = MemoryStore::new();
        let id = DocumentId::new("a").unwrap();
        store.create_document(&users(), &id, &doc(json!({ "n": 1 }))).await.unwrap();

        let err = store
            .create_document(&users(), &id, &doc(json!({ "n": 2 })))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Backend(BackendError::AlreadyExists { .. })));
        assert_eq!(store.len(&users()).unwrap(), 1);
    }

    #[tokio::test]
    async fn update_replaces_body_and_requires_existing() {
        let store = MemoryStore::new();
        let id = DocumentId::new("a").unwrap();

        let err = store
            .update_document(&users(), &id, &doc(json!({ "n": 1 })))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let created = "2024-05-01T10:00:00Z";
        store
            .set_document(&users(), &id, &doc(json!({ "n": 1, "dropped": true, "created_at": created })))
            .await
            .unwrap();
        let replaced = store
            .update_document(&users(), &id, &doc(json!({ "n": 2 })))
            .await
            .unwrap();

        assert_eq!(replaced.data.get("n"), Some(&json!(2)));
        assert!(replaced.data.get("dropped").is_none());
        assert_eq!(replaced.data.get("created_at"), Some(&json!(created)));
        assert!(replaced.data.get("updated_at").is_some());

        let fetched = store.get_document(&users(), &id).await.unwrap().unwrap();
        assert_eq!(fetched, replaced);
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let store = MemoryStore::new();
        let id = DocumentId::new("a").unwrap();
        store.set_document(&users(), &id, &doc(json!({}))).await.unwrap();

        assert!(store.delete_document(&users(), &id).await.unwrap());
        assert!(!store.delete_document(&users(), &id).await.unwrap());
        assert!(store.get_document(&users(), &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = MemoryStore::new();
        let id = DocumentId::new("a").unwrap();
        store.set_document(&users(), &id, &doc(json!({}))).await.unwrap();

        let other = CollectionName::new("orders").unwrap();
        assert!(store.get_document(&other, &id).await.unwrap().is_none());
        assert!(store.run_query(&Query::new(other)).await.unwrap().is_empty());
    }
}
