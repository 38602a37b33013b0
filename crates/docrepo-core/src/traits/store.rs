//! Document store trait.

use async_trait::async_trait;
use chrono::Utc;

use crate::Result;
use crate::document::{Document, StoredDocument};
use crate::error::BackendError;
use crate::model::Metadata;
use crate::query::Query;
use crate::types::{CollectionName, DocumentId};

/// A document database backend.
///
/// Implementations own connections and authentication. Errors they return
/// are passed through the repository unchanged.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Resolve a collection handle by name.
    fn get_collection(&self, name: &str) -> Result<CollectionName> {
        CollectionName::new(name)
    }

    /// Read one document. Absence is `Ok(None)`.
    async fn get_document(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
    ) -> Result<Option<StoredDocument>>;

    /// Write a new document.
    ///
    /// Fails with [`BackendError::AlreadyExists`] if the id is taken.
    async fn create_document(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        data: &Document,
    ) -> Result<()>;

    /// Write a document, replacing any previous body.
    async fn set_document(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        data: &Document,
    ) -> Result<()>;

    /// Overwrite an existing document and return the stored result.
    ///
    /// The new body is built with [`Metadata::replacement_body`]: user
    /// fields come from `data`, `created_at` is kept from the stored
    /// document and `updated_at` advances past its stored value. Fails with
    /// [`BackendError::NotFound`] if the document does not exist.
    ///
    /// The provided implementation is a read followed by a write; backends
    /// that can lock or transact should override it.
    async fn update_document(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        data: &Document,
    ) -> Result<StoredDocument> {
        let Some(current) = self.get_document(collection, id).await? else {
            return Err(BackendError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }
            .into());
        };
        let next = Metadata::replacement_body(&current.data, data, Utc::now());
        self.set_document(collection, id, &next).await?;
        Ok(StoredDocument::new(id.clone(), next))
    }

    /// Remove a document. Returns whether it existed.
    async fn delete_document(&self, collection: &CollectionName, id: &DocumentId) -> Result<bool>;

    /// Run a query: filters, then ordering, then limit.
    async fn run_query(&self, query: &Query) -> Result<Vec<StoredDocument>>;

    /// A fresh id for a new document in `collection`.
    fn allocate_document_id(&self, _collection: &CollectionName) -> DocumentId {
        DocumentId::generate()
    }
}
