//! Generic typed repository over one collection.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::Result;
use crate::model::Model;
use crate::query::{Operator, QueryBuilder};
use crate::traits::DocumentStore;
use crate::types::{CollectionName, DocumentId};

/// CRUD and queries for model `M` in one collection of store `S`.
///
/// Repositories are cheap to clone and safe to share between tasks; all
/// state lives in the shared store handle.
///
/// ```
/// use std::sync::Arc;
/// use docrepo_core::{MemoryStore, Metadata, Model, Repository};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize, Model)]
/// struct Note {
///     #[serde(flatten)]
///     meta: Metadata,
///     text: String,
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> docrepo_core::Result<()> {
/// let notes = Repository::<Note, _>::new(Arc::new(MemoryStore::new()), "notes")?;
///
/// let note = notes.create(Note { meta: Metadata::new(), text: "hi".into() }).await?;
/// let id = note.id().unwrap().clone();
///
/// let found = notes.get_by_id(&id).await?.unwrap();
/// assert_eq!(found.text, "hi");
/// assert_eq!(found.meta.created_at(), note.meta.created_at());
/// # Ok(())
/// # }
/// ```
pub struct Repository<M: Model, S: DocumentStore + ?Sized> {
    store: Arc<S>,
    collection: CollectionName,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model, S: DocumentStore + ?Sized> Repository<M, S> {
    /// Bind a repository to a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection name is not valid for the store.
    pub fn new(store: Arc<S>, collection: impl AsRef<str>) -> Result<Self> {
        let collection = store.get_collection(collection.as_ref())?;
        Ok(Self {
            store,
            collection,
            _model: PhantomData,
        })
    }

    pub fn collection(&self) -> &CollectionName {
        &self.collection
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Field paths of `M`.
    pub fn fields(&self) -> &'static M::Fields {
        M::fields()
    }

    /// An empty query builder for this collection.
    pub fn query_builder(&self) -> QueryBuilder<M> {
        QueryBuilder::new(self.collection.clone())
    }

    /// Persist a new instance.
    ///
    /// The id is allocated by the store unless the instance already carries
    /// one. `created_at` and `updated_at` are set to the same instant.
    ///
    /// # Errors
    ///
    /// Validation errors are raised before the store is contacted. A taken
    /// id fails with [`BackendError::AlreadyExists`](crate::BackendError::AlreadyExists).
    #[instrument(skip(self, model), fields(collection = %self.collection))]
    pub async fn create(&self, mut model: M) -> Result<M> {
        async {
            model.validate()?;

            let id = match model.id() {
                Some(id) => id.clone(),
                None => self.store.allocate_document_id(&self.collection),
            };
            model.metadata_mut().stamp_created(id.clone(), Utc::now());

            let doc = model.to_document()?;
            self.store.create_document(&self.collection, &id, &doc).await?;

            info!(id = %id, "Created document");
            Ok(model)
        }
        .await
        .inspect_err(|e| error!(error = %e, "Failed to create document"))
    }

    /// Read one instance. Absence is `Ok(None)`.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn get_by_id(&self, id: &DocumentId) -> Result<Option<M>> {
        async {
            let Some(doc) = self.store.get_document(&self.collection, id).await? else {
                debug!("Document not found");
                return Ok(None);
            };
            debug!("Got document");
            M::from_document(doc).map(Some)
        }
        .await
        .inspect_err(|e| error!(error = %e, "Failed to get document"))
    }

    /// Overwrite the existing document `id` with `model`.
    ///
    /// Every user field is replaced, so fields the model leaves out of its
    /// serialized form are removed from storage. The reserved fields the
    /// instance carries are ignored: the stored `created_at` is kept and
    /// `updated_at` is assigned by the store, strictly past its previous
    /// value. The returned instance reflects what was stored.
    ///
    /// # Errors
    ///
    /// Fails with [`BackendError::NotFound`](crate::BackendError::NotFound)
    /// if the document does not exist.
    #[instrument(skip(self, model), fields(collection = %self.collection))]
    pub async fn update(&self, id: &DocumentId, model: M) -> Result<M> {
        async {
            model.validate()?;

            let doc = model.to_document()?;
            let stored = self.store.update_document(&self.collection, id, &doc).await?;

            info!("Updated document");
            M::from_document(stored)
        }
        .await
        .inspect_err(|e| error!(error = %e, "Failed to update document"))
    }

    /// Remove a document. Returns whether it existed.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn delete(&self, id: &DocumentId) -> Result<bool> {
        let existed = self
            .store
            .delete_document(&self.collection, id)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to delete document"))?;

        if existed {
            info!("Deleted document");
        } else {
            debug!("Document already absent");
        }
        Ok(existed)
    }

    /// Every instance in the collection, optionally capped.
    ///
    /// # Errors
    ///
    /// A limit of zero is rejected.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn list_all(&self, limit: Option<usize>) -> Result<Vec<M>> {
        async {
            let builder = match limit {
                Some(n) => self.query_builder().limit(n)?,
                None => self.query_builder(),
            };
            self.run(&builder).await
        }
        .await
        .inspect_err(|e| error!(error = %e, "Failed to list documents"))
    }

    /// Instances whose field `name` equals `value`.
    #[instrument(skip(self, value), fields(collection = %self.collection))]
    pub async fn find_by_field<V>(&self, name: &str, value: V) -> Result<Vec<M>>
    where
        V: Serialize + Send,
    {
        async {
            let builder = self.query_builder().filter_named(name, Operator::Eq, value)?;
            self.run(&builder).await
        }
        .await
        .inspect_err(|e| error!(error = %e, "Failed to find documents by field"))
    }

    /// Instances matching every `(name, value)` equality pair.
    ///
    /// ```
    /// # use std::sync::Arc;
    /// # use docrepo_core::{MemoryStore, Metadata, Model, Repository};
    /// # use serde::{Deserialize, Serialize};
    /// # use serde_json::json;
    /// # #[derive(Debug, Clone, Serialize, Deserialize, Model)]
    /// # struct User { #[serde(flatten)] meta: Metadata, name: String, active: bool }
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> docrepo_core::Result<()> {
    /// # let users = Repository::<User, _>::new(Arc::new(MemoryStore::new()), "users")?;
    /// let found = users
    ///     .find_by_fields([("name", json!("Ada")), ("active", json!(true))])
    ///     .await?;
    /// assert!(found.is_empty());
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, criteria), fields(collection = %self.collection))]
    pub async fn find_by_fields<I, K, V>(&self, criteria: I) -> Result<Vec<M>>
    where
        I: IntoIterator<Item = (K, V)> + Send,
        K: AsRef<str>,
        V: Serialize,
    {
        async {
            let mut builder = self.query_builder();
            for (name, value) in criteria {
                builder = builder.filter_named(name.as_ref(), Operator::Eq, value)?;
            }
            self.run(&builder).await
        }
        .await
        .inspect_err(|e| error!(error = %e, "Failed to find documents by fields"))
    }

    /// Run a query built from [`query_builder`](Self::query_builder).
    #[instrument(skip(self, builder), fields(collection = %self.collection))]
    pub async fn query(&self, builder: &QueryBuilder<M>) -> Result<Vec<M>> {
        self.run(builder)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to execute query"))
    }

    async fn run(&self, builder: &QueryBuilder<M>) -> Result<Vec<M>> {
        let results = builder.execute(self.store.as_ref(), M::from_document).await?;
        debug!(count = results.len(), "Query complete");
        Ok(results)
    }
}

impl<M: Model, S: DocumentStore + ?Sized> Clone for Repository<M, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            collection: self.collection.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model, S: DocumentStore + ?Sized> fmt::Debug for Repository<M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("schema", &M::schema_name())
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}
