//! docrepo-core - Typed repositories over document stores.
//!
//! Models are plain serde structs deriving [`Model`](derive@Model). A
//! [`Repository`] stores them in one collection of a [`DocumentStore`],
//! and a [`QueryBuilder`] filters them through type-checked
//! [`FieldPath`]s generated for each model.

extern crate self as docrepo_core;

pub mod document;
pub mod error;
pub mod memory;
pub mod model;
pub mod query;
pub mod repository;
pub mod traits;
pub mod types;

pub use document::{Document, StoredDocument};
pub use error::{
    BackendError, Error, InvalidInputError, LookupError, QueryError, ValidationError,
};
pub use memory::MemoryStore;
pub use model::{DynamicDocument, DynamicFields, FieldSet, Metadata, Model};
pub use query::{
    Condition, Direction, FieldInfo, FieldPath, Filter, Operator, OrderBy, Query, QueryBuilder,
    ValueKind,
};
pub use repository::Repository;
pub use traits::DocumentStore;
pub use types::{CollectionName, DocumentId};

/// Derive [`Model`](trait@Model) and a typed field table for a struct.
pub use docrepo_derive::Model;

#[doc(hidden)]
pub mod __private {
    pub use chrono::{DateTime, Utc};
}

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
