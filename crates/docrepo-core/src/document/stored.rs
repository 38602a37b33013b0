//! Documents as returned by a backend.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Document;
use crate::types::DocumentId;

/// A document together with the id it is stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// The document id.
    pub id: DocumentId,

    /// The document body.
    pub data: Document,
}

impl StoredDocument {
    /// Create a stored document.
    pub fn new(id: DocumentId, data: Document) -> Self {
        Self { id, data }
    }

    /// Look up a field for query evaluation.
    ///
    /// `id` resolves to the document id, every other name to a body field.
    pub fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        if name == crate::model::ID_FIELD {
            Some(Cow::Owned(Value::String(self.id.as_str().to_string())))
        } else {
            self.data.get(name).map(Cow::Borrowed)
        }
    }
}
