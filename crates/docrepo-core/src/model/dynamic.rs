//! Schemaless model for tools that handle arbitrary documents.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::{CREATED_AT_FIELD, FieldSet, ID_FIELD, Metadata, Model, RESERVED_FIELDS, UPDATED_AT_FIELD};
use crate::Result;
use crate::document::Document;
use crate::error::ValidationError;
use crate::query::{FieldInfo, FieldPath, ValueKind};
use crate::types::DocumentId;

/// A model whose fields are not known at compile time.
///
/// Every field name other than an empty one is accepted by queries and no
/// operand type checking happens beyond the reserved fields. Used by the
/// `docrepo` command line tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicDocument {
    meta: Metadata,
    data: Map<String, Value>,
}

impl DynamicDocument {
    /// Wrap a document body.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the body uses a reserved field name.
    pub fn new(body: Document) -> Result<Self> {
        let data = body.into_map();
        if let Some(key) = RESERVED_FIELDS.iter().find(|key| data.contains_key(**key)) {
            return Err(ValidationError::new(*key, "reserved field is managed by the repository").into());
        }
        Ok(Self {
            meta: Metadata::new(),
            data,
        })
    }

    /// User fields, without the reserved ones.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Overwrite fields with those of `changes`, keeping the rest.
    pub fn merge(&mut self, changes: DynamicDocument) {
        self.data.extend(changes.data);
    }

    /// Replace the id this document will be created under.
    pub fn with_id(mut self, id: DocumentId) -> Self {
        self.meta.set_id(id);
        self
    }
}

impl Serialize for DynamicDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let meta = serde_json::to_value(&self.meta).map_err(S::Error::custom)?;
        let meta = match meta {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let mut map = serializer.serialize_map(Some(meta.len() + self.data.len()))?;
        for (key, value) in meta.iter().chain(self.data.iter()) {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DynamicDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut data = Map::deserialize(deserializer)?;

        let mut meta = Map::new();
        for key in RESERVED_FIELDS {
            if let Some(value) = data.remove(key) {
                meta.insert(key.to_string(), value);
            }
        }
        let meta: Metadata = serde_json::from_value(Value::Object(meta)).map_err(D::Error::custom)?;

        Ok(Self { meta, data })
    }
}

impl Model for DynamicDocument {
    type Fields = DynamicFields;

    fn metadata(&self) -> &Metadata {
        &self.meta
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.meta
    }

    fn fields() -> &'static DynamicFields {
        static FIELDS: OnceLock<DynamicFields> = OnceLock::new();
        FIELDS.get_or_init(DynamicFields::new)
    }
}

/// Field table of [`DynamicDocument`].
///
/// Only the reserved fields are declared; any other name resolves to a
/// field of kind [`ValueKind::Any`].
#[derive(Debug)]
pub struct DynamicFields {
    pub id: FieldPath<DocumentId>,
    pub created_at: FieldPath<DateTime<Utc>>,
    pub updated_at: FieldPath<DateTime<Utc>>,
}

impl DynamicFields {
    fn new() -> Self {
        Self {
            id: FieldPath::new(ID_FIELD, ValueKind::Id),
            created_at: FieldPath::new(CREATED_AT_FIELD, ValueKind::Timestamp),
            updated_at: FieldPath::new(UPDATED_AT_FIELD, ValueKind::Timestamp),
        }
    }

    /// An untyped path to any field.
    pub fn dynamic(&self, name: impl Into<String>) -> FieldPath<Value> {
        FieldPath::new(name.into(), ValueKind::Any)
    }
}

impl FieldSet for DynamicFields {
    fn schema(&self) -> &'static str {
        "DynamicDocument"
    }

    fn all(&self) -> Vec<FieldInfo> {
        vec![
            self.id.info().clone(),
            self.created_at.info().clone(),
            self.updated_at.info().clone(),
        ]
    }

    fn get(&self, name: &str) -> Result<FieldInfo> {
        match name {
            ID_FIELD => Ok(self.id.info().clone()),
            CREATED_AT_FIELD => Ok(self.created_at.info().clone()),
            UPDATED_AT_FIELD => Ok(self.updated_at.info().clone()),
            "" => Err(super::unknown_field(self.schema(), name)),
            other => Ok(FieldInfo::new(other.to_string(), ValueKind::Any)),
        }
    }
}
