//! Record schemas.
//!
//! A model is a plain serde struct that embeds [`Metadata`] and derives
//! [`Model`](derive@crate::Model). The derive generates a `<Name>Fields`
//! struct holding one [`FieldPath`](crate::FieldPath) per field and wires
//! the conversion to and from storage [`Document`]s.

mod dynamic;
mod metadata;

pub use dynamic::{DynamicDocument, DynamicFields};
pub use metadata::Metadata;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;
use crate::document::{Document, StoredDocument};
use crate::error::{Error, InvalidInputError, LookupError, ValidationError};
use crate::query::FieldInfo;
use crate::types::DocumentId;

/// Wire name of the document id.
pub const ID_FIELD: &str = "id";

/// Wire name of the creation timestamp.
pub const CREATED_AT_FIELD: &str = "created_at";

/// Wire name of the last-update timestamp.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Field names managed by the repository. User fields may not use them.
pub const RESERVED_FIELDS: [&str; 3] = [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

/// The generated field table of a model.
pub trait FieldSet: Send + Sync + 'static {
    /// Name of the model, used in error messages.
    fn schema(&self) -> &'static str;

    /// Every field, reserved fields first, then declaration order.
    fn all(&self) -> Vec<FieldInfo>;

    /// Look up a field by wire name.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownField`] if the model has no such field.
    fn get(&self, name: &str) -> Result<FieldInfo> {
        self.all()
            .into_iter()
            .find(|field| field.name() == name)
            .ok_or_else(|| unknown_field(self.schema(), name))
    }
}

/// Error for a field name the schema does not declare.
pub fn unknown_field(schema: &str, name: &str) -> Error {
    LookupError::UnknownField {
        schema: schema.to_string(),
        field: name.to_string(),
    }
    .into()
}

/// A record schema stored through a [`Repository`](crate::Repository).
///
/// Implement it with `#[derive(Model)]`:
///
/// ```
/// use docrepo_core::{Metadata, Model, FieldSet};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize, Model)]
/// #[serde(rename_all = "camelCase")]
/// struct Product {
///     #[serde(flatten)]
///     meta: Metadata,
///     #[model(non_empty)]
///     display_name: String,
///     #[model(min = 0)]
///     price_cents: i64,
/// }
///
/// let fields = Product::fields();
/// assert_eq!(fields.schema(), "Product");
/// assert!(fields.get("priceCents").is_ok());
/// assert!(fields.get("colour").is_err());
///
/// let bad = Product { meta: Metadata::new(), display_name: String::new(), price_cents: 5 };
/// assert!(bad.validated().is_err());
/// ```
///
/// Field paths use the serialized names, so `#[serde(rename)]` and
/// `#[serde(rename_all)]` are honoured.
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Generated field table.
    type Fields: FieldSet;

    fn metadata(&self) -> &Metadata;

    fn metadata_mut(&mut self) -> &mut Metadata;

    /// The field table, built once per process.
    fn fields() -> &'static Self::Fields;

    /// Check declared field constraints.
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        Ok(())
    }

    /// Validate and return the instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for the first violated constraint.
    fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    fn schema_name() -> &'static str {
        Self::fields().schema()
    }

    /// Document id, if the instance has been persisted.
    fn id(&self) -> Option<&DocumentId> {
        self.metadata().id()
    }

    /// Encode into a storage document. The id is not part of the body.
    fn to_document(&self) -> Result<Document> {
        let value = serde_json::to_value(self).map_err(|e| encode_error::<Self>(e.to_string()))?;
        let mut map = match value {
            Value::Object(map) => map,
            _ => {
                return Err(encode_error::<Self>(
                    "model did not serialize to a JSON object".to_string(),
                ));
            }
        };
        map.remove(ID_FIELD);
        Ok(Document::from_map(map))
    }

    /// Decode a stored document, re-attaching its id and validating fields.
    fn from_document(doc: StoredDocument) -> Result<Self> {
        let StoredDocument { id, data } = doc;
        let mut map = data.into_map();
        map.insert(ID_FIELD.to_string(), Value::String(id.as_str().to_string()));

        let model: Self = serde_json::from_value(Value::Object(map)).map_err(|e| {
            Error::InvalidInput(InvalidInputError::Decode {
                schema: Self::schema_name().to_string(),
                id: id.to_string(),
                message: e.to_string(),
            })
        })?;
        model.validate()?;
        Ok(model)
    }
}

fn encode_error<M: Model>(message: String) -> Error {
    Error::InvalidInput(InvalidInputError::Encode {
        schema: M::schema_name().to_string(),
        message,
    })
}
