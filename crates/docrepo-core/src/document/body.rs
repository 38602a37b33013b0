//! Document payload type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, InvalidInputError};

/// The body of a stored document.
///
/// This type guarantees the payload is a JSON object mapping field names
/// to values. The document id is not part of the body.
///
/// # Example
///
/// ```
/// use docrepo_core::Document;
/// use serde_json::json;
///
/// let doc = Document::new(json!({ "name": "Ada", "age": 36 })).unwrap();
/// assert_eq!(doc.get("age"), Some(&json!(36)));
/// assert!(Document::new(json!([1, 2, 3])).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Create a document from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a JSON object.
    pub fn new(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(InvalidInputError::Document {
                reason: format!("expected a JSON object, got {}", json_type(&other)),
            }
            .into()),
        }
    }

    /// Create a document from an existing field map.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Serialize any value into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or does not produce an object.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self, Error> {
        let value = serde_json::to_value(value).map_err(|e| {
            Error::InvalidInput(InvalidInputError::Document {
                reason: e.to_string(),
            })
        })?;
        Self::new(value)
    }

    /// Deserialize this document into a typed value.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0))
    }

    /// Get a field from the document.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true if the document contains the field.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Get a reference to the inner field map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume and return the inner field map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Consume and return the document as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Short name of a JSON value's type, for messages.
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Document {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Document::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_is_accepted() {
        let doc = Document::new(json!({ "text": "hello" })).unwrap();
        assert_eq!(doc.get("text").unwrap(), "hello");
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_not_object_fails() {
        assert!(Document::new(json!([1, 2, 3])).is_err());
        assert!(Document::new(json!(null)).is_err());
        assert!(Document::new(json!("string")).is_err());
    }

    #[test]
    fn test_deserialize_invalid_fails() {
        let result: Result<Document, _> = serde_json::from_str("[1, 2]");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_serializable() {
        #[derive(Serialize)]
        struct Point {
            x: i32,
            y: i32,
        }

        let doc = Document::from_serializable(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(doc.into_value(), json!({ "x": 1, "y": 2 }));
        assert!(Document::from_serializable(&42).is_err());
    }
}
