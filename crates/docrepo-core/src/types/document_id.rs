//! Document identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::{Error, InvalidInputError};

/// Length of ids produced by [`DocumentId::generate`].
const GENERATED_LEN: usize = 20;

/// A validated, opaque document identifier.
///
/// Ids are normally allocated by the backend on create and never change
/// afterwards.
///
/// # Example
///
/// ```
/// use docrepo_core::DocumentId;
///
/// let id = DocumentId::new("3jui7kd54zh2y").unwrap();
/// assert_eq!(id.as_str(), "3jui7kd54zh2y");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Create a new document id from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not usable as a document key.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Generate a random 20 character id.
    ///
    /// Backends without their own allocator use this for
    /// [`DocumentStore::allocate_document_id`](crate::DocumentStore::allocate_document_id).
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple[..GENERATED_LEN].to_string())
    }

    /// Returns the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        match super::key_violation(s) {
            Some(reason) => Err(InvalidInputError::DocumentId {
                value: s.to_string(),
                reason,
            }
            .into()),
            None => Ok(()),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ids() {
        assert!(DocumentId::new("abc").is_ok());
        assert!(DocumentId::new("user@example.com").is_ok());
        assert!(DocumentId::new("3jui7kd54zh2y").is_ok());
    }

    #[test]
    fn invalid_ids() {
        assert!(DocumentId::new("").is_err());
        assert!(DocumentId::new("..").is_err());
        assert!(DocumentId::new("a/b").is_err());
        assert!(DocumentId::new("__id__").is_err());
    }

    #[test]
    fn generated_ids_are_valid_and_distinct() {
        let a = DocumentId::generate();
        let b = DocumentId::generate();
        assert_eq!(a.as_str().len(), 20);
        assert!(DocumentId::new(a.as_str()).is_ok());
        assert_ne!(a, b);
    }
}
