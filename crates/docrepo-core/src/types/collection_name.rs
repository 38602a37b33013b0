//! Collection name type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated collection name.
///
/// A collection groups documents of one schema. Names are 1-1500 bytes,
/// contain no path separators or control characters, and are neither
/// `.`, `..` nor of the reserved `__name__` form.
///
/// # Example
///
/// ```
/// use docrepo_core::CollectionName;
///
/// let users = CollectionName::new("users").unwrap();
/// assert_eq!(users.as_str(), "users");
/// assert!(CollectionName::new("users/admins").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionName(String);

impl CollectionName {
    /// Create a new collection name, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the name breaks any naming rule.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns the collection name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        match super::key_violation(s) {
            Some(reason) => Err(InvalidInputError::CollectionName {
                value: s.to_string(),
                reason,
            }
            .into()),
            None => Ok(()),
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CollectionName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CollectionName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CollectionName> for String {
    fn from(name: CollectionName) -> Self {
        name.0
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(CollectionName::new("users").is_ok());
        assert!(CollectionName::new("user-profiles_v2").is_ok());
        assert!(CollectionName::new("__users").is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(CollectionName::new("").is_err());
        assert!(CollectionName::new(".").is_err());
        assert!(CollectionName::new("..").is_err());
        assert!(CollectionName::new("a/b").is_err());
        assert!(CollectionName::new("__reserved__").is_err());
        assert!(CollectionName::new("x".repeat(1501)).is_err());
    }

    #[test]
    fn serde_validates() {
        let ok: Result<CollectionName, _> = serde_json::from_str(r#""users""#);
        assert!(ok.is_ok());

        let bad: Result<CollectionName, _> = serde_json::from_str(r#""a/b""#);
        assert!(bad.is_err());
    }
}
