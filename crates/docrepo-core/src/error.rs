//! Error types for docrepo.
//!
//! One unified error type with explicit variants for backend failures,
//! field validation, query construction, field lookup and malformed input.
//! A missing document on read is not an error; see
//! [`Repository::get_by_id`](crate::Repository::get_by_id).

use thiserror::Error;

use crate::query::{Operator, ValueKind};

/// The unified error type for docrepo operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Failures reported by the storage backend, passed through unchanged.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A user-declared field violates one of its constraints.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A filter, ordering or limit was rejected while building a query.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// A field name that the schema does not declare.
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Malformed identifiers, collection names or documents.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true if the backend reported that a document does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Backend(BackendError::NotFound { .. }))
    }
}

/// Errors reported by a [`DocumentStore`](crate::DocumentStore).
#[derive(Debug, Error)]
pub enum BackendError {
    /// The document does not exist.
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// A document with this id already exists.
    #[error("document {collection}/{id} already exists")]
    AlreadyExists { collection: String, id: String },

    /// The backend could not be reached or is not usable.
    #[error("backend unavailable: {message}")]
    Unavailable { message: String },

    /// Local I/O failure.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Any other failure reported by the service.
    #[error("service error [{code}]: {message}")]
    Service { code: String, message: String },
}

/// A field value that violates a declared constraint.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("field '{field}': {reason}")]
pub struct ValidationError {
    /// Wire name of the offending field.
    pub field: String,
    /// Human-readable description of the violation.
    pub reason: String,
}

impl ValidationError {
    /// Create a new validation error for a field.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while building a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The operand does not fit the field's declared kind.
    #[error("field '{field}' is {expected}, operator '{op}' got {found}")]
    TypeMismatch {
        field: String,
        op: Operator,
        expected: ValueKind,
        found: String,
    },

    /// The operand has the right kind but is unusable with this operator.
    #[error("invalid operand for '{field}' {op}: {reason}")]
    InvalidOperand {
        field: String,
        op: Operator,
        reason: String,
    },

    /// Limits must be positive.
    #[error("limit must be a positive integer, got {value}")]
    InvalidLimit { value: usize },

    /// An operator or direction token outside the supported vocabulary.
    #[error("unknown {what} '{token}'")]
    UnknownToken { what: &'static str, token: String },
}

/// A field name that the schema does not declare.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("field '{field}' does not exist in model {schema}")]
    UnknownField { schema: String, field: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid collection name.
    #[error("invalid collection name '{value}': {reason}")]
    CollectionName { value: String, reason: String },

    /// Invalid document id.
    #[error("invalid document id '{value}': {reason}")]
    DocumentId { value: String, reason: String },

    /// Document payload is not a JSON object.
    #[error("invalid document: {reason}")]
    Document { reason: String },

    /// A model could not be turned into a document.
    #[error("failed to encode {schema}: {message}")]
    Encode { schema: String, message: String },

    /// A stored document could not be turned back into a model.
    #[error("failed to decode {schema} from document '{id}': {message}")]
    Decode {
        schema: String,
        id: String,
        message: String,
    },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
