//! Untyped storage documents.
//!
//! A [`Document`] is what a backend stores; a [`StoredDocument`] pairs it
//! with the id it is stored under. Typed models convert to and from these
//! through [`Model`](crate::Model).

mod body;
mod stored;

pub use body::Document;
pub(crate) use body::json_type;
pub use stored::StoredDocument;
