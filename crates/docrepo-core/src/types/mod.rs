//! Validated identifier types.
//!
//! These types enforce naming rules at construction time, so a
//! [`CollectionName`] or [`DocumentId`] that exists is always usable
//! as a storage key.

mod collection_name;
mod document_id;

pub use collection_name::CollectionName;
pub use document_id::DocumentId;

/// Maximum length in bytes of a collection name or document id.
pub const MAX_KEY_BYTES: usize = 1500;

/// Shared key rules for collection names and document ids.
///
/// Returns the reason the key is rejected, if any.
pub(crate) fn key_violation(s: &str) -> Option<String> {
    if s.is_empty() {
        return Some("cannot be empty".to_string());
    }

    if s.len() > MAX_KEY_BYTES {
        return Some(format!(
            "exceeds maximum length of {} bytes",
            MAX_KEY_BYTES
        ));
    }

    if s == "." || s == ".." {
        return Some("cannot be '.' or '..'".to_string());
    }

    if s.len() >= 4 && s.starts_with("__") && s.ends_with("__") {
        return Some("names matching __.*__ are reserved".to_string());
    }

    if let Some(c) = s.chars().find(|c| *c == '/' || *c == '\\' || c.is_control()) {
        return Some(format!("contains invalid character {:?}", c));
    }

    None
}
