//! Repository-managed metadata carried by every model.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CREATED_AT_FIELD, RESERVED_FIELDS, UPDATED_AT_FIELD};
use crate::document::Document;
use crate::types::DocumentId;

/// The reserved fields every model carries: `id`, `created_at` and
/// `updated_at`.
///
/// Embed it with `#[serde(flatten)]`. All three fields are absent until the
/// model has been persisted through a [`Repository`](crate::Repository);
/// only the repository sets them.
///
/// ```
/// use docrepo_core::{DocumentId, Metadata};
///
/// let meta = Metadata::new();
/// assert!(!meta.is_persisted());
///
/// let meta = Metadata::with_id(DocumentId::new("ada").unwrap());
/// assert_eq!(meta.id().map(|id| id.as_str()), Some("ada"));
/// assert!(meta.created_at().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<DocumentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Metadata of a model that has not been stored yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata requesting a caller-chosen id on create.
    pub fn with_id(id: DocumentId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<&DocumentId> {
        self.id.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Returns true once the model has been written by a repository.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some() && self.created_at.is_some()
    }

    pub(crate) fn set_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    /// Mark as freshly created: both timestamps get the same instant.
    pub(crate) fn stamp_created(&mut self, id: DocumentId, now: DateTime<Utc>) {
        self.id = Some(id);
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }

    /// Body that replaces `stored` on update.
    ///
    /// Takes every user field from `incoming` and ignores the reserved
    /// fields it carries. `created_at` is copied from `stored`, and
    /// `updated_at` becomes `now`, or one microsecond past the stored value
    /// if the clock has not moved beyond it. Stores call this while holding
    /// whatever lock guards the document.
    pub fn replacement_body(stored: &Document, incoming: &Document, now: DateTime<Utc>) -> Document {
        let mut next = incoming.clone();
        for key in RESERVED_FIELDS {
            next.remove(key);
        }

        if let Some(created) = stored.get(CREATED_AT_FIELD) {
            next.insert(CREATED_AT_FIELD, created.clone());
        }

        let previous = stored
            .get(UPDATED_AT_FIELD)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc));
        let updated = match previous {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        next.insert(
            UPDATED_AT_FIELD,
            Value::String(updated.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_fields_are_not_serialized() {
        let value = serde_json::to_value(Metadata::new()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn stamp_sets_equal_timestamps() {
        let now = Utc::now();
        let mut meta = Metadata::new();
        meta.stamp_created(DocumentId::new("a").unwrap(), now);
        assert!(meta.is_persisted());
        assert_eq!(meta.created_at(), meta.updated_at());
    }

    fn stored(value: serde_json::Value) -> Document {
        Document::new(value).unwrap()
    }

    #[test]
    fn replacement_keeps_stored_created_at() {
        let created = "2024-05-01T10:00:00Z";
        let before = stored(json!({ "created_at": created, "updated_at": created, "name": "Ada", "nick": "A" }));
        let incoming = stored(json!({ "id": "x", "created_at": "1999-01-01T00:00:00Z", "name": "Ada King" }));

        let next = Metadata::replacement_body(&before, &incoming, Utc::now());

        assert_eq!(next.get("created_at"), Some(&json!(created)));
        assert_eq!(next.get("name"), Some(&json!("Ada King")));
        assert!(next.get("nick").is_none());
        assert!(next.get("id").is_none());
    }

    #[test]
    fn replacement_ignores_incoming_updated_at() {
        let now = Utc::now();
        let before = stored(json!({ "updated_at": "2024-05-01T10:00:00Z" }));
        let incoming = stored(json!({ "updated_at": "2999-01-01T00:00:00Z" }));

        let next = Metadata::replacement_body(&before, &incoming, now);
        let meta: Metadata = serde_json::from_value(next.into_value()).unwrap();

        assert_eq!(meta.updated_at(), Some(now));
    }

    #[test]
    fn replacement_is_strictly_monotonic() {
        let future = Utc::now() + Duration::seconds(60);
        let before = stored(json!({ "updated_at": future.to_rfc3339_opts(SecondsFormat::AutoSi, true) }));

        let next = Metadata::replacement_body(&before, &stored(json!({})), Utc::now());
        let meta: Metadata = serde_json::from_value(next.into_value()).unwrap();

        assert_eq!(meta.updated_at(), Some(future + Duration::microseconds(1)));
    }

    #[test]
    fn deserializes_rfc3339_timestamps() {
        let meta: Metadata = serde_json::from_value(json!({
            "id": "u1",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-02T10:00:00.123456Z",
        }))
        .unwrap();
        assert_eq!(meta.id().unwrap().as_str(), "u1");
        assert!(meta.updated_at() > meta.created_at());
    }
}
