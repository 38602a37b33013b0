//! Filesystem-backed document store.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use tracing::{Span, debug, instrument, warn};
use uuid::Uuid;

use docrepo_core::error::{BackendError, Error, InvalidInputError};
use docrepo_core::{
    CollectionName, Document, DocumentId, DocumentStore, Metadata, Query, Result, StoredDocument,
};

const DOCUMENT_EXT: &str = "json";
const LOCK_FILE: &str = ".lock";

fn map_io(err: std::io::Error) -> Error {
    Error::Backend(BackendError::Io {
        message: err.to_string(),
    })
}

/// A document store keeping one JSON file per document.
///
/// Layout: `<root>/collections/<collection>/<id>.json`. Writes go through a
/// temporary file and a rename, and are serialized per collection with an
/// exclusive lock on `<collection>/.lock`, so several processes can share
/// one root. File work runs on tokio's blocking pool, so the store must be
/// used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. Directories are created lazily.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collections_dir(&self) -> PathBuf {
        self.root.join("collections")
    }

    fn collection_dir(&self, collection: &CollectionName) -> PathBuf {
        self.collections_dir().join(encode_key(collection.as_str()))
    }

    fn document_path(&self, collection: &CollectionName, id: &DocumentId) -> PathBuf {
        self.collection_dir(collection)
            .join(format!("{}.{}", encode_key(id.as_str()), DOCUMENT_EXT))
    }

    /// Names of every collection that has been written to.
    pub fn collections(&self) -> Result<Vec<CollectionName>> {
        let dir = self.collections_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).map_err(map_io)? {
            let entry = entry.map_err(map_io)?;
            if !entry.file_type().map_err(map_io)?.is_dir() {
                continue;
            }
            let decoded = entry.file_name().to_str().and_then(decode_key);
            match decoded.map(CollectionName::new) {
                Some(Ok(name)) => names.push(name),
                _ => warn!(path = %entry.path().display(), "Skipping unrecognized collection directory"),
            }
        }
        names.sort();
        Ok(names)
    }

    /// Take the collection's write lock, creating the directory if needed.
    fn lock(&self, collection: &CollectionName) -> Result<CollectionLock> {
        let dir = self.collection_dir(collection);
        fs::create_dir_all(&dir).map_err(map_io)?;

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))
            .map_err(map_io)?;
        file.lock_exclusive().map_err(map_io)?;
        Ok(CollectionLock { file })
    }

    fn read(&self, collection: &CollectionName, id: &DocumentId) -> Result<Option<Document>> {
        let path = self.document_path(collection, id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(map_io)?;
        parse_document(&content, id).map(Some)
    }

    fn write(&self, collection: &CollectionName, id: &DocumentId, data: &Document) -> Result<()> {
        let path = self.document_path(collection, id);
        let content = serde_json::to_string_pretty(data).map_err(|e| {
            Error::InvalidInput(InvalidInputError::Document {
                reason: e.to_string(),
            })
        })?;

        let temp_path = self
            .collection_dir(collection)
            .join(format!(".{}.tmp", Uuid::new_v4().simple()));
        let mut file = File::create(&temp_path).map_err(map_io)?;
        file.write_all(content.as_bytes()).map_err(map_io)?;
        file.sync_data().map_err(map_io)?;
        fs::rename(&temp_path, &path).map_err(map_io)?;
        Ok(())
    }

    fn scan(&self, collection: &CollectionName) -> Result<Vec<StoredDocument>> {
        let dir = self.collection_dir(collection);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut docs = Vec::new();
        for entry in fs::read_dir(&dir).map_err(map_io)? {
            let path = entry.map_err(map_io)?.path();
            if path.extension().is_none_or(|ext| ext != DOCUMENT_EXT) {
                continue;
            }

            let id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(decode_key)
                .and_then(|s| DocumentId::new(s).ok());
            let Some(id) = id else {
                warn!(path = %path.display(), "Skipping unrecognized document file");
                continue;
            };

            // A concurrent delete may remove the file after it was listed.
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(map_io(e)),
            };
            docs.push(StoredDocument::new(id.clone(), parse_document(&content, &id)?));
        }
        Ok(docs)
    }
}

/// Exclusive collection lock, released on drop.
struct CollectionLock {
    file: File,
}

impl Drop for CollectionLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = %e, "Failed to release collection lock");
        }
    }
}

fn parse_document(content: &str, id: &DocumentId) -> Result<Document> {
    serde_json::from_str(content).map_err(|e| {
        Error::InvalidInput(InvalidInputError::Document {
            reason: format!("stored document '{}' is corrupt: {}", id, e),
        })
    })
}

fn is_safe(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'@' | b'+')
}

/// Percent-encode a key into a portable file name.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if is_safe(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

fn decode_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

impl FileStore {
    /// Run blocking file work off the async scheduler, inside the caller's span.
    async fn blocking<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&FileStore) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        let span = Span::current();
        tokio::task::spawn_blocking(move || span.in_scope(|| work(&store)))
            .await
            .map_err(|e| {
                Error::Backend(BackendError::Unavailable {
                    message: format!("file task failed: {}", e),
                })
            })?
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn get_document(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
    ) -> Result<Option<StoredDocument>> {
        let (collection, id) = (collection.clone(), id.clone());
        self.blocking(move |store| {
            Ok(store
                .read(&collection, &id)?
                .map(|data| StoredDocument::new(id, data)))
        })
        .await
    }

    #[instrument(skip(self, data), fields(root = %self.root.display()))]
    async fn create_document(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        data: &Document,
    ) -> Result<()> {
        let (collection, id, data) = (collection.clone(), id.clone(), data.clone());
        self.blocking(move |store| {
            let _lock = store.lock(&collection)?;
            if store.document_path(&collection, &id).exists() {
                return Err(BackendError::AlreadyExists {
                    collection: collection.to_string(),
                    id: id.to_string(),
                }
                .into());
            }
            store.write(&collection, &id, &data)?;
            debug!("Created document file");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, data), fields(root = %self.root.display()))]
    async fn set_document(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        data: &Document,
    ) -> Result<()> {
        let (collection, id, data) = (collection.clone(), id.clone(), data.clone());
        self.blocking(move |store| {
            let _lock = store.lock(&collection)?;
            store.write(&collection, &id, &data)?;
            debug!("Wrote document file");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, data), fields(root = %self.root.display()))]
    async fn update_document(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        data: &Document,
    ) -> Result<StoredDocument> {
        let (collection, id, data) = (collection.clone(), id.clone(), data.clone());
        self.blocking(move |store| {
            let _lock = store.lock(&collection)?;
            let Some(current) = store.read(&collection, &id)? else {
                return Err(BackendError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                }
                .into());
            };
            let next = Metadata::replacement_body(&current, &data, Utc::now());
            store.write(&collection, &id, &next)?;
            debug!("Replaced document file");
            Ok(StoredDocument::new(id, next))
        })
        .await
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn delete_document(&self, collection: &CollectionName, id: &DocumentId) -> Result<bool> {
        let (collection, id) = (collection.clone(), id.clone());
        self.blocking(move |store| {
            let path = store.document_path(&collection, &id);
            if !path.exists() {
                return Ok(false);
            }

            let _lock = store.lock(&collection)?;
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Deleted document file");
                    Ok(true)
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(map_io(e)),
            }
        })
        .await
    }

    #[instrument(skip(self), fields(root = %self.root.display(), collection = %query.collection()))]
    async fn run_query(&self, query: &Query) -> Result<Vec<StoredDocument>> {
        let query = query.clone();
        self.blocking(move |store| {
            let docs = store.scan(query.collection())?;
            let scanned = docs.len();
            let results = query.apply(docs);
            debug!(scanned, matched = results.len(), "Evaluated query over files");
            Ok(results)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_file_names() {
        for key in ["abc", "user@example.com", "a b:c", "ünï", "100%"] {
            let encoded = encode_key(key);
            assert!(encoded.bytes().all(|b| is_safe(b) || b == b'%'));
            assert_eq!(decode_key(&encoded).as_deref(), Some(key));
        }
    }

    #[test]
    fn malformed_escapes_are_rejected() {
        assert_eq!(decode_key("%zz"), None);
        assert_eq!(decode_key("abc%4"), None);
    }
}
