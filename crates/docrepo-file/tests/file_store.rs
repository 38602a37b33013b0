//! FileStore tests.
//!
//! Each test runs against its own temporary directory.

use std::fs;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use docrepo_core::{
    CollectionName, Direction, Document, DocumentId, DocumentStore, Error, Metadata, Model,
    Operator, Repository,
};
use docrepo_file::FileStore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
struct User {
    #[serde(flatten)]
    meta: Metadata,
    name: String,
    age: u32,
    active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
}

fn user(name: &str, age: u32, active: bool) -> User {
    User {
        meta: Metadata::new(),
        name: name.to_string(),
        age,
        active,
        nickname: None,
        tags: Vec::new(),
    }
}

fn setup() -> (TempDir, Arc<FileStore>) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    (dir, store)
}

fn users(store: &Arc<FileStore>) -> Repository<User, FileStore> {
    Repository::new(store.clone(), "users").unwrap()
}

// ============================================================================
// Layout
// ============================================================================

#[tokio::test]
async fn test_documents_are_json_files() {
    let (dir, store) = setup();
    let repo = users(&store);

    let created = repo.create(user("Ada", 36, true)).await.unwrap();
    let id = created.id().unwrap();

    let path = dir
        .path()
        .join("collections")
        .join("users")
        .join(format!("{}.json", id));
    let body: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(body["name"], json!("Ada"));
    assert!(body.get("id").is_none());
    assert!(body["created_at"].is_string());
}

#[tokio::test]
async fn test_data_survives_a_new_store_instance() {
    let (dir, store) = setup();
    let created = users(&store).create(user("Ada", 36, true)).await.unwrap();

    let reopened = Arc::new(FileStore::new(dir.path()));
    let fetched = users(&reopened)
        .get_by_id(created.id().unwrap())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_odd_ids_are_stored_safely() {
    let (_dir, store) = setup();
    let collection = CollectionName::new("notes").unwrap();
    let id = DocumentId::new("a b:c?").unwrap();
    let doc = Document::new(json!({ "text": "hi" })).unwrap();

    store.set_document(&collection, &id, &doc).await.unwrap();

    let found = store
        .run_query(&docrepo_core::Query::new(collection.clone()))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, id);
    assert_eq!(store.collections().unwrap(), vec![collection]);
}

#[tokio::test]
async fn test_corrupt_files_are_reported() {
    let (dir, store) = setup();
    let repo = users(&store);
    let created = repo.create(user("Ada", 36, true)).await.unwrap();
    let id = created.id().unwrap().clone();

    let path = dir
        .path()
        .join("collections")
        .join("users")
        .join(format!("{}.json", id));
    fs::write(&path, "not json").unwrap();

    assert!(matches!(repo.get_by_id(&id).await, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_stray_files_are_ignored() {
    let (dir, store) = setup();
    let repo = users(&store);
    repo.create(user("Ada", 36, true)).await.unwrap();

    let collection_dir = dir.path().join("collections").join("users");
    fs::write(collection_dir.join("notes.txt"), "hello").unwrap();
    fs::write(collection_dir.join(".abc.tmp"), "{}").unwrap();

    assert_eq!(repo.list_all(None).await.unwrap().len(), 1);
}

// ============================================================================
// Repository behavior
// ============================================================================

#[tokio::test]
async fn test_crud_cycle() {
    let (_dir, store) = setup();
    let repo = users(&store);

    let created = repo.create(user("Ada", 36, true)).await.unwrap();
    let id = created.id().unwrap().clone();

    let mut changed = created.clone();
    changed.age = 37;
    let updated = repo.update(&id, changed).await.unwrap();
    assert_eq!(updated.age, 37);
    assert_eq!(updated.meta.created_at(), created.meta.created_at());
    assert!(updated.meta.updated_at() > created.meta.updated_at());

    assert!(repo.delete(&id).await.unwrap());
    assert!(repo.get_by_id(&id).await.unwrap().is_none());
    assert!(!repo.delete(&id).await.unwrap());
    assert!(repo.update(&id, updated).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_update_rewrites_the_whole_file() {
    let (dir, store) = setup();
    let repo = users(&store);

    let mut ada = user("Ada", 36, true);
    ada.nickname = Some("x".into());
    ada.tags = vec!["t".into()];
    let created = repo.create(ada).await.unwrap();
    let id = created.id().unwrap().clone();

    let mut cleared = created.clone();
    cleared.nickname = None;
    cleared.tags.clear();
    let updated = repo.update(&id, cleared).await.unwrap();
    assert_eq!(updated.nickname, None);
    assert!(updated.tags.is_empty());

    let path = dir
        .path()
        .join("collections")
        .join("users")
        .join(format!("{}.json", id));
    let body: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(body.get("nickname").is_none());
    assert!(body.get("tags").is_none());
    assert_eq!(body["name"], json!("Ada"));

    let reopened = Arc::new(FileStore::new(dir.path()));
    assert_eq!(users(&reopened).get_by_id(&id).await.unwrap().unwrap(), updated);
}

#[tokio::test]
async fn test_update_ignores_caller_updated_at() {
    let (_dir, store) = setup();
    let repo = users(&store);
    let created = repo.create(user("Ada", 36, true)).await.unwrap();
    let id = created.id().unwrap().clone();

    let mut value = serde_json::to_value(&created).unwrap();
    value["updated_at"] = json!("2999-01-01T00:00:00Z");
    let forged: User = serde_json::from_value(value).unwrap();

    let updated = repo.update(&id, forged).await.unwrap();
    let stamped = updated.meta.updated_at().unwrap();

    let far_future: DateTime<Utc> = "2999-01-01T00:00:00Z".parse().unwrap();
    assert!(stamped < far_future);
    assert!(Some(stamped) > created.meta.updated_at());
    assert_eq!(repo.get_by_id(&id).await.unwrap().unwrap(), updated);
}

#[tokio::test]
async fn test_query_filters_orders_and_limits() {
    let (_dir, store) = setup();
    let repo = users(&store);
    repo.create(user("A", 17, true)).await.unwrap();
    repo.create(user("B", 30, true)).await.unwrap();
    repo.create(user("C", 45, false)).await.unwrap();
    repo.create(user("D", 52, true)).await.unwrap();

    let f = repo.fields();
    let adults = repo
        .query_builder()
        .filter(&f.age, Operator::Gte, 18)
        .unwrap()
        .filter(&f.active, Operator::Eq, true)
        .unwrap();

    let oldest_first = adults.order_by(&f.age, Direction::Descending);
    let names: Vec<_> = repo
        .query(&oldest_first)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(names, ["D", "B"]);

    let one = oldest_first.limit(1).unwrap();
    assert_eq!(repo.query(&one).await.unwrap()[0].name, "D");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers() {
    let (_dir, store) = setup();
    let repo = users(&store);

    let mut handles = Vec::new();
    for i in 0..20u32 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.create(user(&format!("user{i}"), i, true)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(repo.list_all(None).await.unwrap().len(), 20);
}

#[tokio::test]
async fn test_duplicate_create_is_rejected() {
    let (_dir, store) = setup();
    let repo = users(&store);

    let mut ada = user("Ada", 36, true);
    ada.meta = Metadata::with_id(DocumentId::new("ada").unwrap());
    repo.create(ada.clone()).await.unwrap();

    assert!(matches!(
        repo.create(ada).await,
        Err(Error::Backend(docrepo_core::BackendError::AlreadyExists { .. }))
    ));
}
