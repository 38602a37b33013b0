//! Query builder and field path tests.

use std::collections::HashMap;
use std::sync::Arc;

use docrepo_core::{
    Direction, Error, FieldSet, LookupError, MemoryStore, Metadata, Model, Operator, QueryError,
    Repository, ValueKind,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Model)]
#[serde(rename_all = "camelCase")]
struct Book {
    #[serde(flatten)]
    meta: Metadata,
    title: String,
    page_count: u32,
    rating: f64,
    genres: Vec<String>,
    #[serde(rename = "isbn13")]
    isbn: Option<String>,
    extra: HashMap<String, String>,
    #[serde(skip)]
    cached_score: Option<f64>,
}

fn book(title: &str, pages: u32, rating: f64, genres: &[&str]) -> Book {
    Book {
        meta: Metadata::new(),
        title: title.to_string(),
        page_count: pages,
        rating,
        genres: genres.iter().map(|g| g.to_string()).collect(),
        isbn: None,
        extra: HashMap::new(),
        cached_score: None,
    }
}

async fn library() -> Repository<Book, MemoryStore> {
    let repo = Repository::new(Arc::new(MemoryStore::new()), "books").unwrap();
    repo.create(book("Dune", 412, 4.6, &["scifi", "classic"])).await.unwrap();
    repo.create(book("Emma", 474, 4.0, &["classic", "romance"])).await.unwrap();
    repo.create(book("Neuromancer", 271, 4.2, &["scifi", "cyberpunk"])).await.unwrap();
    repo.create(book("Short", 80, 3.1, &[])).await.unwrap();
    repo
}

fn titles(books: &[Book]) -> Vec<&str> {
    books.iter().map(|b| b.title.as_str()).collect()
}

// ============================================================================
// Field paths
// ============================================================================

#[test]
fn test_field_paths_use_wire_names() {
    let f = Book::fields();
    assert_eq!(f.page_count.name(), "pageCount");
    assert_eq!(f.isbn.name(), "isbn13");
    assert_eq!(f.id.name(), "id");
    assert_eq!(f.created_at.name(), "created_at");

    assert_eq!(f.page_count.kind(), &ValueKind::Integer);
    assert_eq!(f.genres.kind(), &ValueKind::array(ValueKind::String));
    assert_eq!(f.isbn.kind(), &ValueKind::nullable(ValueKind::String));
    assert_eq!(f.extra.kind(), &ValueKind::Map);
}

#[test]
fn test_field_table_is_stable() {
    let first: Vec<_> = Book::fields()
        .all()
        .iter()
        .map(|info| info.name().to_string())
        .collect();
    let second: Vec<_> = Book::fields()
        .all()
        .iter()
        .map(|info| info.name().to_string())
        .collect();

    assert_eq!(first, second);
    assert_eq!(
        first,
        ["id", "created_at", "updated_at", "title", "pageCount", "rating", "genres", "isbn13", "extra"]
    );
    assert!(std::ptr::eq(Book::fields(), Book::fields()));
}

#[test]
fn test_unknown_field_lookup() {
    let err = Book::fields().get("cachedScore").unwrap_err();
    match err {
        Error::Lookup(LookupError::UnknownField { schema, field }) => {
            assert_eq!(schema, "Book");
            assert_eq!(field, "cachedScore");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(Book::fields().get("page_count").is_err());
    assert!(Book::fields().get("pageCount").is_ok());
}

// ============================================================================
// Building
// ============================================================================

#[tokio::test]
async fn test_branches_from_one_base_are_independent() {
    let repo = library().await;
    let f = repo.fields();

    let classics = repo
        .query_builder()
        .filter(&f.genres, Operator::ArrayContains, "classic")
        .unwrap();
    let long = classics.filter(&f.page_count, Operator::Gt, 450).unwrap();
    let by_rating = classics.order_by(&f.rating, Direction::Descending);

    assert_eq!(titles(&repo.query(&long).await.unwrap()), ["Emma"]);
    assert_eq!(titles(&repo.query(&by_rating).await.unwrap()), ["Dune", "Emma"]);
    assert_eq!(repo.query(&classics).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_ordering_and_limit() {
    let repo = library().await;
    let f = repo.fields();

    let shortest = repo
        .query_builder()
        .order_by(&f.page_count, Direction::Ascending)
        .limit(2)
        .unwrap();
    assert_eq!(titles(&repo.query(&shortest).await.unwrap()), ["Short", "Neuromancer"]);

    let relimited = shortest.limit(3).unwrap();
    assert_eq!(repo.query(&relimited).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_membership_operators() {
    let repo = library().await;
    let f = repo.fields();

    let picked = repo
        .query_builder()
        .and(f.title.is_in(vec!["Dune".to_string(), "Emma".to_string()]))
        .unwrap()
        .order_by(&f.title, Direction::Ascending);
    assert_eq!(titles(&repo.query(&picked).await.unwrap()), ["Dune", "Emma"]);

    let punk_or_romance = repo
        .query_builder()
        .and(f.genres.contains_any(vec!["cyberpunk".to_string(), "romance".to_string()]))
        .unwrap()
        .order_by(&f.title, Direction::Ascending);
    assert_eq!(
        titles(&repo.query(&punk_or_romance).await.unwrap()),
        ["Emma", "Neuromancer"]
    );

    let not_scifi = repo
        .query_builder()
        .filter(&f.title, Operator::NotIn, ["Dune", "Neuromancer"])
        .unwrap()
        .order_by(&f.title, Direction::Descending);
    assert_eq!(titles(&repo.query(&not_scifi).await.unwrap()), ["Short", "Emma"]);
}

#[tokio::test]
async fn test_float_field_accepts_integer_operand() {
    let repo = library().await;
    let f = repo.fields();

    let good = repo.query_builder().filter(&f.rating, Operator::Gte, 4).unwrap();
    assert_eq!(repo.query(&good).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_timestamps_filter_as_instants() {
    let repo = library().await;
    let f = repo.fields();

    let all = repo.list_all(None).await.unwrap();
    let newest = all
        .iter()
        .filter_map(|b| b.meta.created_at())
        .max()
        .unwrap();

    let older = repo
        .query_builder()
        .filter(&f.created_at, Operator::Lt, newest)
        .unwrap();
    let expected = all
        .iter()
        .filter(|b| b.meta.created_at().is_some_and(|t| t < newest))
        .count();
    assert!(expected < all.len());
    assert_eq!(repo.query(&older).await.unwrap().len(), expected);
}

#[test]
fn test_type_errors_at_build_time() {
    let f = Book::fields();
    let builder = docrepo_core::QueryBuilder::<Book>::new("books".parse().unwrap());

    let cases = [
        builder.filter(&f.page_count, Operator::Eq, "many"),
        builder.filter(&f.title, Operator::Lt, 3),
        builder.filter(&f.genres, Operator::ArrayContains, 3),
        builder.filter(&f.title, Operator::ArrayContains, "x"),
        builder.filter(&f.title, Operator::In, Vec::<String>::new()),
        builder.filter(&f.created_at, Operator::Gt, "last tuesday"),
    ];
    for result in cases {
        assert!(matches!(result, Err(Error::Query(_))), "{result:?}");
    }

    assert!(matches!(
        builder.limit(0),
        Err(Error::Query(QueryError::InvalidLimit { value: 0 }))
    ));
    assert!(builder.filter(&f.isbn, Operator::Eq, None::<String>).is_ok());
}
