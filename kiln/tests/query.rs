mod common;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use kiln::{
    bson::{Document, doc},
    memory::InMemoryStore,
    prelude::*,
};

use common::{BOOKS, Book, names, seeded_store, series};

#[tokio::test]
async fn criteria_order_and_limit() {
    let store = seeded_store().await;
    let criteria = Criteria::builder(BOOKS)
        .order_by("published")
        .descending()
        .limit(2)
        .build();

    let books: Vec<Book> = store.query_all(&Context::background(), &criteria).await.unwrap();

    assert_eq!(names(&books), ["Mostly Harmless", "So Long, and Thanks for All the Fish"]);
}

#[tokio::test]
async fn natural_order_without_ordering() {
    let store = seeded_store().await;

    let books: Vec<Book> = store
        .query_all(&Context::background(), &Criteria::builder(BOOKS).build())
        .await
        .unwrap();

    assert_eq!(books, series());
}

#[tokio::test]
async fn predicates_are_conjunctive() {
    let store = seeded_store().await;
    let criteria = Criteria::builder(BOOKS)
        .filter(Filter::array_contains("tags", "sci-fi"))
        .where_field("pages", Operator::GreaterThan, 190)
        .order_by("pages")
        .build();

    let books: Vec<Book> = store.query_all(&Context::background(), &criteria).await.unwrap();

    assert_eq!(
        names(&books),
        ["The Restaurant at the End of the Universe", "Life, the Universe and Everything", "Mostly Harmless"],
    );
}

#[tokio::test]
async fn every_operator_filters() {
    let store = seeded_store().await;
    let ctx = Context::background();

    let cases: Vec<(Predicate, Vec<&str>)> = vec![
        (Filter::eq("published", 1980), vec!["id-2"]),
        (Filter::ne("published", 1980), vec!["id-1", "id-3", "id-4", "id-5"]),
        (Filter::lt("published", 1982), vec!["id-1", "id-2"]),
        (Filter::lte("published", 1982), vec!["id-1", "id-2", "id-3"]),
        (Filter::gt("published", 1984), vec!["id-5"]),
        (Filter::gte("published", 1984), vec!["id-4", "id-5"]),
        (Filter::array_contains("tags", "cricket"), vec!["id-3"]),
        (Filter::array_contains_any("tags", vec!["romance", "cricket"]), vec!["id-3", "id-4"]),
        (Filter::is_in("pages", vec![180, 240]), vec!["id-1", "id-5"]),
        (Filter::not_in("pages", vec![180, 240]), vec!["id-2", "id-3", "id-4"]),
    ];

    for (predicate, expected) in cases {
        let operator = predicate.operator;
        let criteria = Criteria::builder(BOOKS).filter(predicate).build();
        let books: Vec<Book> = store.query_all(&ctx, &criteria).await.unwrap();

        let ids: Vec<&str> = books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, expected, "{operator}");
    }
}

#[tokio::test]
async fn no_match_yields_empty_destination() {
    let store = seeded_store().await;
    let criteria = Criteria::builder(BOOKS).filter(Filter::eq("author", "Terry Pratchett")).build();
    let mut books = vec![Book::default()];

    store.query(&Context::background(), &criteria, &mut books).await.unwrap();

    assert!(books.is_empty());
}

#[tokio::test]
async fn boxed_and_plain_destinations_agree() {
    let store = seeded_store().await;
    let ctx = Context::background();
    let criteria = Criteria::builder(BOOKS).order_by("name").build();

    let mut plain: Vec<Book> = Vec::new();
    let mut boxed: Vec<Box<Book>> = Vec::new();
    store.query(&ctx, &criteria, &mut plain).await.unwrap();
    store.query(&ctx, &criteria, &mut boxed).await.unwrap();

    assert_eq!(plain.len(), 5);
    assert_eq!(plain, boxed.into_iter().map(|b| *b).collect::<Vec<_>>());
}

#[tokio::test]
async fn existing_contents_are_replaced() {
    let store = seeded_store().await;
    let criteria = Criteria::builder(BOOKS).filter(Filter::eq("published", 1992)).build();
    let mut books = vec![Book::default(), Book::default(), Book::default()];

    store.query(&Context::background(), &criteria, &mut books).await.unwrap();

    assert_eq!(names(&books), ["Mostly Harmless"]);
}

#[tokio::test]
async fn invalid_criteria_clears_destination() {
    let store = seeded_store().await;
    let mut books = vec![Book::default()];

    let err = store
        .query(&Context::background(), &Criteria::default(), &mut books)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(books.is_empty());
}

#[tokio::test]
async fn decode_failure_discards_partial_results() {
    let store = seeded_store().await;
    store
        .backend()
        .set_record(BOOKS, "id-9", doc! { "name": "Broken", "pages": "many" })
        .await
        .unwrap();
    let mut books: Vec<Book> = Vec::new();

    let err = store
        .query(&Context::background(), &Criteria::builder(BOOKS).build(), &mut books)
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Decode { ref id, .. } if id == "id-9"));
    assert!(books.is_empty());
}

#[tokio::test]
async fn cancelled_query_fails_with_transport() {
    let store = seeded_store().await;
    let token = CancellationToken::new();
    token.cancel();
    let mut books: Vec<Box<Book>> = Vec::new();

    let err = store
        .query(&Context::background().with_cancellation(token), &Criteria::builder(BOOKS).build(), &mut books)
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Transport { source: BackendError::Cancelled, .. }));
    assert!(books.is_empty());
}

/// Serves queries from an in-memory store, then fails once the results run out.
#[derive(Debug)]
struct TruncatingBackend {
    inner: InMemoryStore,
}

#[async_trait]
impl StoreBackend for TruncatingBackend {
    async fn get_record(&self, collection: &str, id: &str) -> BackendResult<Document> {
        self.inner.get_record(collection, id).await
    }

    async fn set_record(&self, collection: &str, id: &str, record: Document) -> BackendResult<()> {
        self.inner.set_record(collection, id, record).await
    }

    async fn update_record(&self, collection: &str, id: &str, patch: Document) -> BackendResult<()> {
        self.inner.update_record(collection, id, patch).await
    }

    async fn delete_record(&self, collection: &str, id: &str) -> BackendResult<()> {
        self.inner.delete_record(collection, id).await
    }

    async fn commit_batch(&self, collection: &str, records: Vec<(String, Document)>) -> BackendResult<()> {
        self.inner.commit_batch(collection, records).await
    }

    async fn query_records(&self, collection: &str, query: Query) -> BackendResult<RecordCursor> {
        let records = self.inner.query_records(collection, query).await?;
        let failure = stream::once(async { Err(BackendError::Unavailable("connection reset".to_string())) });

        Ok(records.chain(failure).boxed())
    }
}

#[tokio::test]
async fn cursor_failure_discards_partial_results() {
    let inner = InMemoryStore::new();
    let store = RecordStore::new(TruncatingBackend { inner: inner.clone() });
    store.batch_save(&Context::background(), BOOKS, &series()).await.unwrap();
    let mut books = vec![Book::default()];

    let err = store
        .query(&Context::background(), &Criteria::builder(BOOKS).limit(3).build(), &mut books)
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Transport { source: BackendError::Unavailable(_), .. }));
    assert_eq!(err.to_string(), "error querying books collection");
    assert!(books.is_empty());
    assert_eq!(inner.record_count(BOOKS).await, 5);
}

#[tokio::test]
async fn query_results_page_in_order() {
    let store = seeded_store().await;
    let criteria = Criteria::builder(BOOKS).order_by("published").build();
    let books: Vec<Book> = store.query_all(&Context::background(), &criteria).await.unwrap();
    let ids: Vec<&str> = books.iter().map(|b| b.id.as_str()).collect();

    let pages: Vec<&[&str]> = Pager::new(&ids, 2).unwrap().collect();

    assert_eq!(pages, [&["id-1", "id-2"][..], &["id-3", "id-4"][..], &["id-5"][..]]);
}

#[tokio::test]
async fn derived_ids_address_records() {
    let store = seeded_store().await;
    let ctx = Context::background();
    let id = to_id("The Salmon of Doubt");
    let salmon = common::book(&id, "The Salmon of Doubt", 2002, 304, &[]);

    store.save(&ctx, BOOKS, salmon.id(), &salmon).await.unwrap();

    let read: Book = store.get(&ctx, BOOKS, &to_id("The Salmon of Doubt")).await.unwrap();
    assert_eq!(read, salmon);
    assert!(new_id().starts_with("id-"));
}
