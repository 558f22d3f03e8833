mod common;

use common::{BOOKS, Book, book, empty_store, series};
use kiln::prelude::*;

fn numbered(count: usize) -> Vec<Book> {
    (0..count)
        .map(|i| book(&format!("id-{i:04}"), &format!("Volume {i}"), 1979, 100, &[]))
        .collect()
}

#[tokio::test]
async fn batch_writes_every_item() {
    let store = empty_store().await;
    let ctx = Context::background();

    store.batch_save(&ctx, BOOKS, &series()).await.unwrap();

    assert_eq!(store.backend().record_count(BOOKS).await, 5);
    for expected in series() {
        let read: Book = store.get(&ctx, BOOKS, &expected.id).await.unwrap();
        assert_eq!(read, expected);
    }
}

#[tokio::test]
async fn batch_overwrites_existing_records() {
    let store = empty_store().await;
    let ctx = Context::background();
    store.batch_save(&ctx, BOOKS, &series()).await.unwrap();

    let mut revised = series();
    revised[0].pages = 999;
    store.batch_save(&ctx, BOOKS, &revised[..1]).await.unwrap();

    let read: Book = store.get(&ctx, BOOKS, "id-1").await.unwrap();
    assert_eq!(read.pages, 999);
    assert_eq!(store.backend().record_count(BOOKS).await, 5);
}

#[tokio::test]
async fn boxed_items_are_accepted() {
    let store = empty_store().await;
    let boxed: Vec<Box<Book>> = series().into_iter().map(Box::new).collect();

    store.batch_save(&Context::background(), BOOKS, &boxed).await.unwrap();

    assert_eq!(store.backend().record_count(BOOKS).await, 5);
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let store = empty_store().await;

    store.batch_save::<Book>(&Context::background(), BOOKS, &[]).await.unwrap();

    assert_eq!(store.backend().record_count(BOOKS).await, 0);
}

#[tokio::test]
async fn batch_at_the_limit_is_committed() {
    let store = empty_store().await;

    store
        .batch_save(&Context::background(), BOOKS, &numbered(MAX_BATCH_SIZE))
        .await
        .unwrap();

    assert_eq!(store.backend().record_count(BOOKS).await, 500);
}

#[tokio::test]
async fn batch_over_the_limit_writes_nothing() {
    let store = empty_store().await;

    let err = store
        .batch_save(&Context::background(), BOOKS, &numbered(MAX_BATCH_SIZE + 1))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::LimitExceeded { size: 501, max: 500 }));
    assert_eq!(store.backend().record_count(BOOKS).await, 0);
}

#[tokio::test]
async fn collection_is_checked_before_size() {
    let store = empty_store().await;

    let err = store
        .batch_save(&Context::background(), "", &numbered(MAX_BATCH_SIZE + 1))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn item_without_id_rejects_the_whole_batch() {
    let store = empty_store().await;
    let mut items = series();
    items[3].id.clear();

    let err = store
        .batch_save(&Context::background(), BOOKS, &items)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(store.backend().record_count(BOOKS).await, 0);
}

#[tokio::test]
async fn cancelled_batch_writes_nothing() {
    let store = empty_store().await;
    let token = CancellationToken::new();
    token.cancel();

    let err = store
        .batch_save(&Context::background().with_cancellation(token), BOOKS, &series())
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Transport { source: BackendError::Cancelled, .. }));
    assert_eq!(err.to_string(), "error batch setting 5 records on books");
    assert_eq!(store.backend().record_count(BOOKS).await, 0);
}
