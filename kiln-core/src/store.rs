//! Main record store interface.
//!
//! [`RecordStore`] is the CRUD façade over a [`StoreBackend`]: typed save, get, partial update,
//! idempotent delete, atomic batch save and criteria queries. It validates arguments locally,
//! normalizes a missing record into [`StoreError::NotFound`] and wraps every other backend
//! failure with the collection and id the operation was working on.
//!
//! # Example
//!
//! ```ignore
//! use kiln::prelude::*;
//! use kiln::memory::InMemoryStore;
//! use bson::doc;
//!
//! let store = RecordStore::new(InMemoryStore::builder().build().await?);
//! let ctx = Context::background();
//!
//! store.save(&ctx, "books", &book.book_id, &book).await?;
//! store.update(&ctx, "books", &book.book_id, doc! { "pages": 120 }).await?;
//! let book: Book = store.get(&ctx, "books", &book.book_id).await?;
//! store.delete(&ctx, "books", &book.book_id).await?;
//! ```

use bson::Document;
use serde::Serialize;
use tracing::debug;

use crate::{
    backend::StoreBackend,
    collection::CollectionRef,
    context::Context,
    error::{BackendError, StoreError, StoreResult},
    executor::QueryExecutor,
    query::Criteria,
    record::{Element, Identifiable, Record, decode_into, encode},
};

/// The maximum number of items a single [`RecordStore::batch_save`] accepts.
pub const MAX_BATCH_SIZE: usize = 500;

/// A typed record store bound to a specific backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct RecordStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> RecordStore<B> {
    /// Creates a new record store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the backend of this store.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns a handle to the named collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] when `name` is empty.
    pub fn collection(&self, name: &str) -> StoreResult<CollectionRef<'_, B>> {
        CollectionRef::new(name, &self.backend)
    }

    /// Writes `value` at `id`, replacing any existing record entirely.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidArgument`] if `collection` or `id` is empty, or `value` does not
    ///   serialize into a document.
    /// - [`StoreError::Transport`] if the store fails.
    pub async fn save<T>(&self, ctx: &Context, collection: &str, id: &str, value: &T) -> StoreResult<()>
    where
        T: Serialize + ?Sized,
    {
        let col = self.collection(collection)?;
        require_id(id)?;

        let record = encode(value).map_err(|e| {
            StoreError::invalid(format!("value for {collection} record with id {id} is not a document: {e}"))
        })?;

        debug!(collection, id, fields = record.len(), "saving record");

        col.set(ctx, id, record)
            .await
            .map_err(|e| StoreError::transport(format!("error saving {collection} record with id {id}"), e))
    }

    /// Reads the record at `id` as an `R`.
    ///
    /// Fields missing from the stored record keep their `Default` value.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidArgument`] if `collection` or `id` is empty.
    /// - [`StoreError::NotFound`] if no record exists at `id`.
    /// - [`StoreError::Decode`] if the record cannot be converted into `R`.
    /// - [`StoreError::Transport`] if the store fails.
    pub async fn get<R: Record>(&self, ctx: &Context, collection: &str, id: &str) -> StoreResult<R> {
        let col = self.collection(collection)?;
        require_id(id)?;

        debug!(collection, id, "getting record");

        let raw = col.get(ctx, id).await.map_err(|e| match e {
            BackendError::NotFound => not_found(collection, id),
            e => StoreError::transport(format!("error getting {collection} record with id {id}"), e),
        })?;

        let mut record = R::default();
        decode_into(raw, &mut record).map_err(|source| StoreError::Decode {
            collection: collection.to_string(),
            id: id.to_string(),
            source,
        })?;

        Ok(record)
    }

    /// Merges `patch` into the record at `id`.
    ///
    /// Keys are field paths (dotted paths address nested fields); fields not named keep their
    /// values. An empty patch is a successful no-op and does not reach the store.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidArgument`] if `collection` or `id` is empty.
    /// - [`StoreError::NotFound`] if no record exists at `id`.
    /// - [`StoreError::Transport`] if the store fails.
    pub async fn update(&self, ctx: &Context, collection: &str, id: &str, patch: Document) -> StoreResult<()> {
        let col = self.collection(collection)?;
        require_id(id)?;

        if patch.is_empty() {
            debug!(collection, id, "empty patch, skipping update");
            return Ok(());
        }

        debug!(collection, id, fields = patch.len(), "updating record");

        col.update(ctx, id, patch).await.map_err(|e| match e {
            BackendError::NotFound => not_found(collection, id),
            e => StoreError::transport(format!("error updating {collection} record with id {id}"), e),
        })
    }

    /// Deletes the record at `id`.
    ///
    /// Deleting a record that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidArgument`] if `collection` or `id` is empty.
    /// - [`StoreError::Transport`] if the store fails.
    pub async fn delete(&self, ctx: &Context, collection: &str, id: &str) -> StoreResult<()> {
        let col = self.collection(collection)?;
        require_id(id)?;

        debug!(collection, id, "deleting record");

        match col.delete(ctx, id).await {
            Ok(()) => Ok(()),
            Err(BackendError::NotFound) => {
                debug!(collection, id, "record already absent");
                Ok(())
            }
            Err(e) => Err(StoreError::transport(format!("error deleting {collection} record with id {id}"), e)),
        }
    }

    /// Writes every item under its own id in one atomic commit.
    ///
    /// An empty `items` slice is a successful no-op.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidArgument`] if `collection` is empty, or an item has an empty id
    ///   or does not serialize into a document.
    /// - [`StoreError::LimitExceeded`] if more than [`MAX_BATCH_SIZE`] items are given.
    /// - [`StoreError::Transport`] if the store fails; nothing is written in that case.
    pub async fn batch_save<T>(&self, ctx: &Context, collection: &str, items: &[T]) -> StoreResult<()>
    where
        T: Identifiable + Serialize,
    {
        let col = self.collection(collection)?;

        if items.is_empty() {
            return Ok(());
        }
        if items.len() > MAX_BATCH_SIZE {
            return Err(StoreError::LimitExceeded { size: items.len(), max: MAX_BATCH_SIZE });
        }

        let records = items
            .iter()
            .map(|item| {
                let id = item.id();
                require_id(id)?;

                encode(item)
                    .map(|record| (id.to_string(), record))
                    .map_err(|e| StoreError::invalid(format!("item with id {id} is not a document: {e}")))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        debug!(collection, size = records.len(), "committing batch");

        col.commit(ctx, records).await.map_err(|e| {
            StoreError::transport(format!("error batch setting {} records on {collection}", items.len()), e)
        })
    }

    /// Executes `criteria`, replacing the contents of `destination` with the results.
    ///
    /// `destination` may hold records by value (`Vec<R>`) or by owning pointer
    /// (`Vec<Box<R>>`). On error it is left empty.
    ///
    /// # Errors
    ///
    /// See [`QueryExecutor::execute`].
    pub async fn query<E: Element>(
        &self,
        ctx: &Context,
        criteria: &Criteria,
        destination: &mut Vec<E>,
    ) -> StoreResult<()> {
        QueryExecutor::new(&self.backend)
            .execute(ctx, criteria, destination)
            .await
    }

    /// Executes `criteria` and returns the results by value.
    ///
    /// # Errors
    ///
    /// See [`QueryExecutor::execute`].
    pub async fn query_all<R>(&self, ctx: &Context, criteria: &Criteria) -> StoreResult<Vec<R>>
    where
        R: Element<Record = R>,
    {
        let mut list = Vec::new();
        self.query(ctx, criteria, &mut list).await?;

        Ok(list)
    }

    /// Shuts down the underlying backend.
    pub async fn shutdown(self) -> StoreResult<()> {
        self.backend
            .shutdown()
            .await
            .map_err(|e| StoreError::transport("error shutting down store", e))
    }
}

fn require_id(id: &str) -> StoreResult<()> {
    if id.is_empty() {
        return Err(StoreError::invalid("id required"));
    }

    Ok(())
}

fn not_found(collection: &str, id: &str) -> StoreError {
    StoreError::NotFound { collection: collection.to_string(), id: id.to_string() }
}
