//! Collection handles.
//!
//! A [`CollectionRef`] binds a validated collection name to a backend and runs every call
//! under a [`Context`]. It speaks in raw BSON documents and [`BackendError`]s; the
//! [`RecordStore`](crate::store::RecordStore) layers typing, argument validation and error
//! normalization on top of it.
//!
//! ```ignore
//! let books = store.collection("books")?;
//! let raw = books.get(&ctx, "id-1").await?;
//! ```
//!
//! [`BackendError`]: crate::error::BackendError

use bson::Document;

use crate::{
    backend::{RecordCursor, StoreBackend},
    context::Context,
    error::{BackendResult, StoreError, StoreResult},
    query::Query,
};

/// A handle to one collection of a backend.
#[derive(Debug)]
pub struct CollectionRef<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
}

impl<B: StoreBackend> Clone for CollectionRef<'_, B> {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(), backend: self.backend }
    }
}

impl<'a, B: StoreBackend> CollectionRef<'a, B> {
    /// Creates a handle, rejecting an empty collection name.
    pub(crate) fn new(name: &str, backend: &'a B) -> StoreResult<Self> {
        if name.is_empty() {
            return Err(StoreError::invalid("collection name required"));
        }

        Ok(Self { name: name.to_string(), backend })
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the raw record at `id`.
    pub async fn get(&self, ctx: &Context, id: &str) -> BackendResult<Document> {
        ctx.run(self.backend.get_record(&self.name, id)).await
    }

    /// Writes the raw record at `id`, replacing what was there.
    pub async fn set(&self, ctx: &Context, id: &str, record: Document) -> BackendResult<()> {
        ctx.run(self.backend.set_record(&self.name, id, record)).await
    }

    /// Merges `patch` into the record at `id`.
    pub async fn update(&self, ctx: &Context, id: &str, patch: Document) -> BackendResult<()> {
        ctx.run(self.backend.update_record(&self.name, id, patch)).await
    }

    /// Deletes the record at `id`.
    pub async fn delete(&self, ctx: &Context, id: &str) -> BackendResult<()> {
        ctx.run(self.backend.delete_record(&self.name, id)).await
    }

    /// Commits all records in one atomic unit.
    pub async fn commit(&self, ctx: &Context, records: Vec<(String, Document)>) -> BackendResult<()> {
        ctx.run(self.backend.commit_batch(&self.name, records)).await
    }

    /// Opens a cursor over the records matching `query`.
    pub async fn documents(&self, ctx: &Context, query: Query) -> BackendResult<RecordCursor> {
        ctx.run(self.backend.query_records(&self.name, query)).await
    }
}
