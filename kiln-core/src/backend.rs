//! Storage backend abstraction for the record store.
//!
//! This module defines the traits that abstract over the external document store, allowing
//! the record store to work with various backends (in-memory, MongoDB, ...).
//!
//! # Overview
//!
//! The [`StoreBackend`] trait mirrors the primitives a document store client exposes per
//! collection: get, set (full overwrite), update (field-level merge), delete, an atomic batch
//! commit, and a filtered, ordered, limited query returning a forward-only [`RecordCursor`].
//! Backends report failures as [`BackendError`](crate::error::BackendError); a missing record
//! must be reported as [`BackendError::NotFound`](crate::error::BackendError::NotFound) so the
//! record store can normalize it.
//!
//! # Examples
//!
//! ```ignore
//! use kiln::backend::StoreBackend;
//! use bson::doc;
//!
//! let backend = MyBackendImpl::new();
//! backend.set_record("books", "id-1", doc! { "name": "Galaxy" }).await?;
//! let raw = backend.get_record("books", "id-1").await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::Document;
use futures::stream::BoxStream;
use std::fmt::Debug;

use crate::{error::BackendResult, query::Query};

/// A record as returned by a query cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Id the record is stored under.
    pub id: String,
    /// Stored fields, without any backend bookkeeping fields.
    pub data: Document,
}

/// A forward-only, lazily advanced cursor over raw query results.
///
/// The stream ends when the results are exhausted. An `Err` item reports a failure while
/// advancing.
pub type RecordCursor = BoxStream<'static, BackendResult<RawRecord>>;

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. The record store never drives one backend call
/// concurrently with another from the same operation, but independent operations may run
/// concurrently on a shared backend.
///
/// # Cancellation
///
/// The record store races every call against its [`Context`](crate::context::Context) and
/// drops the call's future when the context is cancelled or expires. Implementations must be
/// cancellation safe in the usual async sense.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Returns the record stored at `id`.
    ///
    /// Fails with `NotFound` if no record exists.
    async fn get_record(&self, collection: &str, id: &str) -> BackendResult<Document>;

    /// Writes `record` at `id`, replacing any existing record entirely.
    async fn set_record(&self, collection: &str, id: &str, record: Document) -> BackendResult<()>;

    /// Merges `patch` into the record at `id`.
    ///
    /// Keys of `patch` are field paths; dotted paths address nested fields. Fields not named in
    /// the patch are preserved. Fails with `NotFound` if no record exists.
    async fn update_record(&self, collection: &str, id: &str, patch: Document) -> BackendResult<()>;

    /// Deletes the record at `id`.
    ///
    /// Backends may report `NotFound` when no record exists; the record store treats that as
    /// success.
    async fn delete_record(&self, collection: &str, id: &str) -> BackendResult<()>;

    /// Writes every `(id, record)` pair with overwrite semantics, all or none.
    async fn commit_batch(
        &self,
        collection: &str,
        records: Vec<(String, Document)>,
    ) -> BackendResult<()>;

    /// Opens a cursor over the records of `collection` matching `query`, in the query's order.
    async fn query_records(&self, collection: &str, query: Query) -> BackendResult<RecordCursor>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op; backends with external connections should
    /// override it.
    async fn shutdown(self) -> BackendResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn get_record(&self, collection: &str, id: &str) -> BackendResult<Document> {
        (*self).get_record(collection, id).await
    }

    async fn set_record(&self, collection: &str, id: &str, record: Document) -> BackendResult<()> {
        (*self).set_record(collection, id, record).await
    }

    async fn update_record(&self, collection: &str, id: &str, patch: Document) -> BackendResult<()> {
        (*self).update_record(collection, id, patch).await
    }

    async fn delete_record(&self, collection: &str, id: &str) -> BackendResult<()> {
        (*self).delete_record(collection, id).await
    }

    async fn commit_batch(
        &self,
        collection: &str,
        records: Vec<(String, Document)>,
    ) -> BackendResult<()> {
        (*self).commit_batch(collection, records).await
    }

    async fn query_records(&self, collection: &str, query: Query) -> BackendResult<RecordCursor> {
        (*self).query_records(collection, query).await
    }
}

/// Factory for backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> BackendResult<Self::Backend>;
}
