//! In-memory storage implementation for document stores.
//!
//! This module provides a simple in-memory backend that stores records as BSON documents
//! in ordered maps guarded by an async-safe read-write lock.

use std::{collections::{BTreeMap, HashMap}, sync::Arc};
use async_trait::async_trait;
use bson::Document;
use futures::{StreamExt, stream};
use mea::rwlock::RwLock;
use tracing::trace;

use kiln_core::{
    backend::{RawRecord, RecordCursor, StoreBackend, StoreBackendBuilder},
    error::{BackendError, BackendResult},
    query::{Query, SortDirection},
};

use crate::evaluator::{Comparable, DocumentEvaluator, assign, lookup};

type CollectionMap = BTreeMap<String, Document>;
type StoreMap = HashMap<String, CollectionMap>;

/// Thread-safe in-memory record storage backend.
///
/// Records are kept per collection, keyed by id. Queries without an ordering return records
/// in ascending id order.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing it to be
/// safely shared across async tasks. Multiple clones of the same instance share the same
/// underlying data. Batch commits apply under a single write lock, so readers never observe
/// a partially applied batch.
///
/// # Performance
///
/// Queries scan all records of a collection (no indexing).
///
/// # Example
///
/// ```ignore
/// use kiln_memory::InMemoryStore;
/// use kiln::backend::StoreBackend;
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// store.set_record("books", "id-1", doc! { "name": "Galaxy" }).await?;
///
/// let record = store.get_record("books", "id-1").await?;
/// assert_eq!(record.get_str("name")?, "Galaxy");
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> (record id -> record)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    ///
    /// ```ignore
    /// use kiln_memory::InMemoryStore;
    ///
    /// let store = InMemoryStore::builder().build().await?;
    /// ```
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Returns the number of records held in `collection`.
    pub async fn record_count(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

fn sort_key<'d>(document: &'d Document, field: &str) -> Comparable<'d> {
    lookup(document, field)
        .map(Comparable::from)
        .unwrap_or(Comparable::Null)
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn get_record(&self, collection: &str, id: &str) -> BackendResult<Document> {
        self.store
            .read()
            .await
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn set_record(&self, collection: &str, id: &str, record: Document) -> BackendResult<()> {
        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), record);

        Ok(())
    }

    async fn update_record(&self, collection: &str, id: &str, patch: Document) -> BackendResult<()> {
        let mut store = self.store.write().await;
        let record = store
            .get_mut(collection)
            .and_then(|records| records.get_mut(id))
            .ok_or(BackendError::NotFound)?;

        for (path, value) in patch {
            assign(record, &path, value);
        }

        Ok(())
    }

    async fn delete_record(&self, collection: &str, id: &str) -> BackendResult<()> {
        self.store
            .write()
            .await
            .get_mut(collection)
            .and_then(|records| records.remove(id))
            .map(|_| ())
            .ok_or(BackendError::NotFound)
    }

    async fn commit_batch(
        &self,
        collection: &str,
        records: Vec<(String, Document)>,
    ) -> BackendResult<()> {
        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        trace!(collection, size = records.len(), "applying batch");
        collection_map.extend(records);

        Ok(())
    }

    async fn query_records(&self, collection: &str, query: Query) -> BackendResult<RecordCursor> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(stream::empty().boxed());
        };

        let mut matched = Vec::new();
        for (id, document) in collection_map {
            if DocumentEvaluator::new(document).matches(&query.filters)? {
                matched.push((id, document));
            }
        }

        if let Some(sort) = &query.sort {
            matched.sort_by(|(_, a), (_, b)| {
                let ordering = sort_key(a, &sort.field).total_cmp(&sort_key(b, &sort.field));

                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let records = matched
            .into_iter()
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|(id, document)| Ok(RawRecord { id: id.clone(), data: document.clone() }))
            .collect::<Vec<_>>();

        trace!(collection, matched = records.len(), "query evaluated");

        Ok(stream::iter(records).boxed())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// Collections can be seeded with records before the store is handed out, which is handy
/// for fixtures.
///
/// ```ignore
/// use kiln_memory::InMemoryStore;
/// use kiln::backend::StoreBackendBuilder;
/// use bson::doc;
///
/// let store = InMemoryStore::builder()
///     .with_record("books", "id-1", doc! { "name": "Galaxy" })
///     .build()
///     .await?;
/// ```
#[derive(Default, Debug)]
pub struct InMemoryStoreBuilder {
    seed: StoreMap,
}

impl InMemoryStoreBuilder {
    /// Seeds `collection` with a record stored at `id`.
    pub fn with_record(mut self, collection: impl Into<String>, id: impl Into<String>, record: Document) -> Self {
        self.seed
            .entry(collection.into())
            .or_default()
            .insert(id.into(), record);
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] holding the seeded records.
    ///
    /// This always succeeds.
    async fn build(self) -> BackendResult<Self::Backend> {
        Ok(InMemoryStore {
            store: Arc::new(RwLock::new(self.seed)),
        })
    }
}
