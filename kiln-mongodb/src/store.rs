use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::{StreamExt, TryStreamExt};
use mongodb::{
    Client, Collection as MongoCollection,
    error::{Error as MongoError, ErrorKind as MongoErrorKind},
    options::ClientOptions,
};
use tracing::{debug, warn};

use kiln_core::{
    backend::{RawRecord, RecordCursor, StoreBackend, StoreBackendBuilder},
    error::{BackendError, BackendResult},
    query::{Query, QueryVisitor, SortDirection},
};

use crate::query::MongoQueryTranslator;

const ID_FIELD: &str = "_id";
const DEFAULT_APP_NAME: &str = "kiln";

/// Environment variable holding the connection string read by [`MongoDbStoreBuilder::from_env`].
pub const URI_ENV: &str = "KILN_MONGODB_URI";
/// Environment variable holding the database name read by [`MongoDbStoreBuilder::from_env`].
pub const DATABASE_ENV: &str = "KILN_MONGODB_DATABASE";

fn backend_error(e: MongoError) -> BackendError {
    match *e.kind {
        MongoErrorKind::Io(_)
        | MongoErrorKind::ServerSelection { .. }
        | MongoErrorKind::ConnectionPoolCleared { .. } => BackendError::Unavailable(e.to_string()),
        _ => BackendError::Internal(e.to_string()),
    }
}

/// Splits the stored `_id` off a raw MongoDB document.
fn restore_record(mut document: Document) -> RawRecord {
    let id = match document.remove(ID_FIELD) {
        Some(Bson::String(id)) => id,
        Some(other) => other.to_string(),
        None => String::new(),
    };

    RawRecord { id, data: document }
}

fn prepare_record(id: &str, mut record: Document) -> Document {
    record.insert(ID_FIELD, id);
    record
}

#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    async fn upsert_all(
        &self,
        collection: &str,
        records: Vec<(String, Document)>,
    ) -> BackendResult<()> {
        let target = self.get_collection(collection);
        let mut session = self.client.start_session().await.map_err(backend_error)?;

        session.start_transaction().await.map_err(backend_error)?;

        for (id, record) in records {
            let written = target
                .replace_one(doc! { ID_FIELD: id.as_str() }, prepare_record(&id, record))
                .upsert(true)
                .session(&mut session)
                .await;

            if let Err(e) = written {
                warn!(collection, id = %id, "aborting batch transaction");

                if let Err(abort) = session.abort_transaction().await {
                    warn!(collection, error = %abort, "error aborting batch transaction");
                }

                return Err(backend_error(e));
            }
        }

        session.commit_transaction().await.map_err(backend_error)
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn get_record(&self, collection: &str, id: &str) -> BackendResult<Document> {
        self.get_collection(collection)
            .find_one(doc! { ID_FIELD: id })
            .await
            .map_err(backend_error)?
            .map(|document| restore_record(document).data)
            .ok_or(BackendError::NotFound)
    }

    async fn set_record(&self, collection: &str, id: &str, record: Document) -> BackendResult<()> {
        self.get_collection(collection)
            .replace_one(doc! { ID_FIELD: id }, prepare_record(id, record))
            .upsert(true)
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn update_record(&self, collection: &str, id: &str, patch: Document) -> BackendResult<()> {
        let result = self.get_collection(collection)
            .update_one(doc! { ID_FIELD: id }, doc! { "$set": patch })
            .await
            .map_err(backend_error)?;

        if result.matched_count == 0 {
            return Err(BackendError::NotFound);
        }

        Ok(())
    }

    async fn delete_record(&self, collection: &str, id: &str) -> BackendResult<()> {
        let result = self.get_collection(collection)
            .delete_one(doc! { ID_FIELD: id })
            .await
            .map_err(backend_error)?;

        if result.deleted_count == 0 {
            return Err(BackendError::NotFound);
        }

        Ok(())
    }

    async fn commit_batch(
        &self,
        collection: &str,
        records: Vec<(String, Document)>,
    ) -> BackendResult<()> {
        debug!(collection, size = records.len(), "starting batch transaction");

        self.upsert_all(collection, records).await
    }

    async fn query_records(&self, collection: &str, query: Query) -> BackendResult<RecordCursor> {
        let filter = MongoQueryTranslator.visit_query(&query)?;
        let target = self.get_collection(collection);
        let mut find = target.find(filter);

        if let Some(sort) = &query.sort {
            find = find.sort(doc! {
                sort.field.clone(): match sort.direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                }
            });
        }
        if let Some(limit) = query.limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let cursor = find.await.map_err(backend_error)?;

        Ok(cursor
            .map_ok(restore_record)
            .map_err(backend_error)
            .boxed())
    }

    async fn shutdown(self) -> BackendResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

/// Builder for [`MongoDbStore`].
///
/// ```ignore
/// use kiln::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
///
/// let store = MongoDbStore::builder("mongodb://localhost:27017", "library")
///     .app_name("catalog")
///     .build()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
    app_name: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }

    /// Reads the connection string and database name from [`URI_ENV`] and [`DATABASE_ENV`].
    pub fn from_env() -> BackendResult<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .map_err(|_| BackendError::Internal(format!("environment variable {name} is not set")))
        };

        Ok(Self::new(&read(URI_ENV)?, &read(DATABASE_ENV)?))
    }

    /// Sets the application name reported to the server. Defaults to `kiln`.
    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> BackendResult<Self::Backend> {
        let mut options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(backend_error)?;
        options.app_name = Some(self.app_name);

        debug!(database = %self.database, "connecting to mongodb");

        Ok(MongoDbStore::new(
            Client::with_options(options).map_err(backend_error)?,
            self.database,
        ))
    }
}
