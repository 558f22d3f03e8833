//! Criteria execution.
//!
//! [`QueryExecutor::execute`] validates a [`Criteria`], shapes it into a backend
//! [`Query`](crate::query::Query), opens a cursor and streams every record through a
//! [`Materializer`] into the caller's vector. Results arrive in cursor order, which is the
//! order requested by the criteria.
//!
//! If the cursor or a decode fails part way, the destination is cleared before the error is
//! returned: callers see either the complete result or nothing.

use futures::TryStreamExt;
use tracing::{debug, trace, warn};

use crate::{
    backend::StoreBackend,
    collection::CollectionRef,
    context::Context,
    error::{StoreError, StoreResult},
    materialize::Materializer,
    query::Criteria,
    record::{Element, decode_into},
};

/// Runs criteria against a backend.
#[derive(Debug)]
pub struct QueryExecutor<'a, B: StoreBackend> {
    backend: &'a B,
}

impl<'a, B: StoreBackend> QueryExecutor<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Executes `criteria`, replacing the contents of `destination` with the results.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidArgument`] if the criteria has no collection.
    /// - [`StoreError::Decode`] if a record does not fit the element type.
    /// - [`StoreError::Transport`] if the store fails or the context ends.
    ///
    /// On error `destination` is left empty.
    pub async fn execute<E: Element>(
        &self,
        ctx: &Context,
        criteria: &Criteria,
        destination: &mut Vec<E>,
    ) -> StoreResult<()> {
        let mut sink = Materializer::bind(destination);
        criteria.validate()?;

        let collection = CollectionRef::new(&criteria.collection, self.backend)?;

        debug!(
            collection = %criteria.collection,
            predicates = criteria.predicates.len(),
            order_by = ?criteria.order_by,
            descending = criteria.descending,
            limit = criteria.limit,
            by_reference = sink.by_reference(),
            "executing query",
        );

        match Self::drain(ctx, &collection, criteria, &mut sink).await {
            Ok(()) => {
                debug!(collection = %criteria.collection, count = sink.len(), "query complete");
                Ok(())
            }
            Err(err) => {
                warn!(
                    collection = %criteria.collection,
                    discarded = sink.len(),
                    error = %err,
                    "query aborted, discarding partial results",
                );
                sink.discard();
                Err(err)
            }
        }
    }

    async fn drain<E: Element>(
        ctx: &Context,
        collection: &CollectionRef<'_, B>,
        criteria: &Criteria,
        sink: &mut Materializer<'_, E>,
    ) -> StoreResult<()> {
        let failed = |source| {
            StoreError::transport(
                format!("error querying {} collection", collection.name()),
                source,
            )
        };

        let mut cursor = collection
            .documents(ctx, criteria.to_query())
            .await
            .map_err(failed)?;

        while let Some(raw) = ctx.run(cursor.try_next()).await.map_err(failed)? {
            let mut element = sink.new_element();
            decode_into(raw.data, &mut *element).map_err(|source| StoreError::Decode {
                collection: collection.name().to_string(),
                id: raw.id.clone(),
                source,
            })?;

            trace!(collection = %collection.name(), id = %raw.id, position = sink.len(), "materialized record");
            sink.append(element);
        }

        Ok(())
    }
}
