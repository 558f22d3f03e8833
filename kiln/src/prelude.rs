//! Convenient re-exports of commonly used types from kiln.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use kiln::prelude::*;
//! ```
//!
//! This provides access to:
//! - Record traits and the `Record` derive
//! - The record store, store backends and builders
//! - Criteria construction and filtering
//! - Call contexts, paging, ids and error types

pub use kiln_core::{
    backend::{RawRecord, RecordCursor, StoreBackend, StoreBackendBuilder},
    collection::CollectionRef,
    context::{CancellationToken, Context},
    error::{BackendError, BackendResult, ErrorKind, StoreError, StoreResult},
    id::{new_id, to_id},
    page::Pager,
    query::{Criteria, CriteriaBuilder, Filter, Operator, Predicate, Query, QueryBuilder, Sort, SortDirection},
    record::{Element, Identifiable, Record, RecordExt},
    store::{MAX_BATCH_SIZE, RecordStore},
};
pub use kiln_macros::Record;
