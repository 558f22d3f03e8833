//! A typed record access layer over schemaless document stores.
//!
//! This crate is the core of the kiln project and provides:
//!
//! - **Records** ([`record`]) - Traits for typed records, destination elements and identifiable items
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing different storage backends
//! - **Criteria** ([`query`]) - Predicate, ordering and limit construction
//! - **Materialization** ([`materialize`]) - Binding query results into caller-owned vectors
//! - **Query execution** ([`executor`]) - Streaming criteria results through the materializer
//! - **Collections** ([`collection`]) - Validated handles to one collection of a backend
//! - **Record store** ([`store`]) - The CRUD façade callers work with
//! - **Call context** ([`context`]) - Cancellation and deadlines
//! - **Error handling** ([`error`]) - Error taxonomy and result types
//! - **Paging** ([`page`]) - Fixed-size pages over in-memory sequences
//! - **Ids** ([`id`]) - Record id generation
//!
//! # Example
//!
//! ```ignore
//! use kiln::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
//! pub struct Book {
//!     #[record(id)]
//!     pub book_id: String,
//!     pub author: String,
//!     pub published: i64,
//! }
//!
//! let criteria = Criteria::builder("books")
//!     .filter(Filter::eq("author", "Douglas Adams"))
//!     .order_by("published")
//!     .descending()
//!     .build();
//!
//! let mut books: Vec<Book> = Vec::new();
//! store.query(&Context::background(), &criteria, &mut books).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as kiln_core;

pub mod backend;
pub mod collection;
pub mod context;
pub mod error;
pub mod executor;
pub mod id;
pub mod materialize;
pub mod page;
pub mod query;
pub mod record;
pub mod store;
