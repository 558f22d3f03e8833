//! Main kiln crate providing a typed record access layer over document stores.
//!
//! This crate is the primary entry point for users of the kiln framework. It re-exports the
//! core types and functionality from the sub-crates and provides access to the storage
//! backends.
//!
//! # Features
//!
//! - **Typed records** - Define your records with Serde and `#[derive(Record)]`
//! - **CRUD façade** - Save, get, partial update, idempotent delete and atomic batch save
//! - **Criteria queries** - Conjunctive filters, ordering and limits, materialized into
//!   `Vec<T>` or `Vec<Box<T>>`
//! - **Cancellation** - Every call honors a [`Context`](context::Context) with an optional deadline
//! - **Multiple backends** - In-memory and MongoDB storage behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use kiln::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
//! pub struct Book {
//!     #[record(id)]
//!     pub book_id: String,
//!     pub name: String,
//!     pub author: String,
//!     pub published: i64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RecordStore::new(InMemoryStore::builder().build().await?);
//!     let ctx = Context::background();
//!
//!     let book = Book {
//!         book_id: new_id(),
//!         name: "The Hitchhiker's Guide to the Galaxy".to_string(),
//!         author: "Douglas Adams".to_string(),
//!         published: 1979,
//!     };
//!     store.save(&ctx, "books", &book.book_id, &book).await?;
//!
//!     let criteria = Criteria::builder("books")
//!         .filter(Filter::eq("author", "Douglas Adams"))
//!         .order_by("published")
//!         .build();
//!
//!     let mut books: Vec<Box<Book>> = Vec::new();
//!     store.query(&ctx, &criteria, &mut books).await?;
//!
//!     store.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - `mongodb` - Persistent MongoDB backend (requires `mongodb` feature)

#[allow(unused_extern_crates)]
extern crate self as kiln;

pub mod prelude;

pub use kiln_core::{
    backend, collection, context, error, executor, id, materialize, page, query, record, store,
};
pub use kiln_macros::Record;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use kiln_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use kiln_mongodb::{MongoDbStore, MongoDbStoreBuilder, store::{DATABASE_ENV, URI_ENV}};
}
