//! In-memory record storage backend for kiln.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is ideal for development
//! and testing.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Full query support** - All filter operators, ordering and limits
//! - **Field-level updates** - Dotted paths address nested fields
//! - **Atomic batches** - A batch is applied under a single write lock
//!
//! # Quick Start
//!
//! ```ignore
//! use kiln::prelude::*;
//! use kiln::memory::InMemoryStore;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
//! pub struct User {
//!     #[record(id)]
//!     pub id: String,
//!     pub name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RecordStore::new(InMemoryStore::builder().build().await?);
//!     let ctx = Context::background();
//!
//!     let user = User { id: new_id(), name: "Alice".to_string() };
//!     store.save(&ctx, "users", &user.id, &user).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as kiln_memory;

pub mod store;
pub mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
