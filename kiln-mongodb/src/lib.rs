//! MongoDB backend implementation for kiln.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait,
//! enabling persistent record storage with query support using MongoDB's query engine.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! kiln = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - Records are stored as MongoDB documents keyed by `_id`
//! - **Query support** - Predicates translate to MongoDB filter operators
//! - **Atomic batches** - Batch saves run inside a session transaction (requires a replica set)
//! - **Async/await** - Fully asynchronous API built on MongoDB's async driver
//!
//! # Connection
//!
//! The connection string and database are provided through the builder, either directly or
//! from the `KILN_MONGODB_URI` and `KILN_MONGODB_DATABASE` environment variables.
//!
//! # Example
//!
//! ```ignore
//! use kiln::{backend::StoreBackendBuilder, mongodb::MongoDbStoreBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStoreBuilder::from_env()?
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as kiln_mongodb;

pub mod store;
pub mod query;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
