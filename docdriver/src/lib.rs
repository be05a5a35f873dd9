//! Main docdriver crate providing one driver contract over several document stores.
//!
//! This crate is the primary entry point for users of docdriver. It re-exports the core
//! types from the sub-crates and gives access to the storage backends.
//!
//! # Features
//!
//! - **Uniform contract** - `connect`, `set`, `get`, `get_one`, `update`, `delete`, `exists`,
//!   `count` and `clear` behave the same on every backend
//! - **Managed records** - Every record gets a time-ordered `_id` and `_createdAt` /
//!   `_updatedAt` timestamps
//! - **Multiple backends** - In-memory storage, and Firestore with the `firestore` feature
//! - **Typed helpers** - Store and load serde types through [`DriverExt`](driver::DriverExt)
//!
//! # Quick Start
//!
//! ```ignore
//! use docdriver::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> DriverResult<()> {
//!     let driver = DocumentStoreAdapter::new(InMemoryStore::builder(), "users");
//!     driver.connect().await?;
//!
//!     let alice = driver.set(fields! { "name" => "Alice", "age" => 30 }).await?;
//!     let id = alice.id().unwrap_or_default().to_string();
//!
//!     driver.update(Query::by_id(&id), fields! { "age" => 31 }).await?;
//!     assert_eq!(driver.count(Query::new().eq("age", 31)).await?, 1);
//!
//!     driver.delete(Query::by_id(&id)).await?;
//!     driver.disconnect().await
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! [`Driver`](driver::Driver) is object safe, so the backend can be chosen at runtime:
//!
//! ```ignore
//! use docdriver::{prelude::*, memory::InMemoryStore, firestore::FirestoreStoreBuilder};
//!
//! let driver: Box<dyn Driver> = if use_firestore {
//!     Box::new(DocumentStoreAdapter::new(FirestoreStoreBuilder::from_env(), "users"))
//! } else {
//!     Box::new(DocumentStoreAdapter::new(InMemoryStore::builder(), "users"))
//! };
//! driver.connect().await?;
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - `firestore` - Google Cloud Firestore over REST (requires `firestore` feature)

pub mod prelude;

pub use docdriver_core::{adapter, backend, clock, driver, error, fields, id, query, record, value};

// Re-export serde_json for building records from JSON
pub use serde_json;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docdriver_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// Firestore storage backend implementations.
///
/// This module is only available when the `firestore` feature is enabled.
#[cfg(feature = "firestore")]
pub mod firestore {
    pub use docdriver_firestore::{
        FirestoreClient, FirestoreConfig, FirestoreError, FirestoreResult, FirestoreStore,
        FirestoreStoreBuilder,
    };
}
