//! In-memory document storage backend for docdriver.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses an async-aware read-write lock for concurrent access and is suited to
//! development, testing, and running the driver contract without a remote store.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Shared sessions** - Reconnecting through the same builder sees the same data
//! - **Equality queries** - Filters with the same numeric rules as remote stores
//!
//! # Quick Start
//!
//! ```ignore
//! use docdriver::{prelude::*, memory::InMemoryStore};
//!
//! let driver = DocumentStoreAdapter::new(InMemoryStore::builder(), "users");
//! driver.connect().await?;
//!
//! driver.set(fields! { "name" => "Alice" }).await?;
//! assert!(driver.exists(Query::new().eq("name", "Alice")).await?);
//! ```

#[allow(unused_extern_crates)]
extern crate self as docdriver_memory;

mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
