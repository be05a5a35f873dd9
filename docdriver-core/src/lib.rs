//! A uniform document store driver that lets an application swap storage backends behind
//! one contract.
//!
//! This crate is the core of the docdriver project and provides:
//!
//! - **Driver contract** ([`driver`]) - The async CRUD interface applications program against
//! - **Adapter** ([`adapter`]) - Maps the driver contract onto any storage backend
//! - **Backend abstraction** ([`backend`]) - Per-document primitives a backend must provide
//! - **Records and values** ([`record`], [`value`]) - Schema-less documents and their field values
//! - **Queries** ([`query`]) - Equality queries and the visitor backends translate them with
//! - **Identifiers and timestamps** ([`id`], [`clock`]) - Reserved field generation
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use docdriver::{prelude::*, memory::InMemoryStore};
//!
//! let driver = DocumentStoreAdapter::new(InMemoryStore::builder(), "users");
//! driver.connect().await?;
//!
//! let record = driver.set(fields! { "name" => "a" }).await?;
//! assert_eq!(driver.count(Query::all()).await?, 1);
//! ```

#[allow(unused_extern_crates)]
extern crate self as docdriver_core;

pub mod adapter;
pub mod backend;
pub mod clock;
pub mod driver;
pub mod error;
pub mod id;
pub mod query;
pub mod record;
pub mod value;
