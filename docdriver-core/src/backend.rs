//! Storage backend abstraction for drivers.
//!
//! This module defines the boundary between a [`DocumentStoreAdapter`](crate::adapter::DocumentStoreAdapter)
//! and the remote store it talks to. A backend only needs per-document primitives: point
//! reads, equality-filtered reads, and single-document create, update and delete. All
//! record bookkeeping (identifiers, timestamps, counting) happens in the adapter.
//!
//! # Traits
//!
//! - [`StoreBackend`]: a live session against a document store
//! - [`StoreBackendBuilder`]: creates sessions from a configuration
//!
//! # Examples
//!
//! ```ignore
//! use docdriver::backend::{StoreBackend, StoreBackendBuilder};
//! use docdriver::memory::InMemoryStore;
//!
//! let backend = InMemoryStore::builder().build().await?;
//! let users = backend.query_documents("users", &Query::new().eq("name", "Alice")).await?;
//! ```

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::DriverResult,
    query::Query,
    record::{Fields, Record},
};

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the adapter shares one backend across
/// concurrently running operations.
///
/// # Error Handling
///
/// Failures reported by the remote store should be returned as
/// [`DriverError::Backend`](crate::error::DriverError::Backend) carrying the original
/// error, so callers see it unchanged.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Reads one document by identifier.
    ///
    /// Returns `Ok(None)` if the document does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> DriverResult<Option<Record>>;

    /// Returns every document in `collection` matching all predicates of `query`.
    ///
    /// An empty query returns the whole collection. Result order is backend-defined.
    async fn query_documents(&self, collection: &str, query: &Query) -> DriverResult<Vec<Record>>;

    /// Stores `record` under `id`.
    ///
    /// Fails if a document with the same identifier already exists.
    async fn create_document(&self, collection: &str, id: &str, record: &Record) -> DriverResult<()>;

    /// Merges `fields` into the existing document `id`, leaving other fields untouched.
    ///
    /// Fails if the document does not exist.
    async fn update_document(&self, collection: &str, id: &str, fields: &Fields) -> DriverResult<()>;

    /// Deletes document `id`. Deleting a missing document succeeds.
    async fn delete_document(&self, collection: &str, id: &str) -> DriverResult<()>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DriverResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for Arc<B>
where
    B: StoreBackend,
{
    async fn get_document(&self, collection: &str, id: &str) -> DriverResult<Option<Record>> {
        (**self).get_document(collection, id).await
    }

    async fn query_documents(&self, collection: &str, query: &Query) -> DriverResult<Vec<Record>> {
        (**self).query_documents(collection, query).await
    }

    async fn create_document(&self, collection: &str, id: &str, record: &Record) -> DriverResult<()> {
        (**self)
            .create_document(collection, id, record)
            .await
    }

    async fn update_document(&self, collection: &str, id: &str, fields: &Fields) -> DriverResult<()> {
        (**self)
            .update_document(collection, id, fields)
            .await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DriverResult<()> {
        (**self).delete_document(collection, id).await
    }
}

/// Creates backend sessions.
///
/// `build` borrows the builder so an adapter can reconnect with the same configuration.
#[async_trait]
pub trait StoreBackendBuilder: Send + Sync + Debug {
    type Backend: StoreBackend + 'static;

    async fn build(&self) -> DriverResult<Self::Backend>;
}
