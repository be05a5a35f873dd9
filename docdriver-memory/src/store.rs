//! In-memory storage implementation for drivers.
//!
//! This module provides a simple in-memory backend that keeps records in ordered maps
//! behind an async-safe read-write lock.

use async_trait::async_trait;
use mea::rwlock::RwLock;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tracing::trace;

use docdriver_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{DriverError, DriverResult},
    query::Query,
    record::{Fields, Record},
};

use crate::evaluator::RecordEvaluator;

// Generated identifiers sort by creation time, so an ordered map returns records
// oldest first.
type CollectionMap = BTreeMap<String, Record>;
type StoreMap = HashMap<String, CollectionMap>;

/// Thread-safe in-memory document storage backend.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Performance
///
/// Queries scan all records in a collection (no indexing).
///
/// # Example
///
/// ```ignore
/// use docdriver_memory::InMemoryStore;
/// use docdriver::backend::StoreBackend;
///
/// let store = InMemoryStore::new();
/// store.create_document("users", "a", &Record::from(fields! { "name" => "Alice" })).await?;
///
/// let found = store.get_document("users", "a").await?;
/// assert!(found.is_some());
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection_name -> (document_id -> record)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder whose sessions all share one fresh store.
    ///
    /// Data written before a disconnect is visible again after the next connect.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// The number of records currently held in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// The names of all collections that hold or have held records.
    pub async fn collections(&self) -> Vec<String> {
        self.store
            .read()
            .await
            .keys()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn get_document(&self, collection: &str, id: &str) -> DriverResult<Option<Record>> {
        Ok(
            self.store
                .read()
                .await
                .get(collection)
                .and_then(|records| records.get(id))
                .cloned()
        )
    }

    async fn query_documents(&self, collection: &str, query: &Query) -> DriverResult<Vec<Record>> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        Ok(RecordEvaluator::filter_records(collection_map.values(), query))
    }

    async fn create_document(&self, collection: &str, id: &str, record: &Record) -> DriverResult<()> {
        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        if collection_map.contains_key(id) {
            return Err(DriverError::DocumentAlreadyExists(id.to_string(), collection.to_string()));
        }

        collection_map.insert(id.to_string(), record.clone());
        trace!(collection, id, "Stored record");

        Ok(())
    }

    async fn update_document(&self, collection: &str, id: &str, fields: &Fields) -> DriverResult<()> {
        let mut store = self.store.write().await;
        let record = store
            .get_mut(collection)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| DriverError::DocumentNotFound(id.to_string(), collection.to_string()))?;

        record.merge(fields.clone());

        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DriverResult<()> {
        if let Some(records) = self.store.write().await.get_mut(collection) {
            records.remove(id);
        }

        Ok(())
    }
}

/// Builder for [`InMemoryStore`] sessions.
///
/// Every [`build`](StoreBackendBuilder::build) returns a handle to the same store.
///
/// # Example
///
/// ```ignore
/// use docdriver_memory::InMemoryStore;
/// use docdriver::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::new();
/// let backend = InMemoryStore::builder().with_store(store.clone()).build().await?;
/// ```
#[derive(Default, Debug, Clone)]
pub struct InMemoryStoreBuilder {
    store: InMemoryStore,
}

impl InMemoryStoreBuilder {
    /// Hands out sessions on an existing store.
    pub fn with_store(mut self, store: InMemoryStore) -> Self {
        self.store = store;
        self
    }

    /// The store every session shares.
    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Returns a handle to the shared store. This always succeeds.
    async fn build(&self) -> DriverResult<Self::Backend> {
        Ok(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdriver_core::{fields, value::Value};

    fn record(id: &str, name: &str) -> Record {
        Record::from(fields! { "_id" => id, "name" => name })
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryStore::new();
        store.create_document("users", "a", &record("a", "Alice")).await.unwrap();

        let found = store.get_document("users", "a").await.unwrap().unwrap();
        assert_eq!(found.get("name"), Some(&Value::from("Alice")));
        assert_eq!(store.get_document("users", "b").await.unwrap(), None);
        assert_eq!(store.get_document("other", "a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let store = InMemoryStore::new();
        store.create_document("users", "a", &record("a", "Alice")).await.unwrap();

        let err = store.create_document("users", "a", &record("a", "Bob")).await.unwrap_err();
        assert!(matches!(err, DriverError::DocumentAlreadyExists(id, col) if id == "a" && col == "users"));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = InMemoryStore::new();
        store.create_document("users", "a", &record("a", "Alice")).await.unwrap();
        store.update_document("users", "a", &fields! { "age" => 30 }).await.unwrap();

        let found = store.get_document("users", "a").await.unwrap().unwrap();
        assert_eq!(found.get("name"), Some(&Value::from("Alice")));
        assert_eq!(found.get("age"), Some(&Value::Integer(30)));
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = InMemoryStore::new();

        let err = store.update_document("users", "a", &fields! { "age" => 30 }).await.unwrap_err();
        assert!(matches!(err, DriverError::DocumentNotFound(_, _)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryStore::new();
        store.create_document("users", "a", &record("a", "Alice")).await.unwrap();

        store.delete_document("users", "a").await.unwrap();
        store.delete_document("users", "a").await.unwrap();
        store.delete_document("missing", "a").await.unwrap();

        assert_eq!(store.len("users").await, 0);
    }

    #[tokio::test]
    async fn test_query_filters_in_id_order() {
        let store = InMemoryStore::new();
        store.create_document("users", "b", &record("b", "Bob")).await.unwrap();
        store.create_document("users", "a", &record("a", "Alice")).await.unwrap();
        store.create_document("users", "c", &record("c", "Bob")).await.unwrap();

        let all = store.query_documents("users", &Query::all()).await.unwrap();
        let ids: Vec<_> = all.iter().filter_map(Record::id).collect();
        assert_eq!(ids, ["a", "b", "c"]);

        let bobs = store.query_documents("users", &Query::new().eq("name", "Bob")).await.unwrap();
        assert_eq!(bobs.len(), 2);

        assert!(store.query_documents("empty", &Query::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_builder_sessions_share_data() {
        let builder = InMemoryStore::builder();

        let first = builder.build().await.unwrap();
        first.create_document("users", "a", &record("a", "Alice")).await.unwrap();

        let second = builder.build().await.unwrap();
        assert!(second.get_document("users", "a").await.unwrap().is_some());
        assert_eq!(builder.store().collections().await, ["users"]);
    }
}
