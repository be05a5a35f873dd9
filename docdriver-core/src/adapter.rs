//! The document store adapter: a [`Driver`] over any [`StoreBackend`].
//!
//! [`DocumentStoreAdapter`] owns a backend builder and the name of one collection. After
//! [`Driver::connect`] it holds a live session bound to that collection; every data
//! operation is translated into per-document backend calls against it.
//!
//! # Example
//!
//! ```ignore
//! use docdriver::{prelude::*, memory::InMemoryStore};
//!
//! let driver = DocumentStoreAdapter::new(InMemoryStore::builder(), "users");
//! driver.connect().await?;
//!
//! let alice = driver.set(fields! { "name" => "Alice" }).await?;
//! let found = driver.get_one(Query::by_id(alice.id().unwrap())).await?;
//! assert_eq!(found, Some(alice));
//! ```

use async_trait::async_trait;
use mea::rwlock::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    backend::{StoreBackend, StoreBackendBuilder},
    clock::{Clock, MonotonicClock},
    driver::Driver,
    error::{DriverError, DriverResult},
    id::IdGenerator,
    query::Query,
    record::{CREATED_AT_FIELD, Fields, ID_FIELD, Record, UPDATED_AT_FIELD},
    value::Value,
};

/// A live backend session bound to one collection.
#[derive(Debug)]
pub struct Connection<B: StoreBackend> {
    backend: B,
    collection: String,
}

impl<B: StoreBackend> Connection<B> {
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

/// Connection lifecycle of an adapter.
#[derive(Debug)]
pub enum ConnectionState<B: StoreBackend> {
    Disconnected,
    Connected(Arc<Connection<B>>),
}

impl<B: StoreBackend> Default for ConnectionState<B> {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}

/// Maps the [`Driver`] contract onto a [`StoreBackend`] created by `F`.
///
/// Operations take a shared handle to the current connection and release the state
/// lock before talking to the backend, so concurrent operations never wait on each
/// other and a [`Driver::disconnect`] does not interrupt operations already in flight.
///
/// `update` and `delete` apply one record at a time. A failure part way through leaves
/// the records processed before it modified.
#[derive(Debug)]
pub struct DocumentStoreAdapter<F: StoreBackendBuilder> {
    builder: F,
    collection: String,
    state: RwLock<ConnectionState<F::Backend>>,
    ids: IdGenerator,
    clock: MonotonicClock,
}

impl<F: StoreBackendBuilder> DocumentStoreAdapter<F> {
    /// Creates a disconnected adapter for `collection`.
    pub fn new(builder: F, collection: impl Into<String>) -> Self {
        Self {
            builder,
            collection: collection.into(),
            state: RwLock::new(ConnectionState::Disconnected),
            ids: IdGenerator::new(),
            clock: MonotonicClock::default(),
        }
    }

    /// Replaces the time source used for `_createdAt` / `_updatedAt`.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = MonotonicClock::new(Box::new(clock));
        self
    }

    /// The name of the collection this adapter binds to.
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub async fn is_connected(&self) -> bool {
        matches!(*self.state.read().await, ConnectionState::Connected(_))
    }

    /// Returns the current connection or [`DriverError::NotConnected`].
    pub async fn connection(&self) -> DriverResult<Arc<Connection<F::Backend>>> {
        match &*self.state.read().await {
            ConnectionState::Connected(connection) => Ok(Arc::clone(connection)),
            ConnectionState::Disconnected => Err(DriverError::NotConnected),
        }
    }

    /// Disconnects and shuts the backend down once no operation holds the session.
    ///
    /// If operations are still in flight the session is released without a shutdown.
    pub async fn shutdown(&self) -> DriverResult<()> {
        let previous = std::mem::take(&mut *self.state.write().await);

        if let ConnectionState::Connected(connection) = previous {
            if let Ok(connection) = Arc::try_unwrap(connection) {
                connection.backend.shutdown().await?;
            }
            info!(collection = %self.collection, "Driver shut down");
        }

        Ok(())
    }
}

#[async_trait]
impl<F: StoreBackendBuilder> Driver for DocumentStoreAdapter<F> {
    async fn connect(&self) -> DriverResult<()> {
        let backend = self.builder.build().await?;
        let connection = Connection {
            backend,
            collection: self.collection.clone(),
        };

        *self.state.write().await = ConnectionState::Connected(Arc::new(connection));
        info!(collection = %self.collection, "Driver connected");

        Ok(())
    }

    async fn disconnect(&self) -> DriverResult<()> {
        let previous = std::mem::take(&mut *self.state.write().await);

        if matches!(previous, ConnectionState::Connected(_)) {
            info!(collection = %self.collection, "Driver disconnected");
        }

        Ok(())
    }

    async fn set(&self, data: Fields) -> DriverResult<Record> {
        let connection = self.connection().await?;

        let id = self.ids.next_id();
        let now = self.clock.timestamp();

        let mut record = Record::from(data);
        record.insert(ID_FIELD, id.as_str());
        record.insert(CREATED_AT_FIELD, now.as_str());
        record.insert(UPDATED_AT_FIELD, now);

        connection
            .backend
            .create_document(&connection.collection, &id, &record)
            .await?;

        debug!(collection = %connection.collection, id = %id, "Record created");

        Ok(record)
    }

    async fn get(&self, query: Query) -> DriverResult<Vec<Record>> {
        let connection = self.connection().await?;
        find(&connection, &query).await
    }

    async fn get_one(&self, query: Query) -> DriverResult<Option<Record>> {
        let connection = self.connection().await?;

        match query.id() {
            Some(id) => {
                connection
                    .backend
                    .get_document(&connection.collection, id)
                    .await
            }
            None => Ok(find(&connection, &query).await?.into_iter().next()),
        }
    }

    async fn update(&self, query: Query, data: Fields) -> DriverResult<usize> {
        let connection = self.connection().await?;
        let matches = find(&connection, &query).await?;

        let mut changes = data;
        changes.remove(ID_FIELD);

        // Applied one record at a time; an error leaves earlier records updated.
        let mut updated = 0;
        for record in &matches {
            let mut changes = changes.clone();
            changes.insert(UPDATED_AT_FIELD.to_string(), Value::from(self.clock.timestamp()));

            connection
                .backend
                .update_document(&connection.collection, record_id(record)?, &changes)
                .await?;
            updated += 1;
        }

        debug!(collection = %connection.collection, updated, "Records updated");

        Ok(updated)
    }

    async fn delete(&self, query: Query) -> DriverResult<usize> {
        let connection = self.connection().await?;
        let matches = find(&connection, &query).await?;

        let mut deleted = 0;
        for record in &matches {
            connection
                .backend
                .delete_document(&connection.collection, record_id(record)?)
                .await?;
            deleted += 1;
        }

        debug!(collection = %connection.collection, deleted, "Records deleted");

        Ok(deleted)
    }
}

/// Runs `query` on one session, so the writes that follow go to the same backend.
async fn find<B: StoreBackend>(connection: &Connection<B>, query: &Query) -> DriverResult<Vec<Record>> {
    let records = connection
        .backend
        .query_documents(&connection.collection, query)
        .await?;

    debug!(
        collection = %connection.collection,
        filters = query.len(),
        matched = records.len(),
        "Records queried"
    );

    Ok(records)
}

fn record_id(record: &Record) -> DriverResult<&str> {
    record
        .id()
        .ok_or_else(|| DriverError::InvalidDocument(format!("record has no string {ID_FIELD}: {record:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Debug, Default)]
    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StoreBackend for CountingBackend {
        async fn get_document(&self, _collection: &str, _id: &str) -> DriverResult<Option<Record>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn query_documents(&self, _collection: &str, _query: &Query) -> DriverResult<Vec<Record>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }

        async fn create_document(&self, _collection: &str, _id: &str, _record: &Record) -> DriverResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn update_document(&self, _collection: &str, _id: &str, _fields: &Fields) -> DriverResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete_document(&self, _collection: &str, _id: &str) -> DriverResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct SharedBuilder {
        backend: Arc<CountingBackend>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl StoreBackendBuilder for SharedBuilder {
        type Backend = Arc<CountingBackend>;

        async fn build(&self) -> DriverResult<Self::Backend> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DriverError::Initialization("no credentials".into()));
            }
            Ok(Arc::clone(&self.backend))
        }
    }

    /// Holds one record; the first query waits until the test releases it.
    #[derive(Debug, Default)]
    struct GatedBackend {
        gated: AtomicBool,
        entered: Notify,
        release: Notify,
        updates: AtomicUsize,
    }

    #[async_trait]
    impl StoreBackend for GatedBackend {
        async fn get_document(&self, _collection: &str, _id: &str) -> DriverResult<Option<Record>> {
            Ok(None)
        }

        async fn query_documents(&self, _collection: &str, _query: &Query) -> DriverResult<Vec<Record>> {
            if self.gated.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Ok(vec![Record::from(fields! { ID_FIELD => "r1" })])
        }

        async fn create_document(&self, _collection: &str, _id: &str, _record: &Record) -> DriverResult<()> {
            Ok(())
        }

        async fn update_document(&self, _collection: &str, _id: &str, _fields: &Fields) -> DriverResult<()> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete_document(&self, _collection: &str, _id: &str) -> DriverResult<()> {
            Ok(())
        }
    }

    /// Creates a fresh backend per connect; the first one is gated.
    #[derive(Debug, Default)]
    struct SessionBuilder {
        sessions: parking_lot::Mutex<Vec<Arc<GatedBackend>>>,
    }

    #[async_trait]
    impl StoreBackendBuilder for SessionBuilder {
        type Backend = Arc<GatedBackend>;

        async fn build(&self) -> DriverResult<Self::Backend> {
            let mut sessions = self.sessions.lock();
            let backend = Arc::new(GatedBackend {
                gated: AtomicBool::new(sessions.is_empty()),
                ..Default::default()
            });
            sessions.push(Arc::clone(&backend));
            Ok(backend)
        }
    }

    #[tokio::test]
    async fn test_update_stays_on_its_session_across_reconnect() {
        let adapter = Arc::new(DocumentStoreAdapter::new(SessionBuilder::default(), "users"));
        adapter.connect().await.unwrap();
        let first = Arc::clone(&adapter.builder.sessions.lock()[0]);

        let task = {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.update(Query::all(), fields! { "x" => 1 }).await })
        };

        first.entered.notified().await;
        adapter.connect().await.unwrap();
        first.release.notify_one();

        assert_eq!(task.await.unwrap().unwrap(), 1);

        let second = Arc::clone(&adapter.builder.sessions.lock()[1]);
        assert_eq!(first.updates.load(Ordering::SeqCst), 1);
        assert_eq!(second.updates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_operations_fail_before_connect_without_backend_calls() {
        let adapter = DocumentStoreAdapter::new(SharedBuilder::default(), "users");

        assert!(adapter.set(fields! { "a" => 1 }).await.unwrap_err().is_not_connected());
        assert!(adapter.get(Query::all()).await.unwrap_err().is_not_connected());
        assert!(adapter.get_one(Query::by_id("x")).await.unwrap_err().is_not_connected());
        assert!(adapter.update(Query::all(), fields! {}).await.unwrap_err().is_not_connected());
        assert!(adapter.delete(Query::all()).await.unwrap_err().is_not_connected());
        assert!(adapter.exists(Query::all()).await.unwrap_err().is_not_connected());
        assert!(adapter.count(Query::all()).await.unwrap_err().is_not_connected());
        assert!(adapter.clear().await.unwrap_err().is_not_connected());

        assert_eq!(adapter.builder.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_connect_keeps_previous_state() {
        let adapter = DocumentStoreAdapter::new(SharedBuilder::default(), "users");
        adapter.connect().await.unwrap();

        adapter.builder.fail.store(true, Ordering::SeqCst);
        assert!(matches!(adapter.connect().await, Err(DriverError::Initialization(_))));
        assert!(adapter.is_connected().await);

        adapter.disconnect().await.unwrap();
        assert!(!adapter.is_connected().await);
        assert!(matches!(adapter.connect().await, Err(DriverError::Initialization(_))));
        assert!(!adapter.is_connected().await);
    }

    #[tokio::test]
    async fn test_get_one_by_id_uses_point_lookup() {
        let adapter = DocumentStoreAdapter::new(SharedBuilder::default(), "users");
        adapter.connect().await.unwrap();

        assert_eq!(adapter.get_one(Query::by_id("missing").eq("x", 1)).await.unwrap(), None);
        assert_eq!(adapter.builder.backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let adapter = DocumentStoreAdapter::new(SharedBuilder::default(), "users");

        adapter.disconnect().await.unwrap();
        adapter.connect().await.unwrap();
        adapter.disconnect().await.unwrap();
        adapter.disconnect().await.unwrap();

        assert!(adapter.connection().await.unwrap_err().is_not_connected());
    }

    #[tokio::test]
    async fn test_shutdown_releases_session() {
        let adapter = DocumentStoreAdapter::new(SharedBuilder::default(), "users");
        adapter.connect().await.unwrap();
        adapter.shutdown().await.unwrap();

        assert!(!adapter.is_connected().await);
        assert_eq!(adapter.collection_name(), "users");
    }
}
