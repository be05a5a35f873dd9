//! Firestore storage backend.

use async_trait::async_trait;
use tracing::debug;

use docdriver_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{DriverError, DriverResult},
    query::Query,
    record::{Fields, Record},
};

use crate::{
    client::FirestoreClient,
    config::FirestoreConfig,
    token::TokenCache,
    types::{Document, encode_fields},
};

/// Document storage backend over the Firestore REST API.
///
/// Every request error is returned as [`DriverError::Backend`] with the
/// [`FirestoreError`](crate::error::FirestoreError) as its source.
///
/// # Example
///
/// ```ignore
/// use docdriver::{prelude::*, firestore::{FirestoreConfig, FirestoreStore}};
///
/// let driver = DocumentStoreAdapter::new(
///     FirestoreStore::builder(FirestoreConfig::new("my-project")),
///     "users",
/// );
/// driver.connect().await?;
/// ```
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: FirestoreClient,
}

impl FirestoreStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// A builder that connects with `config`.
    pub fn builder(config: FirestoreConfig) -> FirestoreStoreBuilder {
        FirestoreStoreBuilder::new(config)
    }

    pub fn client(&self) -> &FirestoreClient {
        &self.client
    }
}

fn to_record(document: Document) -> DriverResult<Record> {
    document
        .into_record()
        .map_err(|e| DriverError::InvalidDocument(e.to_string()))
}

#[async_trait]
impl StoreBackend for FirestoreStore {
    async fn get_document(&self, collection: &str, id: &str) -> DriverResult<Option<Record>> {
        self.client
            .get_document(collection, id)
            .await?
            .map(to_record)
            .transpose()
    }

    async fn query_documents(&self, collection: &str, query: &Query) -> DriverResult<Vec<Record>> {
        self.client
            .run_query(collection, query)
            .await?
            .into_iter()
            .map(to_record)
            .collect()
    }

    async fn create_document(&self, collection: &str, id: &str, record: &Record) -> DriverResult<()> {
        self.client
            .create_document(collection, id, encode_fields(record.fields()))
            .await?;

        Ok(())
    }

    async fn update_document(&self, collection: &str, id: &str, fields: &Fields) -> DriverResult<()> {
        self.client
            .update_document(collection, id, encode_fields(fields))
            .await?;

        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DriverResult<()> {
        Ok(self.client.delete_document(collection, id).await?)
    }
}

/// Builder for [`FirestoreStore`] sessions.
///
/// Without an explicit config, the config is read from the environment on every
/// [`build`](StoreBackendBuilder::build), so a missing project id surfaces as a
/// connect failure.
#[derive(Debug, Clone, Default)]
pub struct FirestoreStoreBuilder {
    config: Option<FirestoreConfig>,
    token: Option<String>,
}

impl FirestoreStoreBuilder {
    pub fn new(config: FirestoreConfig) -> Self {
        Self {
            config: Some(config),
            token: None,
        }
    }

    /// A builder that reads [`FirestoreConfig::from_env`] when connecting.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Authenticates with a fixed bearer token instead of Google credentials.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for FirestoreStoreBuilder {
    type Backend = FirestoreStore;

    async fn build(&self) -> DriverResult<Self::Backend> {
        let config = match &self.config {
            Some(config) => config.clone(),
            None => FirestoreConfig::from_env().map_err(|e| DriverError::Initialization(e.to_string()))?,
        };

        let client = match &self.token {
            Some(token) => FirestoreClient::with_token_cache(config, TokenCache::fixed(token.clone())),
            None => FirestoreClient::new(config).await,
        }
        .map_err(|e| DriverError::Initialization(e.to_string()))?;

        debug!(base_url = %client.base_url(), "Firestore client ready");

        Ok(FirestoreStore::new(client))
    }
}
