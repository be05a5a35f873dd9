//! Firestore REST API client.
//!
//! A thin client over the documents endpoint with:
//! - Token caching with refresh margin
//! - HTTP client tuning (pooling, timeouts)
//! - A tracing span around every request
//!
//! Requests are never retried. A 401 drops the cached token so the next request
//! authenticates afresh.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use docdriver_core::query::Query;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{Instrument, debug, info_span, warn};

use crate::config::FirestoreConfig;
use crate::error::{FirestoreError, FirestoreResult};
use crate::query::structured_query;
use crate::token::TokenCache;
use crate::types::{Document, RunQueryRequest, RunQueryResponse, Value, collect_documents, field_path};

/// Firestore REST API client.
#[derive(Debug, Clone)]
pub struct FirestoreClient {
    http: Client,
    base_url: String,
    token_cache: Arc<TokenCache>,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    ///
    /// Loads Google credentials unless the config points at an emulator.
    pub async fn new(config: FirestoreConfig) -> FirestoreResult<Self> {
        let token_cache = if config.is_emulator() {
            TokenCache::emulator()
        } else {
            TokenCache::from_environment().await?
        };

        Self::with_token_cache(config, token_cache)
    }

    /// Create a client that authenticates with `token_cache`.
    pub fn with_token_cache(config: FirestoreConfig, token_cache: TokenCache) -> FirestoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("docdriver-firestore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FirestoreError::Network)?;

        Ok(Self {
            http,
            base_url: config.documents_url(),
            token_cache: Arc::new(token_cache),
        })
    }

    /// The documents endpoint this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_path(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection.trim_matches('/'))
    }

    fn document_path(&self, collection: &str, doc_id: &str) -> String {
        format!("{}/{}", self.collection_path(collection), urlencoding::encode(doc_id))
    }

    /// Splits `users/u1/items` into the parent resource and the collection id.
    fn query_parent<'a>(&self, collection: &'a str) -> (String, &'a str) {
        match collection.trim_matches('/').rsplit_once('/') {
            Some((parent, collection_id)) => (format!("{}/{}", self.base_url, parent), collection_id),
            None => (self.base_url.clone(), collection.trim_matches('/')),
        }
    }

    /// Get a document. Returns `None` if it does not exist.
    pub async fn get_document(&self, collection: &str, doc_id: &str) -> FirestoreResult<Option<Document>> {
        let url = self.document_path(collection, doc_id);

        self.execute_request("get_document", collection, Some(doc_id), async {
            let response = self.send(self.http.get(&url)).await?;

            match response.status() {
                StatusCode::OK => Ok(Some(response.json().await?)),
                StatusCode::NOT_FOUND => Ok(None),
                status => Err(self.handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Create a document under an explicit id.
    pub async fn create_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: BTreeMap<String, Value>,
    ) -> FirestoreResult<Document> {
        let url = format!(
            "{}?documentId={}",
            self.collection_path(collection),
            urlencoding::encode(doc_id)
        );
        let body = Document::new(fields);

        self.execute_request("create_document", collection, Some(doc_id), async {
            let response = self.send(self.http.post(&url).json(&body)).await?;

            match response.status() {
                StatusCode::OK | StatusCode::CREATED => Ok(response.json().await?),
                StatusCode::CONFLICT => Err(FirestoreError::AlreadyExists(format!("{}/{}", collection, doc_id))),
                status => Err(self.handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Merge `fields` into an existing document.
    ///
    /// Only the supplied fields are written. Fails with [`FirestoreError::NotFound`] if
    /// the document does not exist.
    pub async fn update_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: BTreeMap<String, Value>,
    ) -> FirestoreResult<Document> {
        let params: Vec<String> = fields
            .keys()
            .map(|name| format!("updateMask.fieldPaths={}", urlencoding::encode(&field_path(name))))
            .chain(std::iter::once("currentDocument.exists=true".to_string()))
            .collect();
        let url = format!("{}?{}", self.document_path(collection, doc_id), params.join("&"));
        let body = Document::new(fields);

        self.execute_request("update_document", collection, Some(doc_id), async {
            let response = self.send(self.http.patch(&url).json(&body)).await?;

            match response.status() {
                StatusCode::OK => Ok(response.json().await?),
                StatusCode::NOT_FOUND => Err(FirestoreError::not_found(format!("{}/{}", collection, doc_id))),
                status => Err(self.handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Delete a document. Deleting a missing document succeeds.
    pub async fn delete_document(&self, collection: &str, doc_id: &str) -> FirestoreResult<()> {
        let url = self.document_path(collection, doc_id);

        self.execute_request("delete_document", collection, Some(doc_id), async {
            let response = self.send(self.http.delete(&url)).await?;

            match response.status() {
                StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
                StatusCode::NOT_FOUND => {
                    debug!("Document {}/{} already deleted (idempotent)", collection, doc_id);
                    Ok(())
                }
                status => Err(self.handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Run an equality query over `collection`.
    pub async fn run_query(&self, collection: &str, query: &Query) -> FirestoreResult<Vec<Document>> {
        let (parent, collection_id) = self.query_parent(collection);
        let url = format!("{}:runQuery", parent);
        let request = RunQueryRequest {
            structured_query: structured_query(collection_id, query)?,
        };

        self.execute_request("run_query", collection, None, async {
            let response = self.send(self.http.post(&url).json(&request)).await?;

            match response.status() {
                StatusCode::OK => {
                    let body = response.text().await?;
                    // runQuery returns a JSON array of RunQueryResponse objects
                    let responses: Vec<RunQueryResponse> = serde_json::from_str(&body).map_err(|e| {
                        FirestoreError::InvalidResponse(format!(
                            "Failed to parse runQuery response: {} (body prefix: {})",
                            e,
                            body.chars().take(200).collect::<String>()
                        ))
                    })?;

                    collect_documents(responses)
                }
                status => Err(self.handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    async fn send(&self, request: RequestBuilder) -> FirestoreResult<Response> {
        let token = self.token_cache.get_token().await?;
        Ok(request.bearer_auth(token).send().await?)
    }

    /// Execute a request inside a tracing span.
    async fn execute_request<T, F>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        fut: F,
    ) -> FirestoreResult<T>
    where
        F: std::future::Future<Output = FirestoreResult<T>>,
    {
        let span = if let Some(id) = doc_id {
            info_span!("firestore_request", operation = %operation, collection = %collection, doc_id = %id)
        } else {
            info_span!("firestore_request", operation = %operation, collection = %collection)
        };

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => debug!(operation, collection, latency_ms, "Firestore request succeeded"),
            Err(e) => debug!(
                operation,
                collection,
                latency_ms,
                status = ?e.http_status(),
                "Firestore request failed: {}",
                e
            ),
        }

        result
    }

    async fn handle_error_response(&self, status: StatusCode, url: &str, response: Response) -> FirestoreError {
        if status == StatusCode::UNAUTHORIZED {
            warn!("Firestore rejected the access token, dropping it from the cache");
            self.token_cache.invalidate().await;
        }

        let body = response.text().await.unwrap_or_default();
        FirestoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FirestoreClient {
        FirestoreClient::with_token_cache(
            FirestoreConfig::new("p").with_base_url("http://mock/documents"),
            TokenCache::emulator(),
        )
        .unwrap()
    }

    #[test]
    fn test_document_path_encodes_id() {
        assert_eq!(client().document_path("users", "a b"), "http://mock/documents/users/a%20b");
        assert_eq!(
            client().document_path("users/u1/items", "x"),
            "http://mock/documents/users/u1/items/x"
        );
    }

    #[test]
    fn test_query_parent_for_nested_collections() {
        let client = client();

        assert_eq!(client.query_parent("users"), ("http://mock/documents".to_string(), "users"));
        assert_eq!(
            client.query_parent("users/u1/items"),
            ("http://mock/documents/users/u1".to_string(), "items")
        );
    }
}
