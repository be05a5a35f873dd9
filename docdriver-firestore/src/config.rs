//! Firestore client configuration.

use std::time::Duration;

use crate::error::{FirestoreError, FirestoreResult};

const DEFAULT_DATABASE_ID: &str = "(default)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const PRODUCTION_HOST: &str = "https://firestore.googleapis.com";

/// Firestore client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// `host:port` of a Firestore emulator. No credentials are loaded when set.
    pub emulator_host: Option<String>,
    /// Overrides the documents endpoint entirely.
    pub base_url: Option<String>,
}

impl FirestoreConfig {
    /// Config for `project_id` with default database and timeouts.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: DEFAULT_DATABASE_ID.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            emulator_host: None,
            base_url: None,
        }
    }

    pub fn with_database(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = database_id.into();
        self
    }

    pub fn with_emulator(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = Some(host.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Create config from environment variables.
    pub fn from_env() -> FirestoreResult<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Create config from any variable lookup, with the same rules as [`from_env`](Self::from_env).
    pub fn from_vars<F>(lookup: F) -> FirestoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_id = lookup("GCP_PROJECT_ID")
            .or_else(|| lookup("FIREBASE_PROJECT_ID"))
            .ok_or_else(|| {
                FirestoreError::auth_error(
                    "GCP_PROJECT_ID or FIREBASE_PROJECT_ID must be set to access Firestore",
                )
            })?;

        if project_id.is_empty() {
            return Err(FirestoreError::auth_error(
                "GCP_PROJECT_ID or FIREBASE_PROJECT_ID cannot be empty",
            ));
        }

        let secs = |name: &str, default: u64| {
            lookup(name)
                .and_then(|s| s.parse().ok())
                .map_or(Duration::from_secs(default), Duration::from_secs)
        };

        Ok(Self {
            project_id,
            database_id: lookup("FIRESTORE_DATABASE_ID")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE_ID.to_string()),
            timeout: secs("FIRESTORE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            connect_timeout: secs("FIRESTORE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            emulator_host: lookup("FIRESTORE_EMULATOR_HOST").filter(|s| !s.is_empty()),
            base_url: None,
        })
    }

    pub fn is_emulator(&self) -> bool {
        self.emulator_host.is_some()
    }

    /// The `.../documents` endpoint all requests are made against.
    pub fn documents_url(&self) -> String {
        if let Some(base_url) = &self.base_url {
            return base_url.trim_end_matches('/').to_string();
        }

        let host = match &self.emulator_host {
            Some(host) => format!("http://{}", host),
            None => PRODUCTION_HOST.to_string(),
        };

        format!(
            "{}/v1/projects/{}/databases/{}/documents",
            host, self.project_id, self.database_id
        )
    }
}
