//! Error types and result types for driver operations.
//!
//! This module provides error handling for every driver and backend operation.
//! Use [`DriverResult<T>`] as the return type for fallible operations.

use serde_json::Error as SerdeJsonError;
use std::error::Error as StdError;
use thiserror::Error;

/// Boxed error produced by a storage backend.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Represents all possible errors that can occur when talking to a document store
/// through a driver.
#[derive(Error, Debug)]
pub enum DriverError {
    /// A data operation was invoked before `connect()` or after `disconnect()`.
    #[error("Not connected: call connect() before issuing data operations")]
    NotConnected,
    /// The backend session could not be created.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The remote store rejected or failed a request. The original error is kept as the source.
    #[error("Backend error: {0}")]
    Backend(#[source] BoxError),
    /// Serialization/deserialization error when converting between records and caller types.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A stored document cannot be represented as a record.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// A document with the given ID already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// The requested document was not found in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
}

impl DriverError {
    /// Wraps a backend error without translating it.
    pub fn backend(err: impl Into<BoxError>) -> Self {
        DriverError::Backend(err.into())
    }

    /// True if this error reports a missing connection.
    pub fn is_not_connected(&self) -> bool {
        matches!(self, DriverError::NotConnected)
    }

    /// Returns the backend error as a concrete type, if it is one.
    pub fn backend_source<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            DriverError::Backend(source) => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// A specialized `Result` type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

impl From<SerdeJsonError> for DriverError {
    fn from(err: SerdeJsonError) -> Self {
        DriverError::Serialization(err.to_string())
    }
}
