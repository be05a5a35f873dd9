//! Firestore error types.

use docdriver_core::error::DriverError;
use thiserror::Error;

/// Result type for Firestore operations.
pub type FirestoreResult<T> = Result<T, FirestoreError>;

/// Errors that can occur during Firestore operations.
#[derive(Debug, Error)]
pub enum FirestoreError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FirestoreError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match status {
            401 => Self::AuthError(msg),
            403 => Self::PermissionDenied(msg),
            404 => Self::NotFound(msg),
            409 => Self::AlreadyExists(msg),
            412 => Self::PreconditionFailed(msg),
            429 => Self::RateLimited(msg),
            500..=599 => Self::ServerError(status, msg),
            _ => Self::RequestFailed(msg),
        }
    }

    /// The HTTP status this error corresponds to, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::AuthError(_) => Some(401),
            Self::PermissionDenied(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::AlreadyExists(_) => Some(409),
            Self::PreconditionFailed(_) => Some(412),
            Self::RateLimited(_) => Some(429),
            Self::ServerError(status, _) => Some(*status),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            Self::RequestFailed(_) | Self::InvalidResponse(_) | Self::Json(_) => None,
        }
    }
}

impl From<FirestoreError> for DriverError {
    fn from(err: FirestoreError) -> Self {
        DriverError::backend(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_http_status() {
        assert!(matches!(FirestoreError::from_http_status(401, "x"), FirestoreError::AuthError(_)));
        assert!(matches!(FirestoreError::from_http_status(403, "x"), FirestoreError::PermissionDenied(_)));
        assert!(matches!(FirestoreError::from_http_status(404, "x"), FirestoreError::NotFound(_)));
        assert!(matches!(FirestoreError::from_http_status(409, "x"), FirestoreError::AlreadyExists(_)));
        assert!(matches!(FirestoreError::from_http_status(412, "x"), FirestoreError::PreconditionFailed(_)));
        assert!(matches!(FirestoreError::from_http_status(429, "x"), FirestoreError::RateLimited(_)));
        assert!(matches!(FirestoreError::from_http_status(503, "x"), FirestoreError::ServerError(503, _)));
        assert!(matches!(FirestoreError::from_http_status(400, "x"), FirestoreError::RequestFailed(_)));
    }

    #[test]
    fn test_http_status_round_trips_for_mapped_codes() {
        for status in [401, 403, 404, 409, 412, 429, 500, 503] {
            assert_eq!(FirestoreError::from_http_status(status, "x").http_status(), Some(status));
        }
        assert_eq!(FirestoreError::from_http_status(400, "x").http_status(), None);
    }

    #[test]
    fn test_converts_to_backend_driver_error() {
        let err = DriverError::from(FirestoreError::from_http_status(429, "slow down"));

        assert!(matches!(err, DriverError::Backend(_)));
        assert!(matches!(
            err.backend_source::<FirestoreError>(),
            Some(FirestoreError::RateLimited(msg)) if msg == "slow down"
        ));
    }
}
