use thiserror::Error;

/// Errors that can occur during storage provider operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested file or resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The provider did not respond within the allowed duration.
    #[error("storage request timed out after {0}s")]
    Timeout(u64),

    /// A network or transport-level error occurred.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider answered with a non-success status.
    #[error("storage API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be interpreted.
    #[error("invalid storage response: {0}")]
    InvalidResponse(String),

    /// The client was given invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Returns `true` if the error is transient and the operation may
    /// succeed on retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::Timeout(_) | StorageError::Http(_) => true,
            StorageError::Api { status, .. } => *status == 429 || *status >= 500,
            StorageError::NotFound(_)
            | StorageError::InvalidResponse(_)
            | StorageError::Configuration(_) => false,
        }
    }
}
