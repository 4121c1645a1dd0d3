use docshelf_storage::StorageError;
use thiserror::Error;

/// Errors raised while ingesting change events.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Talking to the storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    /// The organize queue is gone; the process is shutting down.
    #[error("organize queue closed")]
    QueueClosed,
}

impl IngestError {
    /// Whether the underlying condition may clear on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            IngestError::Storage(e) => e.is_retryable(),
            IngestError::QueueClosed => false,
        }
    }
}
