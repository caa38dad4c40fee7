use vellum_types::BlobKey;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// A payload is already stored under this key. Keys are minted per
    /// upload, so a collision means a caller bug, not a data race.
    #[error("payload already exists for key {0}")]
    KeyExists(BlobKey),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure (lock poisoning, remote store errors).
    #[error("blob backend failure: {0}")]
    Backend(String),
}

/// Result alias for blob store operations.
pub type BlobResult<T> = Result<T, BlobError>;
