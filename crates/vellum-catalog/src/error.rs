use vellum_types::{DocumentError, DocumentId};

/// Errors from catalog store operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The document does not exist (or was deleted concurrently).
    #[error("document {} not found", .0.short_id())]
    DocumentMissing(DocumentId),

    /// The `(owner, title)` pair is already taken.
    #[error("a document titled \"{title}\" already exists for this owner")]
    DuplicateTitle { title: String },

    /// The `(owner, original_filename)` pair is already claimed by another
    /// document.
    #[error("filename \"{filename}\" is already used by document \"{title}\"")]
    DuplicateFilename { filename: String, title: String },

    /// Optimistic update lost a race; the caller should re-read and retry.
    #[error(
        "revision conflict on document {}: expected {expected}, found {actual}",
        .id.short_id()
    )]
    RevisionConflict {
        id: DocumentId,
        expected: u64,
        actual: u64,
    },

    /// A document's owner can never change.
    #[error("owner of document {} is immutable", .0.short_id())]
    OwnerChanged(DocumentId),

    /// Username or email is already registered.
    #[error("user already exists: {0}")]
    DuplicateUser(String),

    /// The record violates the document aggregate's invariants.
    #[error("integrity violation: {0}")]
    Integrity(#[from] DocumentError),

    /// Backend-specific failure (lock poisoning, connection loss).
    #[error("catalog backend failure: {0}")]
    Backend(String),
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
