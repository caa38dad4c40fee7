use thiserror::Error;
use vellum_blob::BlobError;
use vellum_catalog::CatalogError;

/// Error taxonomy kind, for the boundary layer to map onto its own status
/// codes without matching message strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    PayloadTooLarge,
    InvalidInput,
    Storage,
}

/// Errors surfaced by the document service.
///
/// Every failure path returns exactly one of these kinds with a
/// human-readable message; internal storage paths never leak into the
/// message text.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Document, version, or target user absent.
    #[error("{0}")]
    NotFound(String),

    /// Access-control denial.
    #[error("access denied: {0}")]
    Forbidden(String),

    /// Duplicate filename, title collision misuse, already-a-collaborator,
    /// or a mutation contended past the retry limit.
    #[error("{0}")]
    Conflict(String),

    /// Payload exceeds the configured byte ceiling.
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// Precondition violation detected before any mutation.
    #[error("invalid request: {0}")]
    InvalidInput(String),

    /// Blob or catalog failure, including integrity violations.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<BlobError> for ServiceError {
    fn from(err: BlobError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<CatalogError> for ServiceError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::DocumentMissing(id) => {
                Self::NotFound(format!("document {} not found", id.short_id()))
            }
            CatalogError::DuplicateTitle { .. }
            | CatalogError::DuplicateFilename { .. }
            | CatalogError::DuplicateUser(_)
            | CatalogError::RevisionConflict { .. } => Self::Conflict(err.to_string()),
            CatalogError::OwnerChanged(_)
            | CatalogError::Integrity(_)
            | CatalogError::Backend(_) => Self::Storage(err.to_string()),
        }
    }
}

/// Result alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_types::DocumentId;

    #[test]
    fn kinds_are_distinguishable() {
        assert_eq!(
            ServiceError::NotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ServiceError::PayloadTooLarge { size: 2, limit: 1 }.kind(),
            ErrorKind::PayloadTooLarge
        );
        assert_eq!(ServiceError::Storage("x".into()).kind(), ErrorKind::Storage);
    }

    #[test]
    fn catalog_conflicts_map_to_conflict() {
        let err: ServiceError = CatalogError::DuplicateTitle {
            title: "Report".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn missing_document_maps_to_not_found() {
        let err: ServiceError = CatalogError::DocumentMissing(DocumentId::generate()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn integrity_maps_to_storage() {
        let err: ServiceError =
            CatalogError::Integrity(vellum_types::DocumentError::EmptyLedger).into();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
}
