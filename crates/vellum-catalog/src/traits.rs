use vellum_types::{DocumentId, DocumentRecord, UserId, UserRecord};

use crate::error::CatalogResult;

/// Storage backend for document and user records.
///
/// Implementations must be thread-safe (`Send + Sync`) and must apply each
/// document mutation atomically: a concurrent reader observes the record
/// either entirely before or entirely after an update, never in between.
/// The `(owner, title)` and `(owner, original_filename)` pairs are unique
/// indexes, enforced on insert; lookups through them are index reads, not
/// scans.
pub trait CatalogStore: Send + Sync {
    // -- documents ---------------------------------------------------------

    /// Insert a new document record.
    ///
    /// Validates the aggregate invariants, resets the revision counter to
    /// zero, and enforces both unique indexes. Returns the stored record.
    fn insert_document(&self, document: DocumentRecord) -> CatalogResult<DocumentRecord>;

    /// Replace a document record if its stored revision still equals
    /// `expected_revision` (optimistic compare-and-swap).
    ///
    /// On success the stored revision is bumped and the updated record
    /// returned. A lost race yields `CatalogError::RevisionConflict`; the
    /// caller re-reads and retries. The owner field is immutable.
    fn update_document(
        &self,
        document: DocumentRecord,
        expected_revision: u64,
    ) -> CatalogResult<DocumentRecord>;

    /// Read a document by id. Returns `Ok(None)` if absent.
    fn document(&self, id: &DocumentId) -> CatalogResult<Option<DocumentRecord>>;

    /// Look up a document through the unique `(owner, title)` index.
    fn document_by_owner_title(
        &self,
        owner: &UserId,
        title: &str,
    ) -> CatalogResult<Option<DocumentRecord>>;

    /// Look up a document through the unique `(owner, original_filename)`
    /// index.
    fn document_by_owner_filename(
        &self,
        owner: &UserId,
        filename: &str,
    ) -> CatalogResult<Option<DocumentRecord>>;

    /// Remove a document record. Returns `true` if it existed.
    fn remove_document(&self, id: &DocumentId) -> CatalogResult<bool>;

    /// Snapshot of every document record.
    fn documents(&self) -> CatalogResult<Vec<DocumentRecord>>;

    // -- users -------------------------------------------------------------

    /// Register a user. Username and email are unique.
    fn insert_user(&self, user: UserRecord) -> CatalogResult<()>;

    /// Read a user by id. Returns `Ok(None)` if absent.
    fn user(&self, id: &UserId) -> CatalogResult<Option<UserRecord>>;

    /// Look up a user by username.
    fn user_by_username(&self, username: &str) -> CatalogResult<Option<UserRecord>>;

    /// Resolve multiple users in one call.
    ///
    /// Default implementation calls `user()` per id.
    fn users(&self, ids: &[UserId]) -> CatalogResult<Vec<Option<UserRecord>>> {
        ids.iter().map(|id| self.user(id)).collect()
    }
}
