use vellum_types::BlobKey;

use crate::error::BlobResult;

/// Durable storage for opaque version payloads.
///
/// All implementations must satisfy these invariants:
/// - A key addresses at most one payload, immutable once written; `put`
///   under an occupied key is an error, never an overwrite.
/// - Concurrent reads are always safe.
/// - The store never interprets payload contents.
/// - All I/O errors are propagated, never silently ignored.
pub trait BlobStore: Send + Sync {
    /// Store a payload under a freshly minted key.
    fn put(&self, key: &BlobKey, bytes: &[u8]) -> BlobResult<()>;

    /// Read a payload by key.
    ///
    /// Returns `Ok(None)` if no payload exists for the key.
    fn get(&self, key: &BlobKey) -> BlobResult<Option<Vec<u8>>>;

    /// Check whether a payload exists for the key.
    fn exists(&self, key: &BlobKey) -> BlobResult<bool>;

    /// Delete a payload. Returns `true` if one existed.
    fn delete(&self, key: &BlobKey) -> BlobResult<bool>;

    /// Delete multiple payloads and report which existed.
    ///
    /// Default implementation calls `delete()` per key. Backends may
    /// override for fewer round-trips.
    fn delete_batch(&self, keys: &[BlobKey]) -> BlobResult<Vec<bool>> {
        keys.iter().map(|key| self.delete(key)).collect()
    }
}
