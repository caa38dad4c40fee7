use std::collections::HashMap;
use std::sync::RwLock;

use vellum_types::BlobKey;

use crate::error::{BlobError, BlobResult};
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Payloads are held behind a `RwLock`
/// for safe concurrent access and cloned on read.
pub struct InMemoryBlobStore {
    payloads: RwLock<HashMap<BlobKey, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            payloads: RwLock::new(HashMap::new()),
        }
    }

    /// Number of payloads currently stored.
    pub fn len(&self) -> usize {
        self.payloads.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store holds no payloads.
    pub fn is_empty(&self) -> bool {
        self.payloads.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored payloads.
    pub fn total_bytes(&self) -> u64 {
        self.payloads
            .read()
            .expect("lock poisoned")
            .values()
            .map(|p| p.len() as u64)
            .sum()
    }

    /// Remove every payload.
    pub fn clear(&self) {
        self.payloads.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, key: &BlobKey, bytes: &[u8]) -> BlobResult<()> {
        let mut map = self.payloads.write().expect("lock poisoned");
        if map.contains_key(key) {
            return Err(BlobError::KeyExists(*key));
        }
        map.insert(*key, bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &BlobKey) -> BlobResult<Option<Vec<u8>>> {
        let map = self.payloads.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn exists(&self, key: &BlobKey) -> BlobResult<bool> {
        let map = self.payloads.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    fn delete(&self, key: &BlobKey) -> BlobResult<bool> {
        let mut map = self.payloads.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("payload_count", &self.len())
            .finish()
    }
}
