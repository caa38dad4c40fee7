use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use vellum_types::BlobKey;

use crate::error::{BlobError, BlobResult};
use crate::traits::BlobStore;

/// Filesystem blob store: one payload file per key in a flat directory.
///
/// Writes go to a `.tmp` sibling first and are renamed into place, so a
/// crash mid-write never leaves a partially written payload visible to
/// readers. File names are the hyphenated key, never the original upload
/// filename.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> BlobResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened filesystem blob store");
        Ok(Self { root })
    }

    /// The directory payloads are stored under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn payload_path(&self, key: &BlobKey) -> PathBuf {
        self.root.join(key.to_string())
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &BlobKey, bytes: &[u8]) -> BlobResult<()> {
        let path = self.payload_path(key);
        if path.exists() {
            return Err(BlobError::KeyExists(*key));
        }

        let tmp = self.root.join(format!("{key}.tmp"));
        fs::write(&tmp, bytes)?;
        if let Err(err) = fs::rename(&tmp, &path) {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                warn!(key = %key, error = %cleanup, "failed to remove temp payload");
            }
            return Err(err.into());
        }

        debug!(key = %key, size = bytes.len(), "stored payload");
        Ok(())
    }

    fn get(&self, key: &BlobKey) -> BlobResult<Option<Vec<u8>>> {
        match fs::read(self.payload_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn exists(&self, key: &BlobKey) -> BlobResult<bool> {
        Ok(self.payload_path(key).is_file())
    }

    fn delete(&self, key: &BlobKey) -> BlobResult<bool> {
        match fs::remove_file(self.payload_path(key)) {
            Ok(()) => {
                debug!(key = %key, "deleted payload");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

impl std::fmt::Debug for FsBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsBlobStore")
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path().join("payloads")).unwrap();
        (dir, store)
    }

    #[test]
    fn open_creates_root_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("payloads");
        let store = FsBlobStore::open(&root).unwrap();
        assert!(store.root().is_dir());
    }

    #[test]
    fn put_and_get_roundtrip() {
        let (_dir, store) = store();
        let key = BlobKey::generate();
        store.put(&key, b"file contents").unwrap();

        let read_back = store.get(&key).unwrap().expect("should exist");
        assert_eq!(read_back, b"file contents");
    }

    #[test]
    fn payload_file_is_named_by_key() {
        let (_dir, store) = store();
        let key = BlobKey::generate();
        store.put(&key, b"x").unwrap();
        assert!(store.root().join(key.to_string()).is_file());
    }

    #[test]
    fn get_missing_returns_none() {
        let (_dir, store) = store();
        assert!(store.get(&BlobKey::generate()).unwrap().is_none());
    }

    #[test]
    fn put_under_occupied_key_is_an_error() {
        let (_dir, store) = store();
        let key = BlobKey::generate();
        store.put(&key, b"first").unwrap();

        let err = store.put(&key, b"second").unwrap_err();
        assert!(matches!(err, BlobError::KeyExists(k) if k == key));
        assert_eq!(store.get(&key).unwrap().unwrap(), b"first");
    }

    #[test]
    fn no_temp_file_left_behind() {
        let (_dir, store) = store();
        let key = BlobKey::generate();
        store.put(&key, b"payload").unwrap();
        assert!(!store.root().join(format!("{key}.tmp")).exists());
    }

    #[test]
    fn exists_and_delete() {
        let (_dir, store) = store();
        let key = BlobKey::generate();
        assert!(!store.exists(&key).unwrap());

        store.put(&key, b"payload").unwrap();
        assert!(store.exists(&key).unwrap());

        assert!(store.delete(&key).unwrap());
        assert!(!store.exists(&key).unwrap());
        assert!(!store.delete(&key).unwrap());
    }

    #[test]
    fn empty_payload_roundtrip() {
        // The service rejects empty uploads, but the store itself is
        // indifferent to payload size.
        let (_dir, store) = store();
        let key = BlobKey::generate();
        store.put(&key, b"").unwrap();
        assert_eq!(store.get(&key).unwrap().unwrap(), Vec::<u8>::new());
    }
}
