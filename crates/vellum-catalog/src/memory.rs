use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;
use vellum_types::{DocumentId, DocumentRecord, UserId, UserRecord};

use crate::error::{CatalogError, CatalogResult};
use crate::traits::CatalogStore;

/// In-memory catalog for tests, local demos, and embedding.
///
/// The primary map and both secondary indexes live in one state struct
/// behind a single `RwLock`, so every mutation is applied atomically and
/// readers always observe a consistent snapshot.
pub struct InMemoryCatalog {
    inner: RwLock<CatalogState>,
}

#[derive(Default)]
struct CatalogState {
    documents: HashMap<DocumentId, DocumentRecord>,
    by_owner_title: HashMap<(UserId, String), DocumentId>,
    by_owner_filename: HashMap<(UserId, String), DocumentId>,
    users: HashMap<UserId, UserRecord>,
    by_username: HashMap<String, UserId>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CatalogState::default()),
        }
    }

    /// Number of document records.
    pub fn document_count(&self) -> usize {
        self.read_state(|state| state.documents.len())
    }

    /// Number of registered users.
    pub fn user_count(&self) -> usize {
        self.read_state(|state| state.users.len())
    }

    fn read_state<T>(&self, f: impl FnOnce(&CatalogState) -> T) -> T {
        let state = self.inner.read().expect("lock poisoned");
        f(&state)
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore for InMemoryCatalog {
    fn insert_document(&self, mut document: DocumentRecord) -> CatalogResult<DocumentRecord> {
        document.check_invariants()?;

        let mut state = self.inner.write().expect("lock poisoned");

        let title_key = (document.owner, document.title.clone());
        if state.by_owner_title.contains_key(&title_key) {
            return Err(CatalogError::DuplicateTitle {
                title: document.title,
            });
        }

        let filename_key = (document.owner, document.original_filename.clone());
        if let Some(claimed_by) = state.by_owner_filename.get(&filename_key) {
            let title = state
                .documents
                .get(claimed_by)
                .map(|d| d.title.clone())
                .unwrap_or_default();
            return Err(CatalogError::DuplicateFilename {
                filename: document.original_filename,
                title,
            });
        }

        document.revision = 0;
        state.by_owner_title.insert(title_key, document.id);
        state.by_owner_filename.insert(filename_key, document.id);
        state.documents.insert(document.id, document.clone());
        Ok(document)
    }

    fn update_document(
        &self,
        mut document: DocumentRecord,
        expected_revision: u64,
    ) -> CatalogResult<DocumentRecord> {
        document.check_invariants()?;

        let mut state = self.inner.write().expect("lock poisoned");

        let (stored_revision, stored_owner, stored_title, stored_filename) =
            match state.documents.get(&document.id) {
                Some(existing) => (
                    existing.revision,
                    existing.owner,
                    existing.title.clone(),
                    existing.original_filename.clone(),
                ),
                None => return Err(CatalogError::DocumentMissing(document.id)),
            };

        if stored_owner != document.owner {
            return Err(CatalogError::OwnerChanged(document.id));
        }
        if stored_revision != expected_revision {
            debug!(
                document = %document.id,
                expected = expected_revision,
                actual = stored_revision,
                "revision conflict"
            );
            return Err(CatalogError::RevisionConflict {
                id: document.id,
                expected: expected_revision,
                actual: stored_revision,
            });
        }

        // Title renames re-index; the new slot must be free.
        if stored_title != document.title {
            let new_key = (document.owner, document.title.clone());
            if state.by_owner_title.contains_key(&new_key) {
                return Err(CatalogError::DuplicateTitle {
                    title: document.title,
                });
            }
            state.by_owner_title.remove(&(stored_owner, stored_title));
            state.by_owner_title.insert(new_key, document.id);
        }
        if stored_filename != document.original_filename {
            let new_key = (document.owner, document.original_filename.clone());
            if state.by_owner_filename.contains_key(&new_key) {
                let title = document.title.clone();
                return Err(CatalogError::DuplicateFilename {
                    filename: document.original_filename,
                    title,
                });
            }
            state
                .by_owner_filename
                .remove(&(stored_owner, stored_filename));
            state.by_owner_filename.insert(new_key, document.id);
        }

        document.revision = expected_revision + 1;
        state.documents.insert(document.id, document.clone());
        Ok(document)
    }

    fn document(&self, id: &DocumentId) -> CatalogResult<Option<DocumentRecord>> {
        Ok(self.read_state(|state| state.documents.get(id).cloned()))
    }

    fn document_by_owner_title(
        &self,
        owner: &UserId,
        title: &str,
    ) -> CatalogResult<Option<DocumentRecord>> {
        Ok(self.read_state(|state| {
            state
                .by_owner_title
                .get(&(*owner, title.to_string()))
                .and_then(|id| state.documents.get(id))
                .cloned()
        }))
    }

    fn document_by_owner_filename(
        &self,
        owner: &UserId,
        filename: &str,
    ) -> CatalogResult<Option<DocumentRecord>> {
        Ok(self.read_state(|state| {
            state
                .by_owner_filename
                .get(&(*owner, filename.to_string()))
                .and_then(|id| state.documents.get(id))
                .cloned()
        }))
    }

    fn remove_document(&self, id: &DocumentId) -> CatalogResult<bool> {
        let mut state = self.inner.write().expect("lock poisoned");
        match state.documents.remove(id) {
            Some(removed) => {
                state
                    .by_owner_title
                    .remove(&(removed.owner, removed.title.clone()));
                state
                    .by_owner_filename
                    .remove(&(removed.owner, removed.original_filename.clone()));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn documents(&self) -> CatalogResult<Vec<DocumentRecord>> {
        Ok(self.read_state(|state| state.documents.values().cloned().collect()))
    }

    fn insert_user(&self, user: UserRecord) -> CatalogResult<()> {
        let mut state = self.inner.write().expect("lock poisoned");
        if state.by_username.contains_key(&user.username) {
            return Err(CatalogError::DuplicateUser(user.username));
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(CatalogError::DuplicateUser(user.email));
        }
        state.by_username.insert(user.username.clone(), user.id);
        state.users.insert(user.id, user);
        Ok(())
    }

    fn user(&self, id: &UserId) -> CatalogResult<Option<UserRecord>> {
        Ok(self.read_state(|state| state.users.get(id).cloned()))
    }

    fn user_by_username(&self, username: &str) -> CatalogResult<Option<UserRecord>> {
        Ok(self.read_state(|state| {
            state
                .by_username
                .get(username)
                .and_then(|id| state.users.get(id))
                .cloned()
        }))
    }
}

impl std::fmt::Debug for InMemoryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCatalog")
            .field("document_count", &self.document_count())
            .field("user_count", &self.user_count())
            .finish()
    }
}
