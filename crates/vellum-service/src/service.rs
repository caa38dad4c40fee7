use std::sync::Arc;

use tracing::{debug, info, warn};
use vellum_access::{decide, Access, Operation};
use vellum_blob::BlobStore;
use vellum_catalog::{CatalogError, CatalogStore};
use vellum_types::{
    Actor, BlobKey, Checksum, DocumentId, DocumentRecord, UserId, VersionEntry, VersionInput,
    Visibility,
};

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::request::{ListFilter, ListQuery, UploadRequest};
use crate::view::{DocumentView, DownloadPayload, VersionView};

/// The document service: every user-facing operation against the catalog
/// and blob stores.
///
/// Mutations follow a strict ordering contract. Uploads write the blob
/// first and commit the catalog second, deleting the orphaned blob if the
/// commit fails; the reachable failure state is "payload exists but is
/// unreferenced", never "catalog references a missing payload". Deletions
/// reverse the order: payloads go best-effort first, the catalog record is
/// removed last and unconditionally, so no phantom document survives a
/// storage hiccup.
pub struct DocumentService {
    catalog: Arc<dyn CatalogStore>,
    blobs: Arc<dyn BlobStore>,
    config: ServiceConfig,
}

impl DocumentService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        blobs: Arc<dyn BlobStore>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            catalog,
            blobs,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // -- upload ------------------------------------------------------------

    /// Store a payload as a new document, or as a new version of the
    /// actor's existing document with the same title.
    pub fn upload(&self, actor: &Actor, request: UploadRequest) -> ServiceResult<DocumentView> {
        request.validate(&self.config)?;
        self.guard_filename(actor, &request)?;

        let key = BlobKey::generate();
        let checksum = Checksum::of(&request.bytes);
        self.blobs.put(&key, &request.bytes)?;

        match self.commit_upload(actor, &request, key, checksum) {
            Ok(record) => {
                info!(
                    document = %record.id,
                    version = record.current_version,
                    by = %actor.username,
                    "upload committed"
                );
                self.render(&record)
            }
            Err(err) => {
                // The payload was written but the catalog never referenced
                // it; remove it before surfacing the original error.
                if let Err(cleanup) = self.blobs.delete(&key) {
                    warn!(key = %key, error = %cleanup, "failed to remove orphaned payload");
                }
                Err(err)
            }
        }
    }

    /// Reject an upload whose filename is already claimed by one of the
    /// actor's documents under a different title lineage.
    fn guard_filename(&self, actor: &Actor, request: &UploadRequest) -> ServiceResult<()> {
        if let Some(claimed) = self
            .catalog
            .document_by_owner_filename(&actor.id, &request.original_filename)?
        {
            if claimed.title != request.title {
                return Err(ServiceError::Conflict(format!(
                    "filename \"{}\" is already used by document \"{}\"",
                    request.original_filename, claimed.title
                )));
            }
        }
        Ok(())
    }

    fn commit_upload(
        &self,
        actor: &Actor,
        request: &UploadRequest,
        blob: BlobKey,
        checksum: Checksum,
    ) -> ServiceResult<DocumentRecord> {
        for attempt in 0..self.config.cas_retry_limit {
            if attempt > 0 {
                debug!(attempt, title = %request.title, "retrying contended upload");
            }

            match self
                .catalog
                .document_by_owner_title(&actor.id, &request.title)?
            {
                Some(existing) => {
                    self.authorize(actor, &existing, Operation::Write)?;
                    let expected_revision = existing.revision;
                    let mut document = existing;
                    document.append_version(self.version_input(actor, request, blob, checksum));
                    match self.catalog.update_document(document, expected_revision) {
                        Ok(stored) => return Ok(stored),
                        // Lost the race, or the document was deleted after
                        // the lookup; resolve again from scratch.
                        Err(CatalogError::RevisionConflict { .. })
                        | Err(CatalogError::DocumentMissing(_)) => continue,
                        Err(other) => return Err(other.into()),
                    }
                }
                None => {
                    let document = DocumentRecord::create(
                        actor.id,
                        request.title.clone(),
                        request.description.clone(),
                        request.tags.clone(),
                        request.visibility,
                        self.version_input(actor, request, blob, checksum),
                    );
                    match self.catalog.insert_document(document) {
                        Ok(stored) => return Ok(stored),
                        // A concurrent create won the title; append to it
                        // on the next round instead.
                        Err(CatalogError::DuplicateTitle { .. }) => continue,
                        Err(CatalogError::DuplicateFilename { filename, title }) => {
                            return Err(ServiceError::Conflict(format!(
                                "filename \"{filename}\" is already used by document \"{title}\""
                            )))
                        }
                        Err(other) => return Err(other.into()),
                    }
                }
            }
        }

        Err(ServiceError::Conflict(format!(
            "document \"{}\" is receiving concurrent updates, retry the upload",
            request.title
        )))
    }

    fn version_input(
        &self,
        actor: &Actor,
        request: &UploadRequest,
        blob: BlobKey,
        checksum: Checksum,
    ) -> VersionInput {
        VersionInput {
            blob,
            checksum,
            size: request.bytes.len() as u64,
            original_filename: request.original_filename.clone(),
            media_type: request.media_type.clone(),
            uploaded_by: actor.id,
            note: request.change_note.clone(),
        }
    }

    // -- listing -----------------------------------------------------------

    /// Documents visible to the actor, filtered and searched, most recently
    /// updated first. Each call computes a fresh snapshot.
    pub fn list(&self, actor: &Actor, query: &ListQuery) -> ServiceResult<Vec<DocumentView>> {
        let mut records: Vec<DocumentRecord> = self
            .catalog
            .documents()?
            .into_iter()
            .filter(|doc| Self::filter_matches(actor, doc, query.filter))
            .filter(|doc| Self::search_matches(doc, query.search.as_deref()))
            .collect();
        Self::sort_newest_first(&mut records);
        records.iter().map(|doc| self.render(doc)).collect()
    }

    /// Every document in the catalog, administrators only.
    pub fn list_all(&self, actor: &Actor) -> ServiceResult<Vec<DocumentView>> {
        // Cross-user listing is an administer-level operation with no
        // single document to evaluate.
        if !actor.is_admin {
            return Err(ServiceError::Forbidden(
                "administrator access required".into(),
            ));
        }
        let mut records = self.catalog.documents()?;
        Self::sort_newest_first(&mut records);
        records.iter().map(|doc| self.render(doc)).collect()
    }

    /// The read rule without the administrator bypass: administrators use
    /// `list_all` for the cross-user view, their personal listing behaves
    /// like everyone else's.
    fn filter_matches(actor: &Actor, document: &DocumentRecord, filter: ListFilter) -> bool {
        let owned = document.is_owner(&actor.id);
        let shared = document.is_collaborator(&actor.id);
        let public = document.visibility.is_public();
        match filter {
            ListFilter::All => public || owned || shared,
            ListFilter::Public => public,
            ListFilter::Private => !public && (owned || shared),
            ListFilter::Mine => owned,
            ListFilter::Shared => shared,
        }
    }

    fn search_matches(document: &DocumentRecord, term: Option<&str>) -> bool {
        let Some(term) = term else { return true };
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        document.title.to_lowercase().contains(&term)
            || document.description.to_lowercase().contains(&term)
            || document
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&term))
    }

    fn sort_newest_first(records: &mut [DocumentRecord]) {
        // Id as tie-breaker keeps repeated listings byte-identical.
        records.sort_by(|a, b| {
            b.latest_activity()
                .cmp(&a.latest_activity())
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    // -- downloads ---------------------------------------------------------

    /// Download the current version's payload.
    pub fn download_current(
        &self,
        actor: &Actor,
        id: &DocumentId,
    ) -> ServiceResult<DownloadPayload> {
        let document = self.resolve(id)?;
        self.authorize(actor, &document, Operation::Read)?;
        let head = Self::head_entry(&document)?;
        let bytes = self.fetch_payload(head)?;
        Ok(DownloadPayload {
            filename: head.original_filename.clone(),
            media_type: head.media_type.clone(),
            bytes,
        })
    }

    /// Download a specific historical version's payload. The filename hint
    /// carries the version number so it cannot be mistaken for the current
    /// file.
    pub fn download_version(
        &self,
        actor: &Actor,
        id: &DocumentId,
        version: u32,
    ) -> ServiceResult<DownloadPayload> {
        let document = self.resolve(id)?;
        self.authorize(actor, &document, Operation::Read)?;
        let entry = document.version(version).ok_or_else(|| {
            ServiceError::NotFound(format!(
                "version {version} of document {} not found",
                id.short_id()
            ))
        })?;
        let bytes = self.fetch_payload(entry)?;
        Ok(DownloadPayload {
            filename: entry.versioned_filename(),
            media_type: entry.media_type.clone(),
            bytes,
        })
    }

    fn fetch_payload(&self, entry: &VersionEntry) -> ServiceResult<Vec<u8>> {
        let bytes = self.blobs.get(&entry.blob)?.ok_or_else(|| {
            ServiceError::Storage(format!("payload missing for version {}", entry.version))
        })?;
        if !entry.checksum.matches(&bytes) {
            return Err(ServiceError::Storage(format!(
                "payload checksum mismatch for version {}",
                entry.version
            )));
        }
        Ok(bytes)
    }

    // -- history -----------------------------------------------------------

    /// The document's version history, newest first.
    pub fn history(&self, actor: &Actor, id: &DocumentId) -> ServiceResult<Vec<VersionView>> {
        let document = self.resolve(id)?;
        self.authorize(actor, &document, Operation::Read)?;
        document
            .history()
            .into_iter()
            .map(|entry| self.render_version(entry))
            .collect()
    }

    // -- deletion ----------------------------------------------------------

    /// Delete a document and every payload its ledger references.
    ///
    /// Owners and collaborators may delete; administrators bypass.
    pub fn delete(&self, actor: &Actor, id: &DocumentId) -> ServiceResult<()> {
        let document = self.resolve(id)?;
        self.authorize(actor, &document, Operation::Write)?;

        // Storage is best-effort; the catalog removal below is
        // authoritative and must not be skipped when a payload fails to
        // delete.
        for key in document.blob_keys() {
            match self.blobs.delete(&key) {
                Ok(true) => {}
                Ok(false) => warn!(key = %key, "payload already absent during delete"),
                Err(err) => warn!(key = %key, error = %err, "failed to delete payload"),
            }
        }

        self.catalog.remove_document(id)?;
        info!(document = %id, by = %actor.username, "document deleted");
        Ok(())
    }

    // -- collaborators and visibility --------------------------------------

    /// Grant `target_username` collaborator access. Owner only.
    pub fn add_collaborator(
        &self,
        actor: &Actor,
        id: &DocumentId,
        target_username: &str,
    ) -> ServiceResult<DocumentView> {
        let target = self
            .catalog
            .user_by_username(target_username)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("user \"{target_username}\" not found"))
            })?;

        let record = self.update_with_retry(actor, id, Operation::Manage, |document| {
            document
                .add_collaborator(target.id)
                .map_err(|err| ServiceError::Conflict(err.to_string()))
        })?;
        info!(document = %id, collaborator = %target.username, "collaborator added");
        self.render(&record)
    }

    /// Flip a document between public and private. Owner or administrator.
    pub fn set_visibility(
        &self,
        actor: &Actor,
        id: &DocumentId,
        visibility: Visibility,
    ) -> ServiceResult<DocumentView> {
        let record = self.update_with_retry(actor, id, Operation::Manage, |document| {
            document.visibility = visibility;
            Ok(())
        })?;
        info!(document = %id, visibility = %visibility, "visibility changed");
        self.render(&record)
    }

    /// Re-read, authorize, mutate, and CAS-commit a document, retrying
    /// lost races up to the configured limit.
    fn update_with_retry(
        &self,
        actor: &Actor,
        id: &DocumentId,
        operation: Operation,
        mutate: impl Fn(&mut DocumentRecord) -> ServiceResult<()>,
    ) -> ServiceResult<DocumentRecord> {
        for attempt in 0..self.config.cas_retry_limit {
            if attempt > 0 {
                debug!(attempt, document = %id, "retrying contended update");
            }
            let mut document = self.resolve(id)?;
            self.authorize(actor, &document, operation)?;
            let expected_revision = document.revision;
            mutate(&mut document)?;
            match self.catalog.update_document(document, expected_revision) {
                Ok(stored) => return Ok(stored),
                Err(CatalogError::RevisionConflict { .. }) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(ServiceError::Conflict(
            "document is receiving concurrent updates, retry the operation".into(),
        ))
    }

    // -- internals ---------------------------------------------------------

    fn resolve(&self, id: &DocumentId) -> ServiceResult<DocumentRecord> {
        self.catalog.document(id)?.ok_or_else(|| {
            ServiceError::NotFound(format!("document {} not found", id.short_id()))
        })
    }

    fn authorize(
        &self,
        actor: &Actor,
        document: &DocumentRecord,
        operation: Operation,
    ) -> ServiceResult<()> {
        match decide(actor, document, operation) {
            Access::Allow => Ok(()),
            Access::Deny { reason } => Err(ServiceError::Forbidden(reason)),
        }
    }

    fn head_entry(document: &DocumentRecord) -> ServiceResult<&VersionEntry> {
        // The catalog refuses to persist a record whose ledger is broken,
        // so a missing head means the store itself is damaged.
        document.head().ok_or_else(|| {
            ServiceError::Storage(format!(
                "document {} has no current version entry",
                document.id.short_id()
            ))
        })
    }

    fn render(&self, record: &DocumentRecord) -> ServiceResult<DocumentView> {
        let head = Self::head_entry(record)?;
        let owner = self.display_name(&record.owner)?;
        let collaborators = record
            .collaborators
            .iter()
            .map(|id| self.display_name(id))
            .collect::<ServiceResult<Vec<_>>>()?;
        let versions = record
            .history()
            .into_iter()
            .map(|entry| self.render_version(entry))
            .collect::<ServiceResult<Vec<_>>>()?;
        Ok(DocumentView {
            id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            tags: record.tags.clone(),
            owner,
            visibility: record.visibility,
            size: head.size,
            media_type: head.media_type.clone(),
            current_version: record.current_version,
            collaborators,
            updated_at: record.updated_at,
            versions,
        })
    }

    fn render_version(&self, entry: &VersionEntry) -> ServiceResult<VersionView> {
        Ok(VersionView {
            version: entry.version,
            uploaded_at: entry.uploaded_at,
            uploaded_by: self.display_name(&entry.uploaded_by)?,
            note: entry.note.clone(),
        })
    }

    fn display_name(&self, id: &UserId) -> ServiceResult<String> {
        Ok(self
            .catalog
            .user(id)?
            .map(|user| user.username)
            .unwrap_or_else(|| "unknown".to_string()))
    }
}

impl std::fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentService")
            .field("config", &self.config)
            .finish()
    }
}
