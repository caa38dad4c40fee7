use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;
use crate::error::DocumentError;
use crate::id::{BlobKey, DocumentId, UserId};

/// Who may see a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Readable by any actor.
    Public,
    /// Readable only by the owner and collaborators.
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
        }
    }
}

/// One immutable entry in a document's version ledger.
///
/// Entries are created exactly once at append time and never edited; they
/// are removed only as a batch when the whole document is deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Ledger-assigned version number, contiguous from 1.
    pub version: u32,
    /// Storage key of this version's payload.
    pub blob: BlobKey,
    /// Payload digest, verified on download.
    pub checksum: Checksum,
    /// Payload size in bytes.
    pub size: u64,
    /// Filename the client supplied when uploading this version.
    pub original_filename: String,
    /// Declared media type of the payload.
    pub media_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: UserId,
    /// Free-text change note.
    pub note: String,
}

impl VersionEntry {
    /// Filename hint that disambiguates this version from the current one,
    /// e.g. `report_v3.pdf` for version 3 of `report.pdf`.
    pub fn versioned_filename(&self) -> String {
        match self.original_filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                format!("{stem}_v{}.{ext}", self.version)
            }
            _ => format!("{}_v{}", self.original_filename, self.version),
        }
    }
}

/// Payload metadata for a version about to be appended.
///
/// The ledger, not the caller, assigns the version number; this input
/// carries everything else.
#[derive(Clone, Debug)]
pub struct VersionInput {
    pub blob: BlobKey,
    pub checksum: Checksum,
    pub size: u64,
    pub original_filename: String,
    pub media_type: String,
    pub uploaded_by: UserId,
    pub note: Option<String>,
}

/// The document aggregate: ownership, visibility, and the embedded
/// append-only version ledger.
///
/// The record exclusively owns its ledger: entries cannot outlive or be
/// detached from the document. Blobs are referenced by ledger entries, not
/// owned; whoever removes the last reference must delete the payload.
///
/// Every persisted record satisfies [`DocumentRecord::check_invariants`];
/// the catalog store enforces this on insert and update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    /// Catalog CAS token, bumped by the store on every successful update.
    pub revision: u64,
    pub title: String,
    pub description: String,
    /// Set semantics: trimmed, deduplicated, order irrelevant.
    pub tags: Vec<String>,
    /// Filename supplied at creation; key of the duplicate-filename index.
    pub original_filename: String,
    /// Immutable once set.
    pub owner: UserId,
    pub visibility: Visibility,
    /// Set semantics; never contains `owner`.
    pub collaborators: Vec<UserId>,
    /// Highest version number in the ledger.
    pub current_version: u32,
    /// Storage pointer to the current version's payload.
    pub current_blob: BlobKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The version ledger, append-only, in version order.
    pub versions: Vec<VersionEntry>,
}

impl DocumentRecord {
    /// Create a new document with a single-entry ledger at version 1.
    ///
    /// The change note defaults to `"Initial upload"` when absent.
    pub fn create(
        owner: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        tags: Vec<String>,
        visibility: Visibility,
        input: VersionInput,
    ) -> Self {
        let now = Utc::now();
        let entry = VersionEntry {
            version: 1,
            blob: input.blob,
            checksum: input.checksum,
            size: input.size,
            original_filename: input.original_filename.clone(),
            media_type: input.media_type,
            uploaded_at: now,
            uploaded_by: input.uploaded_by,
            note: input.note.unwrap_or_else(|| "Initial upload".to_string()),
        };
        Self {
            id: DocumentId::generate(),
            revision: 0,
            title: title.into(),
            description: description.into(),
            tags: normalize_tags(tags),
            original_filename: input.original_filename,
            owner,
            visibility,
            collaborators: Vec::new(),
            current_version: 1,
            current_blob: entry.blob,
            created_at: now,
            updated_at: now,
            versions: vec![entry],
        }
    }

    /// Append a new version, assigning the next contiguous number.
    ///
    /// Updates the storage pointer, `current_version`, and `updated_at`
    /// together; the caller persists the whole record under one atomic
    /// catalog update. The change note defaults to `"Version {n}"`.
    /// Returns the assigned number.
    pub fn append_version(&mut self, input: VersionInput) -> u32 {
        let next = self.current_version + 1;
        let now = Utc::now();
        let entry = VersionEntry {
            version: next,
            blob: input.blob,
            checksum: input.checksum,
            size: input.size,
            original_filename: input.original_filename,
            media_type: input.media_type,
            uploaded_at: now,
            uploaded_by: input.uploaded_by,
            note: input.note.unwrap_or_else(|| format!("Version {next}")),
        };
        self.current_blob = entry.blob;
        self.current_version = next;
        self.updated_at = now;
        self.versions.push(entry);
        next
    }

    /// The ledger entry for the current version.
    ///
    /// `None` only on a record that violates the ledger invariants, which
    /// the catalog refuses to persist.
    pub fn head(&self) -> Option<&VersionEntry> {
        self.versions
            .iter()
            .find(|e| e.version == self.current_version)
    }

    /// Look up a specific version number.
    pub fn version(&self, number: u32) -> Option<&VersionEntry> {
        self.versions.iter().find(|e| e.version == number)
    }

    /// Ledger entries ordered by version number descending (most recent
    /// first), independent of storage order.
    pub fn history(&self) -> Vec<&VersionEntry> {
        let mut entries: Vec<&VersionEntry> = self.versions.iter().collect();
        entries.sort_by(|a, b| b.version.cmp(&a.version));
        entries
    }

    /// Timestamp of the latest version, the sort key for listings.
    pub fn latest_activity(&self) -> DateTime<Utc> {
        self.head().map(|e| e.uploaded_at).unwrap_or(self.updated_at)
    }

    /// Storage keys of every payload the ledger references.
    pub fn blob_keys(&self) -> Vec<BlobKey> {
        self.versions.iter().map(|e| e.blob).collect()
    }

    pub fn is_owner(&self, user: &UserId) -> bool {
        self.owner == *user
    }

    pub fn is_collaborator(&self, user: &UserId) -> bool {
        self.collaborators.contains(user)
    }

    /// Grant a user collaborator access.
    ///
    /// Rejects the owner (no self-collaboration) and duplicates.
    pub fn add_collaborator(&mut self, user: UserId) -> Result<(), DocumentError> {
        if user == self.owner {
            return Err(DocumentError::OwnerIsCollaborator);
        }
        if self.collaborators.contains(&user) {
            return Err(DocumentError::DuplicateCollaborator);
        }
        self.collaborators.push(user);
        Ok(())
    }

    /// Validate the aggregate's invariants.
    ///
    /// 1. The ledger is non-empty.
    /// 2. Version numbers are exactly `1..=current_version`, in order.
    /// 3. `current_version` equals the ledger head's number.
    /// 4. The storage pointer matches the head entry's blob.
    /// 5. The owner is not a collaborator.
    pub fn check_invariants(&self) -> Result<(), DocumentError> {
        if self.versions.is_empty() {
            return Err(DocumentError::EmptyLedger);
        }
        for (index, entry) in self.versions.iter().enumerate() {
            let expected = (index + 1) as u32;
            if entry.version != expected {
                return Err(DocumentError::NonContiguous {
                    expected,
                    found: entry.version,
                });
            }
        }
        // Non-empty is checked above, so the last entry exists.
        let head = &self.versions[self.versions.len() - 1];
        if self.current_version != head.version {
            return Err(DocumentError::HeadMismatch {
                current: self.current_version,
                head: head.version,
            });
        }
        if self.current_blob != head.blob {
            return Err(DocumentError::PointerMismatch);
        }
        if self.collaborators.contains(&self.owner) {
            return Err(DocumentError::OwnerIsCollaborator);
        }
        Ok(())
    }
}

/// Trim tags, drop empties, and deduplicate while preserving first-seen
/// order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input(note: Option<&str>) -> VersionInput {
        VersionInput {
            blob: BlobKey::generate(),
            checksum: Checksum::of(b"payload"),
            size: 7,
            original_filename: "report.pdf".to_string(),
            media_type: "application/pdf".to_string(),
            uploaded_by: UserId::generate(),
            note: note.map(String::from),
        }
    }

    fn document() -> DocumentRecord {
        DocumentRecord::create(
            UserId::generate(),
            "Report",
            "quarterly numbers",
            vec!["finance".to_string()],
            Visibility::Private,
            input(None),
        )
    }

    // -----------------------------------------------------------------------
    // Creation and append
    // -----------------------------------------------------------------------

    #[test]
    fn create_starts_at_version_one() {
        let doc = document();
        assert_eq!(doc.current_version, 1);
        assert_eq!(doc.versions.len(), 1);
        assert_eq!(doc.versions[0].note, "Initial upload");
        assert_eq!(doc.current_blob, doc.versions[0].blob);
        doc.check_invariants().unwrap();
    }

    #[test]
    fn create_keeps_explicit_note() {
        let doc = DocumentRecord::create(
            UserId::generate(),
            "Report",
            "",
            vec![],
            Visibility::Public,
            input(Some("first draft")),
        );
        assert_eq!(doc.versions[0].note, "first draft");
    }

    #[test]
    fn append_assigns_next_contiguous_number() {
        let mut doc = document();
        let n = doc.append_version(input(None));
        assert_eq!(n, 2);
        assert_eq!(doc.current_version, 2);
        assert_eq!(doc.versions.len(), 2);
        assert_eq!(doc.versions[1].note, "Version 2");
        doc.check_invariants().unwrap();
    }

    #[test]
    fn append_moves_storage_pointer() {
        let mut doc = document();
        let old_blob = doc.current_blob;
        doc.append_version(input(Some("fixed totals")));
        assert_ne!(doc.current_blob, old_blob);
        assert_eq!(doc.current_blob, doc.versions[1].blob);
        assert_eq!(doc.versions[1].note, "fixed totals");
        assert!(doc.updated_at >= doc.created_at);
    }

    #[test]
    fn history_is_descending() {
        let mut doc = document();
        doc.append_version(input(None));
        doc.append_version(input(None));
        let history = doc.history();
        let numbers: Vec<u32> = history.iter().map(|e| e.version).collect();
        assert_eq!(numbers, vec![3, 2, 1]);
    }

    #[test]
    fn version_lookup() {
        let mut doc = document();
        doc.append_version(input(None));
        assert_eq!(doc.version(1).unwrap().version, 1);
        assert_eq!(doc.version(2).unwrap().version, 2);
        assert!(doc.version(3).is_none());
        assert!(doc.version(0).is_none());
    }

    #[test]
    fn head_tracks_current_version() {
        let mut doc = document();
        doc.append_version(input(None));
        assert_eq!(doc.head().unwrap().version, 2);
    }

    // -----------------------------------------------------------------------
    // Versioned filenames
    // -----------------------------------------------------------------------

    #[test]
    fn versioned_filename_with_extension() {
        let mut doc = document();
        doc.append_version(input(None));
        assert_eq!(doc.version(2).unwrap().versioned_filename(), "report_v2.pdf");
    }

    #[test]
    fn versioned_filename_without_extension() {
        let mut doc = document();
        let mut i = input(None);
        i.original_filename = "CHANGELOG".to_string();
        doc.append_version(i);
        assert_eq!(doc.version(2).unwrap().versioned_filename(), "CHANGELOG_v2");
    }

    #[test]
    fn versioned_filename_for_dotfile() {
        let mut doc = document();
        let mut i = input(None);
        i.original_filename = ".env".to_string();
        doc.append_version(i);
        assert_eq!(doc.version(2).unwrap().versioned_filename(), ".env_v2");
    }

    // -----------------------------------------------------------------------
    // Collaborators
    // -----------------------------------------------------------------------

    #[test]
    fn add_collaborator_rejects_owner() {
        let mut doc = document();
        let owner = doc.owner;
        assert_eq!(
            doc.add_collaborator(owner),
            Err(DocumentError::OwnerIsCollaborator)
        );
    }

    #[test]
    fn add_collaborator_rejects_duplicates() {
        let mut doc = document();
        let user = UserId::generate();
        doc.add_collaborator(user).unwrap();
        assert_eq!(
            doc.add_collaborator(user),
            Err(DocumentError::DuplicateCollaborator)
        );
        assert_eq!(doc.collaborators.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    #[test]
    fn invariants_reject_empty_ledger() {
        let mut doc = document();
        doc.versions.clear();
        assert_eq!(doc.check_invariants(), Err(DocumentError::EmptyLedger));
    }

    #[test]
    fn invariants_reject_gap() {
        let mut doc = document();
        doc.append_version(input(None));
        doc.versions[1].version = 3;
        doc.current_version = 3;
        doc.current_blob = doc.versions[1].blob;
        assert_eq!(
            doc.check_invariants(),
            Err(DocumentError::NonContiguous {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn invariants_reject_head_mismatch() {
        let mut doc = document();
        doc.current_version = 5;
        assert_eq!(
            doc.check_invariants(),
            Err(DocumentError::HeadMismatch { current: 5, head: 1 })
        );
    }

    #[test]
    fn invariants_reject_stale_pointer() {
        let mut doc = document();
        doc.current_blob = BlobKey::generate();
        assert_eq!(doc.check_invariants(), Err(DocumentError::PointerMismatch));
    }

    #[test]
    fn invariants_reject_owner_as_collaborator() {
        let mut doc = document();
        let owner = doc.owner;
        doc.collaborators.push(owner);
        assert_eq!(
            doc.check_invariants(),
            Err(DocumentError::OwnerIsCollaborator)
        );
    }

    // -----------------------------------------------------------------------
    // Tags
    // -----------------------------------------------------------------------

    #[test]
    fn tags_are_normalized_on_create() {
        let doc = DocumentRecord::create(
            UserId::generate(),
            "Tagged",
            "",
            vec![
                " finance ".to_string(),
                "finance".to_string(),
                "".to_string(),
                "q3".to_string(),
            ],
            Visibility::Public,
            input(None),
        );
        assert_eq!(doc.tags, vec!["finance".to_string(), "q3".to_string()]);
    }

    #[test]
    fn normalize_preserves_first_seen_order() {
        let tags = normalize_tags(vec![
            "b".to_string(),
            "a".to_string(),
            "b ".to_string(),
        ]);
        assert_eq!(tags, vec!["b".to_string(), "a".to_string()]);
    }

    // -----------------------------------------------------------------------
    // Serde
    // -----------------------------------------------------------------------

    #[test]
    fn record_serde_roundtrip() {
        let mut doc = document();
        doc.append_version(input(Some("second")));
        let json = serde_json::to_string(&doc).unwrap();
        let parsed: DocumentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, parsed);
    }

    #[test]
    fn visibility_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Visibility::Public).unwrap(),
            "\"public\""
        );
        assert_eq!(
            serde_json::to_string(&Visibility::Private).unwrap(),
            "\"private\""
        );
    }

    // -----------------------------------------------------------------------
    // Ledger contiguity property
    // -----------------------------------------------------------------------

    proptest! {
        #[test]
        fn appends_never_break_contiguity(notes in proptest::collection::vec(
            proptest::option::of("[a-z ]{0,12}"), 0..24
        )) {
            let mut doc = document();
            for note in notes {
                doc.append_version(input(note.as_deref()));
            }
            prop_assert!(doc.check_invariants().is_ok());
            let numbers: Vec<u32> = doc.versions.iter().map(|e| e.version).collect();
            let expected: Vec<u32> = (1..=doc.current_version).collect();
            prop_assert_eq!(numbers, expected);
        }
    }
}
